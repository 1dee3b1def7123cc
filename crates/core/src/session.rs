//! Device session: enumeration, selection, classification, polling.
//!
//! A session owns the platform backend (the HID manager) and at most one
//! selected device. Selecting a device classifies every element it exposes
//! into axis / button / POV / output readers; polling then samples those
//! readers in classification order, which is stable for the lifetime of the
//! selection. Re-selecting drops the previous device and its readers first.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{DeviceDescriptor, ElementDevice, HidBackend};
use crate::dump;
use crate::element::{classify, ElementInfo, ElementRole};
use crate::error::{Error, Result};
use crate::readers::{AxisReader, ButtonReader, OutputWriter, PovReader};

/// Classified element counts for the selected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCapabilities {
    pub axes: i32,
    pub buttons: i32,
    pub povs: i32,
    pub outputs: i32,
}

impl IoCapabilities {
    /// Report of a session with no selected device: all counts -1.
    pub const UNKNOWN: IoCapabilities = IoCapabilities {
        axes: -1,
        buttons: -1,
        povs: -1,
        outputs: -1,
    };
}

struct SelectedDevice {
    descriptor: DeviceDescriptor,
    device: Box<dyn ElementDevice>,
    elements: Vec<ElementInfo>,
    roles: Vec<Option<ElementRole>>,
    axes: Vec<AxisReader>,
    buttons: Vec<ButtonReader>,
    povs: Vec<PovReader>,
    outputs: Vec<OutputWriter>,
}

/// Synchronous joystick/gamepad session over a [`HidBackend`].
///
/// All operations are call-and-return; nothing runs on its own schedule.
/// Polling takes `&mut self`, so a session is single-threaded by
/// construction. Independent sessions for different devices are safe;
/// two sessions on the same physical device race at the OS level.
pub struct JoystickSession<B> {
    backend: B,
    selected: Option<SelectedDevice>,
}

impl<B: HidBackend> JoystickSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            selected: None,
        }
    }

    /// Attached game controllers, sorted ascending by location key.
    ///
    /// Lazily opens the HID manager on first use. An empty list means no
    /// controller is attached; [`Error::Manager`] means the HID subsystem
    /// itself is unavailable.
    pub fn available_devices(&mut self) -> Result<Vec<DeviceDescriptor>> {
        self.backend.open_manager()?;
        let mut devices = self.backend.list_devices()?;
        devices.sort_by_key(|d| d.location_key);
        debug!(count = devices.len(), "enumerated game controllers");
        Ok(devices)
    }

    /// Number of attached controllers; 0 when the HID subsystem is
    /// unavailable.
    pub fn device_count(&mut self) -> usize {
        match self.available_devices() {
            Ok(devices) => devices.len(),
            Err(e) => {
                warn!(error = %e, "device enumeration failed");
                0
            }
        }
    }

    /// Select and classify the device at `location_key`.
    ///
    /// Any prior selection is dropped before anything else, so a failed call
    /// always leaves the session un-initialised. Returns false when the
    /// manager cannot open, no attached device matches the key, the device
    /// cannot be opened, or none of its elements classify; the reason is
    /// logged rather than returned.
    pub fn initialise(&mut self, location_key: i32) -> bool {
        self.selected = None;

        let devices = match self.available_devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "cannot enumerate devices");
                return false;
            }
        };
        let Some(descriptor) = devices
            .into_iter()
            .find(|d| d.location_key == location_key)
        else {
            warn!(location_key, "no device at location key");
            return false;
        };
        let device = match self.backend.open_device(location_key) {
            Ok(device) => device,
            Err(e) => {
                warn!(location_key, error = %e, "cannot open device");
                return false;
            }
        };

        let elements = device.elements().to_vec();
        let mut roles = Vec::with_capacity(elements.len());
        let mut axes = Vec::new();
        let mut buttons = Vec::new();
        let mut povs = Vec::new();
        let mut outputs = Vec::new();
        for info in &elements {
            let role = classify(info);
            match role {
                Some(ElementRole::Axis) => axes.push(AxisReader::new(info)),
                Some(ElementRole::Button) => buttons.push(ButtonReader::new(info)),
                Some(ElementRole::Pov) => povs.push(PovReader::new(info)),
                Some(ElementRole::Output) => outputs.push(OutputWriter::new(info)),
                None => debug!(
                    kind = info.kind.name(),
                    usage_page = info.usage_page,
                    usage = info.usage,
                    report_count = info.report_count,
                    "element skipped"
                ),
            }
            roles.push(role);
        }

        if axes.is_empty() && buttons.is_empty() && povs.is_empty() && outputs.is_empty() {
            warn!(
                location_key,
                product = %descriptor.product_name,
                "device has no classifiable elements"
            );
            return false;
        }

        info!(
            location_key,
            product = %descriptor.product_name,
            axes = axes.len(),
            buttons = buttons.len(),
            povs = povs.len(),
            outputs = outputs.len(),
            "device initialised"
        );
        self.selected = Some(SelectedDevice {
            descriptor,
            device,
            elements,
            roles,
            axes,
            buttons,
            povs,
            outputs,
        });
        true
    }

    /// Classified element counts.
    ///
    /// All counts are -1 while no device is selected, including after a
    /// failed re-initialise. A successful initialise never yields negative
    /// counts.
    pub fn io_capabilities(&self) -> IoCapabilities {
        match &self.selected {
            Some(sel) => IoCapabilities {
                axes: sel.axes.len() as i32,
                buttons: sel.buttons.len() as i32,
                povs: sel.povs.len() as i32,
                outputs: sel.outputs.len() as i32,
            },
            None => IoCapabilities::UNKNOWN,
        }
    }

    /// Descriptor of the selected device, if any.
    pub fn selected_descriptor(&self) -> Option<&DeviceDescriptor> {
        self.selected.as_ref().map(|sel| &sel.descriptor)
    }

    /// Sample every axis, normalized to -1.0..=1.0, in classification order.
    ///
    /// Empty when no device is selected. A failed element read aborts the
    /// poll with [`Error::Read`]; the usual cause is device removal, and the
    /// caller is expected to stop polling and re-initialise.
    pub fn poll_axes(&mut self) -> Result<Vec<f64>> {
        let Some(sel) = self.selected.as_mut() else {
            return Ok(Vec::new());
        };
        let mut values = Vec::with_capacity(sel.axes.len());
        for (index, reader) in sel.axes.iter_mut().enumerate() {
            values.push(reader.read(sel.device.as_mut(), index)?);
        }
        Ok(values)
    }

    /// Sample every button, in classification order.
    pub fn poll_buttons(&mut self) -> Result<Vec<bool>> {
        let Some(sel) = self.selected.as_mut() else {
            return Ok(Vec::new());
        };
        let mut values = Vec::with_capacity(sel.buttons.len());
        for (index, reader) in sel.buttons.iter_mut().enumerate() {
            values.push(reader.read(sel.device.as_mut(), index)?);
        }
        Ok(values)
    }

    /// Sample every POV hat in degrees, in classification order.
    pub fn poll_povs(&mut self) -> Result<Vec<f64>> {
        let Some(sel) = self.selected.as_mut() else {
            return Ok(Vec::new());
        };
        let mut values = Vec::with_capacity(sel.povs.len());
        for (index, reader) in sel.povs.iter_mut().enumerate() {
            values.push(reader.read(sel.device.as_mut(), index)?);
        }
        Ok(values)
    }

    /// Write one value per output element, in classification order.
    ///
    /// The value count must match the output count exactly;
    /// [`Error::OutputCount`] is returned otherwise and nothing is written.
    pub fn push_outputs(&mut self, values: &[f64]) -> Result<()> {
        let Some(sel) = self.selected.as_mut() else {
            if values.is_empty() {
                return Ok(());
            }
            return Err(Error::OutputCount {
                expected: 0,
                got: values.len(),
            });
        };
        if values.len() != sel.outputs.len() {
            return Err(Error::OutputCount {
                expected: sel.outputs.len(),
                got: values.len(),
            });
        }
        for (index, (writer, value)) in sel.outputs.iter_mut().zip(values).enumerate() {
            writer.write(sel.device.as_mut(), index, *value)?;
        }
        Ok(())
    }

    /// Write the capability dump for the selected device to `out`.
    ///
    /// Purely informational; lists every element the device exposes,
    /// classified or skipped.
    pub fn dump_elements<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        match &self.selected {
            Some(sel) => {
                dump::write_capability_dump(out, &sel.descriptor, &sel.elements, &sel.roles)
            }
            None => writeln!(out, "no device initialised"),
        }
    }
}
