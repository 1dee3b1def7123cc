//! Production HID backend over hidapi.
//!
//! Enumeration works on every platform hidapi supports. Element-level device
//! access goes through the platform HID parser and is currently wired up on
//! Windows; on other platforms `open_device` reports the gap instead of
//! guessing at report layouts.

use hidapi::HidApi;
use tracing::debug;

use crate::backend::{DeviceDescriptor, ElementDevice, HidBackend};
use crate::error::{Error, Result};
use crate::{usages, GENERIC_DESKTOP_PAGE};

/// Generic Desktop usages matched during enumeration.
const CONTROLLER_USAGES: [u16; 3] = [usages::JOYSTICK, usages::GAMEPAD, usages::MULTI_AXIS];

/// HID backend over the operating system's HID subsystem.
///
/// The manager (a [`HidApi`] instance) is created lazily on the first
/// [`HidBackend::open_manager`] call and held for the backend's lifetime.
#[derive(Default)]
pub struct SystemBackend {
    api: Option<HidApi>,
}

impl SystemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn api(&mut self) -> Result<&mut HidApi> {
        self.api
            .as_mut()
            .ok_or_else(|| Error::Manager("HID manager not open".into()))
    }
}

impl HidBackend for SystemBackend {
    fn open_manager(&mut self) -> Result<()> {
        if self.api.is_some() {
            return Ok(());
        }
        debug!("opening HID manager");
        let api = HidApi::new().map_err(|e| Error::Manager(e.to_string()))?;
        self.api = Some(api);
        Ok(())
    }

    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>> {
        let api = self.api()?;
        api.refresh_devices()
            .map_err(|e| Error::Manager(e.to_string()))?;

        let mut devices = Vec::new();
        for info in api.device_list() {
            if !is_game_controller(info) {
                continue;
            }
            let descriptor = describe(info);
            debug!(
                product = %descriptor.product_name,
                location_key = descriptor.location_key,
                vid = info.vendor_id(),
                pid = info.product_id(),
                usage = info.usage(),
                "found game controller"
            );
            devices.push(descriptor);
        }
        Ok(devices)
    }

    fn open_device(&mut self, location_key: i32) -> Result<Box<dyn ElementDevice>> {
        let api = self.api()?;
        let info = api
            .device_list()
            .find(|info| {
                is_game_controller(info)
                    && location_key_for_path(info.path().to_bytes()) == location_key
            })
            .ok_or(Error::DeviceNotFound(location_key))?;
        open_elements(info)
    }
}

#[cfg(windows)]
fn open_elements(info: &hidapi::DeviceInfo) -> Result<Box<dyn ElementDevice>> {
    let device = crate::hidp::HidpDevice::open(info.path())?;
    debug!(
        path = %info.path().to_string_lossy(),
        elements = device.elements().len(),
        "opened device for element access"
    );
    Ok(Box::new(device))
}

#[cfg(not(windows))]
fn open_elements(_info: &hidapi::DeviceInfo) -> Result<Box<dyn ElementDevice>> {
    Err(Error::Unsupported(
        "element-level device access requires the Windows HID parser",
    ))
}

fn is_game_controller(info: &hidapi::DeviceInfo) -> bool {
    info.usage_page() == GENERIC_DESKTOP_PAGE && CONTROLLER_USAGES.contains(&info.usage())
}

fn describe(info: &hidapi::DeviceInfo) -> DeviceDescriptor {
    DeviceDescriptor {
        product_name: info.product_string().unwrap_or("Unknown").to_string(),
        location_key: location_key_for_path(info.path().to_bytes()),
    }
}

/// 32-bit FNV-1a over the platform device path, reinterpreted as i32.
///
/// Every supported OS encodes the physical attachment point in the path, so
/// the key is stable across restarts and processes while the device stays on
/// the same port.
pub fn location_key_for_path(path: &[u8]) -> i32 {
    let mut hash: u32 = 0x811C_9DC5;
    for &byte in path {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_key_known_vectors() {
        assert_eq!(location_key_for_path(b"") as u32, 0x811C_9DC5);
        assert_eq!(location_key_for_path(b"a") as u32, 0xE40C_292C);
        assert_eq!(location_key_for_path(b"foobar") as u32, 0xBF9C_F968);
    }

    #[test]
    fn location_key_distinguishes_paths() {
        let a = location_key_for_path(b"/dev/hidraw0");
        let b = location_key_for_path(b"/dev/hidraw1");
        assert_ne!(a, b);
        assert_eq!(a, location_key_for_path(b"/dev/hidraw0"));
    }
}
