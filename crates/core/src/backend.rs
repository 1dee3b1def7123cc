//! Backend abstraction between the device session and the OS HID stack.
//!
//! Provides a trait-based device layer so that real HID devices and mock
//! devices share the same interface.

use serde::{Deserialize, Serialize};

use crate::element::{ElementHandle, ElementInfo};
use crate::error::Result;

/// One attached game controller, as seen by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Human-readable product name from the device descriptor.
    pub product_name: String,
    /// Stable key identifying the physical attachment point.
    pub location_key: i32,
}

/// Abstraction over the OS HID manager.
pub trait HidBackend {
    /// Open the underlying HID subsystem.
    ///
    /// Idempotent: once the manager is open, further calls are no-ops.
    fn open_manager(&mut self) -> Result<()>;

    /// Snapshot of attached game controllers, in no particular order.
    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>>;

    /// Open the device at `location_key` for element-level access.
    fn open_device(&mut self, location_key: i32) -> Result<Box<dyn ElementDevice>>;
}

/// An opened device exposing element-level reads and writes.
pub trait ElementDevice {
    /// Capability descriptors for every element, in descriptor order.
    fn elements(&self) -> &[ElementInfo];

    /// Current raw value of an input element.
    fn read_element(&mut self, handle: ElementHandle) -> Result<i64>;

    /// Submit a raw value to an output element.
    fn write_element(&mut self, handle: ElementHandle, raw: i64) -> Result<()>;
}


#[cfg(test)]
mod tests {
    use super::mock::{MockBackend, MockDevice};
    use super::*;

    #[test]
    fn mock_device_scripted_values() {
        let mut pad = MockDevice::new("Pad", 7);
        let x = pad.add_axis(0, 255);
        let b = pad.add_button();

        assert_eq!(pad.read_element(x).unwrap(), 0);
        pad.set_value(x, 200);
        pad.set_value(b, 1);
        assert_eq!(pad.read_element(x).unwrap(), 200);
        assert_eq!(pad.read_element(b).unwrap(), 1);
    }

    #[test]
    fn mock_device_write_history() {
        let mut pad = MockDevice::new("Pad", 7);
        let o = pad.add_output(0, 255);

        pad.write_element(o, 10).unwrap();
        pad.write_element(o, 20).unwrap();
        assert_eq!(pad.written(o), vec![10, 20]);
    }

    #[test]
    fn mock_clones_share_state() {
        let mut pad = MockDevice::new("Pad", 7);
        let x = pad.add_axis(0, 255);
        let mut clone = pad.clone();

        pad.set_value(x, 42);
        assert_eq!(clone.read_element(x).unwrap(), 42);
    }

    #[test]
    fn disconnect_fails_io_and_hides_device() {
        let mut pad = MockDevice::new("Pad", 3);
        let x = pad.add_axis(0, 255);

        let mut backend = MockBackend::with_devices(vec![pad.clone()]);
        backend.open_manager().unwrap();
        assert_eq!(backend.list_devices().unwrap().len(), 1);

        let mut opened = backend.open_device(3).unwrap();
        pad.disconnect();

        assert!(opened.read_element(x).is_err());
        assert!(backend.list_devices().unwrap().is_empty());
        assert!(backend.open_device(3).is_err());

        pad.reconnect();
        assert_eq!(opened.read_element(x).unwrap(), 0);
    }

    #[test]
    fn unavailable_manager_errors() {
        let mut backend = MockBackend::unavailable();
        assert!(backend.open_manager().is_err());
        assert!(backend.list_devices().is_err());
    }

    #[test]
    fn descriptor_serializes() {
        let d = DeviceDescriptor {
            product_name: "Gamepad F310".into(),
            location_key: 338626612,
        };
        let json = serde_json::to_string(&d).unwrap();
        let back: DeviceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
