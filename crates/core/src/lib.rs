//! open-joystick-core: joystick and gamepad access over the OS HID stack.
//!
//! This crate provides device enumeration, element classification, and
//! normalized polling for game controllers: axes in -1.0..=1.0, buttons as
//! booleans, POV hats in degrees, and force-feedback style outputs fed with
//! 0.0..=1.0 values.

pub mod backend;
pub mod dump;
pub mod element;
pub mod error;
#[cfg(windows)]
pub mod hidp;
pub mod readers;
pub mod session;
pub mod system;

pub use backend::{DeviceDescriptor, ElementDevice, HidBackend};
pub use error::{Error, Result};
pub use session::{IoCapabilities, JoystickSession};
pub use system::SystemBackend;

/// HID Generic Desktop usage page.
pub const GENERIC_DESKTOP_PAGE: u16 = 0x01;

/// HID Button usage page.
pub const BUTTON_PAGE: u16 = 0x09;

/// Generic Desktop usages this crate cares about.
pub mod usages {
    /// Joystick application collection.
    pub const JOYSTICK: u16 = 0x04;
    /// Gamepad application collection.
    pub const GAMEPAD: u16 = 0x05;
    /// Multi-axis controller application collection.
    pub const MULTI_AXIS: u16 = 0x08;
    /// Principal axes.
    pub const X: u16 = 0x30;
    pub const Y: u16 = 0x31;
    pub const Z: u16 = 0x32;
    /// Rotational axes.
    pub const RX: u16 = 0x33;
    pub const RY: u16 = 0x34;
    pub const RZ: u16 = 0x35;
    pub const SLIDER: u16 = 0x36;
    pub const DIAL: u16 = 0x37;
    pub const WHEEL: u16 = 0x38;
    /// Hat switch (POV).
    pub const HATSWITCH: u16 = 0x39;
}
