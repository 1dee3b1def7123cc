//! HID element model: capability descriptors and input/output classification.
//!
//! An element is one field (or field group) of a device's HID report: an axis,
//! a button, a hat switch, an LED, a whole collection. Backends surface every
//! element they can see; [`classify`] decides which ones the session will
//! actually read or write.

use serde::{Deserialize, Serialize};

use crate::{usages, GENERIC_DESKTOP_PAGE};

/// Backend-scoped opaque element identifier.
///
/// Only meaningful to the backend that produced it; the session never
/// interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u32);

/// Element type as reported by the device capability descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    /// Miscellaneous input field. Most real-world axes report as this.
    InputMisc,
    /// Input field explicitly marked as an axis.
    InputAxis,
    /// Input field carrying a button state.
    InputButton,
    /// Keyboard-style scan code array.
    InputScanCodes,
    /// Writable output field (force feedback, LEDs).
    Output,
    /// Feature report field.
    Feature,
    /// Grouping node, not itself readable.
    Collection,
}

impl ElementType {
    /// Short display name used in capability dumps.
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::InputMisc => "Misc",
            ElementType::InputAxis => "Axis",
            ElementType::InputButton => "Button",
            ElementType::InputScanCodes => "ScanCodes",
            ElementType::Output => "Output",
            ElementType::Feature => "Feature",
            ElementType::Collection => "Collection",
        }
    }
}

/// Capability descriptor for a single element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Opaque handle used for reads and writes against the owning device.
    pub handle: ElementHandle,
    /// Descriptor-reported element type.
    pub kind: ElementType,
    /// HID usage page.
    pub usage_page: u16,
    /// HID usage within the page.
    pub usage: u16,
    /// Smallest raw value the element reports.
    pub logical_min: i64,
    /// Largest raw value the element reports.
    pub logical_max: i64,
    /// Relative elements report deltas rather than positions.
    pub is_relative: bool,
    /// Element has a defined out-of-range rest state (hat switches).
    pub has_null_state: bool,
    /// Report ID the element lives in.
    pub report_id: u8,
    /// Number of fields in the element's report item.
    pub report_count: u32,
    /// Size of one field in bits.
    pub report_size: u32,
    /// HID unit code.
    pub unit: u32,
    /// HID unit exponent code.
    pub unit_exponent: u32,
}

/// What the session does with a classified element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementRole {
    /// Normalized to -1.0..=1.0.
    Axis,
    /// Pressed / not pressed.
    Button,
    /// Hat switch, reported in degrees with -1.0 for centered.
    Pov,
    /// Writable output, fed values in 0.0..=1.0.
    Output,
}

impl ElementRole {
    /// Short display name used in capability dumps.
    pub fn name(&self) -> &'static str {
        match self {
            ElementRole::Axis => "axis",
            ElementRole::Button => "button",
            ElementRole::Pov => "pov",
            ElementRole::Output => "output",
        }
    }
}

/// Classifies an element, or `None` when the session should skip it.
///
/// Single-field misc/axis inputs become axes, except the Generic Desktop hat
/// switch usage which becomes a POV. Wide items (`report_count >= 2`, packed
/// multi-field state) are skipped rather than decoded. Collections, features
/// and scan codes are structural and never polled.
pub fn classify(info: &ElementInfo) -> Option<ElementRole> {
    match info.kind {
        ElementType::InputMisc | ElementType::InputAxis => {
            if info.report_count >= 2 {
                return None;
            }
            if info.usage_page == GENERIC_DESKTOP_PAGE && info.usage == usages::HATSWITCH {
                Some(ElementRole::Pov)
            } else {
                Some(ElementRole::Axis)
            }
        }
        ElementType::InputButton => Some(ElementRole::Button),
        ElementType::Output => Some(ElementRole::Output),
        ElementType::InputScanCodes | ElementType::Feature | ElementType::Collection => None,
    }
}

/// Human-readable usage name for capability dumps.
///
/// Covers the Generic Desktop usages a game controller is likely to carry;
/// everything else is rendered numerically.
pub fn usage_name(usage_page: u16, usage: u16) -> String {
    if usage_page == crate::BUTTON_PAGE {
        return format!("Button {}", usage);
    }
    if usage_page != GENERIC_DESKTOP_PAGE {
        return format!("0x{:02X}/0x{:02X}", usage_page, usage);
    }
    let name = match usage {
        0x01 => "Pointer",
        0x04 => "Joystick",
        0x05 => "Gamepad",
        0x08 => "Multi-axis",
        0x30 => "X",
        0x31 => "Y",
        0x32 => "Z",
        0x33 => "Rx",
        0x34 => "Ry",
        0x35 => "Rz",
        0x36 => "Slider",
        0x37 => "Dial",
        0x38 => "Wheel",
        0x39 => "Hatswitch",
        0x3A => "Counted Buffer",
        0x3B => "Byte Count",
        0x3C => "Motion Wakeup",
        0x3D => "Start",
        0x3E => "Select",
        0x40 => "Vx",
        0x41 => "Vy",
        0x42 => "Vz",
        0x43 => "Vbrx",
        0x44 => "Vbry",
        0x45 => "Vbrz",
        0x46 => "Vno",
        0x90 => "D-pad Up",
        0x91 => "D-pad Down",
        0x92 => "D-pad Right",
        0x93 => "D-pad Left",
        _ => return format!("0x{:02X}/0x{:02X}", usage_page, usage),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(kind: ElementType, usage_page: u16, usage: u16, report_count: u32) -> ElementInfo {
        ElementInfo {
            handle: ElementHandle(0),
            kind,
            usage_page,
            usage,
            logical_min: 0,
            logical_max: 255,
            is_relative: false,
            has_null_state: false,
            report_id: 0,
            report_count,
            report_size: 8,
            unit: 0,
            unit_exponent: 0,
        }
    }

    #[test]
    fn misc_and_axis_inputs_classify_as_axes() {
        let misc = info(ElementType::InputMisc, GENERIC_DESKTOP_PAGE, usages::X, 1);
        assert_eq!(classify(&misc), Some(ElementRole::Axis));

        let axis = info(ElementType::InputAxis, GENERIC_DESKTOP_PAGE, usages::RZ, 1);
        assert_eq!(classify(&axis), Some(ElementRole::Axis));

        // The axis branch is not restricted to the Generic Desktop page.
        let vendor = info(ElementType::InputMisc, 0xFF00, 0x01, 1);
        assert_eq!(classify(&vendor), Some(ElementRole::Axis));
    }

    #[test]
    fn hatswitch_classifies_as_pov() {
        let hat = info(
            ElementType::InputMisc,
            GENERIC_DESKTOP_PAGE,
            usages::HATSWITCH,
            1,
        );
        assert_eq!(classify(&hat), Some(ElementRole::Pov));

        // Hat usage on a vendor page is just another axis.
        let not_hat = info(ElementType::InputMisc, 0xFF00, usages::HATSWITCH, 1);
        assert_eq!(classify(&not_hat), Some(ElementRole::Axis));
    }

    #[test]
    fn wide_items_are_skipped() {
        let wide = info(ElementType::InputMisc, GENERIC_DESKTOP_PAGE, usages::X, 2);
        assert_eq!(classify(&wide), None);

        let wide_hat = info(
            ElementType::InputAxis,
            GENERIC_DESKTOP_PAGE,
            usages::HATSWITCH,
            6,
        );
        assert_eq!(classify(&wide_hat), None);
    }

    #[test]
    fn buttons_and_outputs_classify_directly() {
        let button = info(ElementType::InputButton, crate::BUTTON_PAGE, 1, 1);
        assert_eq!(classify(&button), Some(ElementRole::Button));

        // Buttons are taken even when packed as a wide item.
        let packed = info(ElementType::InputButton, crate::BUTTON_PAGE, 3, 8);
        assert_eq!(classify(&packed), Some(ElementRole::Button));

        let output = info(ElementType::Output, 0x0F, 0x70, 1);
        assert_eq!(classify(&output), Some(ElementRole::Output));
    }

    #[test]
    fn structural_elements_are_skipped() {
        for kind in [
            ElementType::Collection,
            ElementType::Feature,
            ElementType::InputScanCodes,
        ] {
            let e = info(kind, GENERIC_DESKTOP_PAGE, usages::JOYSTICK, 1);
            assert_eq!(classify(&e), None, "{:?} must not classify", kind);
        }
    }

    #[test]
    fn usage_names() {
        assert_eq!(usage_name(GENERIC_DESKTOP_PAGE, 0x30), "X");
        assert_eq!(usage_name(GENERIC_DESKTOP_PAGE, 0x39), "Hatswitch");
        assert_eq!(usage_name(crate::BUTTON_PAGE, 4), "Button 4");
        assert_eq!(usage_name(0xFF00, 0x01), "0xFF00/0x01");
        assert_eq!(usage_name(GENERIC_DESKTOP_PAGE, 0x7F), "0x01/0x7F");
    }
}
