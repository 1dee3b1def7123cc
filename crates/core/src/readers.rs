//! Element readers: raw HID samples to stable, unit-consistent values.
//!
//! One reader per classified element. Readers cache the element's calibration
//! (logical range, relative flag) at classification time so polling never
//! re-queries capabilities. Axes normalize to -1.0..=1.0, hats report degrees,
//! outputs accept 0.0..=1.0.

use crate::backend::ElementDevice;
use crate::element::{ElementHandle, ElementInfo};
use crate::error::{Error, Result};

/// Value a POV reader returns when the hat is in its null (centered) state.
pub const POV_CENTERED: f64 = -1.0;

/// Reads one axis element.
#[derive(Debug)]
pub struct AxisReader {
    handle: ElementHandle,
    logical_min: i64,
    logical_max: i64,
    relative: bool,
    accumulated: f64,
}

impl AxisReader {
    pub fn new(info: &ElementInfo) -> Self {
        Self {
            handle: info.handle,
            logical_min: info.logical_min,
            logical_max: info.logical_max,
            relative: info.is_relative,
            accumulated: 0.0,
        }
    }

    /// Sample the element and normalize.
    ///
    /// Absolute axes map `[logical_min, logical_max]` linearly onto
    /// `[-1.0, +1.0]`, endpoints exact. Relative axes report deltas; the
    /// running total is accumulated here and normalized against the same
    /// span, without clamping.
    pub fn read(&mut self, device: &mut dyn ElementDevice, index: usize) -> Result<f64> {
        let raw = device.read_element(self.handle).map_err(|e| Error::Read {
            kind: "axis",
            index,
            reason: e.to_string(),
        })?;
        let span = (self.logical_max - self.logical_min) as f64;
        if span == 0.0 {
            return Ok(0.0);
        }
        let value = if self.relative {
            self.accumulated += raw as f64;
            self.accumulated
        } else {
            (raw - self.logical_min) as f64
        };
        Ok(2.0 * value / span - 1.0)
    }
}

/// Reads one button element.
#[derive(Debug)]
pub struct ButtonReader {
    handle: ElementHandle,
}

impl ButtonReader {
    pub fn new(info: &ElementInfo) -> Self {
        Self {
            handle: info.handle,
        }
    }

    /// Any nonzero raw value reads as pressed.
    pub fn read(&mut self, device: &mut dyn ElementDevice, index: usize) -> Result<bool> {
        let raw = device.read_element(self.handle).map_err(|e| Error::Read {
            kind: "button",
            index,
            reason: e.to_string(),
        })?;
        Ok(raw != 0)
    }
}

/// Reads one POV hat element.
#[derive(Debug)]
pub struct PovReader {
    handle: ElementHandle,
    logical_min: i64,
    logical_max: i64,
}

impl PovReader {
    pub fn new(info: &ElementInfo) -> Self {
        Self {
            handle: info.handle,
            logical_min: info.logical_min,
            logical_max: info.logical_max,
        }
    }

    /// Sample the hat position in degrees clockwise from north.
    ///
    /// An N-position hat reports `360 * slot / N` for in-range raw values
    /// (`logical_min` is slot 0). Raw values outside the logical range are
    /// the hat's null state and read as [`POV_CENTERED`].
    pub fn read(&mut self, device: &mut dyn ElementDevice, index: usize) -> Result<f64> {
        let raw = device.read_element(self.handle).map_err(|e| Error::Read {
            kind: "pov",
            index,
            reason: e.to_string(),
        })?;
        if raw < self.logical_min || raw > self.logical_max {
            return Ok(POV_CENTERED);
        }
        let positions = (self.logical_max - self.logical_min + 1) as f64;
        Ok(360.0 * (raw - self.logical_min) as f64 / positions)
    }
}

/// Writes one output element.
#[derive(Debug)]
pub struct OutputWriter {
    handle: ElementHandle,
    logical_min: i64,
    logical_max: i64,
    relative: bool,
    last_value: f64,
}

impl OutputWriter {
    pub fn new(info: &ElementInfo) -> Self {
        Self {
            handle: info.handle,
            logical_min: info.logical_min,
            logical_max: info.logical_max,
            relative: info.is_relative,
            last_value: 0.0,
        }
    }

    /// Encode `value` into the element's logical range and submit it.
    ///
    /// The input is clamped to `[0.0, 1.0]`. Relative outputs convert to a
    /// delta against the last written value; the delta is clamped to the
    /// same range, so a decrease writes as 0. The scaled value truncates
    /// toward zero.
    pub fn write(
        &mut self,
        device: &mut dyn ElementDevice,
        index: usize,
        value: f64,
    ) -> Result<()> {
        let clamped = value.clamp(0.0, 1.0);
        let send = if self.relative {
            let delta = clamped - self.last_value;
            self.last_value = clamped;
            delta.clamp(0.0, 1.0)
        } else {
            clamped
        };
        let raw = ((self.logical_max - self.logical_min) as f64 * send + self.logical_min as f64)
            as i64;
        device.write_element(self.handle, raw).map_err(|e| Error::Write {
            index,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockDevice;

    #[test]
    fn absolute_axis_endpoints_are_exact() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_axis(0, 255);
        let mut reader = AxisReader::new(&pad.element(h));

        pad.set_value(h, 0);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), -1.0);

        pad.set_value(h, 255);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 1.0);

        pad.set_value(h, 128);
        let mid = reader.read(&mut pad, 0).unwrap();
        assert!((mid - 1.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn signed_axis_center_is_slightly_positive() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_axis(-32768, 32767);
        let mut reader = AxisReader::new(&pad.element(h));

        pad.set_value(h, -32768);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), -1.0);

        pad.set_value(h, 32767);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 1.0);

        // 16-bit two's-complement center sits one half-step above true zero.
        pad.set_value(h, 0);
        let center = reader.read(&mut pad, 0).unwrap();
        assert!((center - 1.0 / 65535.0).abs() < 1e-12);
        assert!(center > 0.0);
    }

    #[test]
    fn relative_axis_accumulates_deltas() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_relative_axis(0, 255);
        let mut reader = AxisReader::new(&pad.element(h));

        pad.set_value(h, 10);
        let first = reader.read(&mut pad, 0).unwrap();
        assert!((first - (2.0 * 10.0 / 255.0 - 1.0)).abs() < 1e-12);

        // Same delta again doubles the running total.
        let second = reader.read(&mut pad, 0).unwrap();
        assert!((second - (2.0 * 20.0 / 255.0 - 1.0)).abs() < 1e-12);

        // Large negative delta drives the total below the logical span;
        // the normalized value is allowed to leave [-1, 1].
        pad.set_value(h, -30);
        let third = reader.read(&mut pad, 0).unwrap();
        assert!((third - (2.0 * -10.0 / 255.0 - 1.0)).abs() < 1e-12);
        assert!(third < -1.0);
    }

    #[test]
    fn degenerate_axis_range_reads_zero() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_axis(5, 5);
        let mut reader = AxisReader::new(&pad.element(h));

        pad.set_value(h, 5);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 0.0);
    }

    #[test]
    fn button_reads_nonzero_as_pressed() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_button();
        let mut reader = ButtonReader::new(&pad.element(h));

        assert!(!reader.read(&mut pad, 0).unwrap());
        pad.set_value(h, 1);
        assert!(reader.read(&mut pad, 0).unwrap());
        pad.set_value(h, 5);
        assert!(reader.read(&mut pad, 0).unwrap());
    }

    #[test]
    fn pov_eight_way_slots() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_hat(0, 7);
        let mut reader = PovReader::new(&pad.element(h));

        pad.set_value(h, 0);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 0.0);
        pad.set_value(h, 2);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 90.0);
        pad.set_value(h, 7);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 315.0);

        // Outside the logical range: null state, not an error.
        pad.set_value(h, 8);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), POV_CENTERED);
        pad.set_value(h, -1);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), POV_CENTERED);
    }

    #[test]
    fn pov_one_based_range() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_hat(1, 8);
        let mut reader = PovReader::new(&pad.element(h));

        pad.set_value(h, 1);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 0.0);
        pad.set_value(h, 8);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), 315.0);
        pad.set_value(h, 0);
        assert_eq!(reader.read(&mut pad, 0).unwrap(), POV_CENTERED);
    }

    #[test]
    fn output_clamps_and_truncates() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_output(0, 255);
        let mut writer = OutputWriter::new(&pad.element(h));

        writer.write(&mut pad, 0, 0.5).unwrap();
        writer.write(&mut pad, 0, -2.0).unwrap();
        writer.write(&mut pad, 0, 3.0).unwrap();
        assert_eq!(pad.written(h), vec![127, 0, 255]);
    }

    #[test]
    fn output_signed_range_encoding() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_output(-128, 127);
        let mut writer = OutputWriter::new(&pad.element(h));

        writer.write(&mut pad, 0, 0.0).unwrap();
        writer.write(&mut pad, 0, 1.0).unwrap();
        writer.write(&mut pad, 0, 0.5).unwrap();
        // 255 * 0.5 - 128 = -0.5, truncated toward zero.
        assert_eq!(pad.written(h), vec![-128, 127, 0]);
    }

    #[test]
    fn relative_output_applies_delta_with_reclamp() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_relative_output(0, 255);
        let mut writer = OutputWriter::new(&pad.element(h));

        writer.write(&mut pad, 0, 0.5).unwrap(); // delta 0.5
        writer.write(&mut pad, 0, 0.75).unwrap(); // delta 0.25
        writer.write(&mut pad, 0, 0.25).unwrap(); // delta -0.5, clamped to 0
        writer.write(&mut pad, 0, 1.0).unwrap(); // delta 0.75
        assert_eq!(pad.written(h), vec![127, 63, 0, 191]);
    }

    #[test]
    fn read_failure_maps_to_read_error_with_context() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_axis(0, 255);
        let mut reader = AxisReader::new(&pad.element(h));

        pad.disconnect();
        let err = reader.read(&mut pad, 3).unwrap_err();
        match err {
            Error::Read { kind, index, .. } => {
                assert_eq!(kind, "axis");
                assert_eq!(index, 3);
            }
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn write_failure_maps_to_write_error_with_context() {
        let mut pad = MockDevice::new("Pad", 1);
        let h = pad.add_output(0, 255);
        let mut writer = OutputWriter::new(&pad.element(h));

        pad.disconnect();
        let err = writer.write(&mut pad, 1, 0.5).unwrap_err();
        match err {
            Error::Write { index, .. } => assert_eq!(index, 1),
            other => panic!("expected write error, got {:?}", other),
        }
    }
}
