//! Windows element backend over the HID parser (HIDP) API.
//!
//! Builds the element table from the device's preparsed descriptor data and
//! serves reads by querying the current input report over the control pipe
//! (`HidD_GetInputReport`), so polling stays on-demand with no reader thread.
//! Output elements are written by composing an output report and submitting
//! it with `HidD_SetOutputReport`.
//!
//! Element order is stable for the lifetime of the open device: input values,
//! then input buttons, then output values, then output buttons, each group in
//! descriptor order. HIDP reports every value field as a miscellaneous input,
//! so descriptor-marked axes surface as [`ElementType::InputMisc`].

use std::ffi::CStr;
use std::mem::MaybeUninit;
use std::os::windows::ffi::OsStrExt;

use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    HidD_FreePreparsedData, HidD_GetInputReport, HidD_GetPreparsedData, HidD_SetOutputReport,
    HidP_GetButtonCaps, HidP_GetCaps, HidP_GetUsageValue, HidP_GetUsages, HidP_GetValueCaps,
    HidP_Input, HidP_Output, HidP_SetUsageValue, HidP_SetUsages, HIDP_BUTTON_CAPS, HIDP_CAPS,
    HIDP_REPORT_TYPE, HIDP_STATUS_SUCCESS, HIDP_VALUE_CAPS, PHIDP_PREPARSED_DATA,
};
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};

use crate::backend::ElementDevice;
use crate::element::{ElementHandle, ElementInfo, ElementType};
use crate::error::{Error, Result};

#[derive(Clone, Copy, PartialEq)]
enum FieldAccess {
    Value,
    Button,
}

/// Location of one element's field within the device's reports.
struct Field {
    report_type: HIDP_REPORT_TYPE,
    access: FieldAccess,
    report_id: u8,
    usage_page: u16,
    usage: u16,
    link_collection: u16,
    logical_min: i64,
    bit_size: u32,
}

/// One opened HID device with element-level access.
pub struct HidpDevice {
    handle: HANDLE,
    ppd: PHIDP_PREPARSED_DATA,
    input_report_len: usize,
    output_report_len: usize,
    fields: Vec<Field>,
    elements: Vec<ElementInfo>,
}

impl HidpDevice {
    /// Open the device at the given HID interface path and build its
    /// element table from preparsed descriptor data.
    pub fn open(path: &CStr) -> Result<Self> {
        let handle = open_device_handle(&path.to_string_lossy())?;

        let mut ppd: PHIDP_PREPARSED_DATA = 0;
        if unsafe { HidD_GetPreparsedData(handle, &mut ppd) } == 0 || ppd == 0 {
            unsafe { CloseHandle(handle) };
            return Err(Error::Hid("cannot obtain preparsed descriptor data".into()));
        }

        let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
        let status = unsafe { HidP_GetCaps(ppd, caps.as_mut_ptr()) };
        if status != HIDP_STATUS_SUCCESS {
            unsafe {
                HidD_FreePreparsedData(ppd);
                CloseHandle(handle);
            }
            return Err(Error::Hid(format!(
                "HidP_GetCaps failed (status 0x{:08X})",
                status as u32
            )));
        }
        let caps = unsafe { caps.assume_init() };

        let mut device = Self {
            handle,
            ppd,
            input_report_len: caps.InputReportByteLength as usize,
            output_report_len: caps.OutputReportByteLength as usize,
            fields: Vec::new(),
            elements: Vec::new(),
        };

        // Caps arrays come back in descriptor order per group. A device may
        // legitimately lack any one group.
        for c in value_caps(ppd, HidP_Input, caps.NumberInputValueCaps) {
            device.push_value_elements(HidP_Input, ElementType::InputMisc, &c);
        }
        for c in button_caps(ppd, HidP_Input, caps.NumberInputButtonCaps) {
            device.push_button_elements(HidP_Input, ElementType::InputButton, &c);
        }
        for c in value_caps(ppd, HidP_Output, caps.NumberOutputValueCaps) {
            device.push_value_elements(HidP_Output, ElementType::Output, &c);
        }
        for c in button_caps(ppd, HidP_Output, caps.NumberOutputButtonCaps) {
            device.push_button_elements(HidP_Output, ElementType::Output, &c);
        }

        Ok(device)
    }

    fn push_value_elements(
        &mut self,
        report_type: HIDP_REPORT_TYPE,
        kind: ElementType,
        c: &HIDP_VALUE_CAPS,
    ) {
        // A usage range is one field per usage; a single usage with
        // ReportCount > 1 is a packed wide item, surfaced as-is so the
        // classifier can drop it.
        let (usages, report_count) = if c.IsRange != 0 {
            let r = unsafe { c.Anonymous.Range };
            (r.UsageMin..=r.UsageMax, 1u32)
        } else {
            let u = unsafe { c.Anonymous.NotRange.Usage };
            (u..=u, c.ReportCount as u32)
        };
        for usage in usages {
            self.push_element(
                Field {
                    report_type,
                    access: FieldAccess::Value,
                    report_id: c.ReportID,
                    usage_page: c.UsagePage,
                    usage,
                    link_collection: c.LinkCollection,
                    logical_min: c.LogicalMin as i64,
                    bit_size: c.BitSize as u32,
                },
                ElementInfo {
                    handle: ElementHandle(0),
                    kind,
                    usage_page: c.UsagePage,
                    usage,
                    logical_min: c.LogicalMin as i64,
                    logical_max: c.LogicalMax as i64,
                    is_relative: c.IsAbsolute == 0,
                    has_null_state: c.HasNull != 0,
                    report_id: c.ReportID,
                    report_count,
                    report_size: c.BitSize as u32,
                    unit: c.Units,
                    unit_exponent: c.UnitsExp,
                },
            );
        }
    }

    fn push_button_elements(
        &mut self,
        report_type: HIDP_REPORT_TYPE,
        kind: ElementType,
        c: &HIDP_BUTTON_CAPS,
    ) {
        let usages = if c.IsRange != 0 {
            let r = unsafe { c.Anonymous.Range };
            r.UsageMin..=r.UsageMax
        } else {
            let u = unsafe { c.Anonymous.NotRange.Usage };
            u..=u
        };
        for usage in usages {
            self.push_element(
                Field {
                    report_type,
                    access: FieldAccess::Button,
                    report_id: c.ReportID,
                    usage_page: c.UsagePage,
                    usage,
                    link_collection: c.LinkCollection,
                    logical_min: 0,
                    bit_size: 1,
                },
                ElementInfo {
                    handle: ElementHandle(0),
                    kind,
                    usage_page: c.UsagePage,
                    usage,
                    logical_min: 0,
                    logical_max: 1,
                    is_relative: c.IsAbsolute == 0,
                    has_null_state: false,
                    report_id: c.ReportID,
                    report_count: 1,
                    report_size: 1,
                    unit: 0,
                    unit_exponent: 0,
                },
            );
        }
    }

    fn push_element(&mut self, field: Field, mut info: ElementInfo) {
        info.handle = ElementHandle(self.elements.len() as u32);
        self.fields.push(field);
        self.elements.push(info);
    }

    fn field(&self, handle: ElementHandle) -> Result<&Field> {
        self.fields
            .get(handle.0 as usize)
            .ok_or_else(|| Error::Hid(format!("unknown element {}", handle.0)))
    }

    /// Fetch the current input report carrying `report_id` over the control
    /// pipe.
    fn query_input_report(&self, report_id: u8) -> Result<Vec<u8>> {
        if self.input_report_len == 0 {
            return Err(Error::Hid("device has no input report".into()));
        }
        let mut report = vec![0u8; self.input_report_len];
        report[0] = report_id;
        let ok = unsafe {
            HidD_GetInputReport(
                self.handle,
                report.as_mut_ptr() as *mut _,
                report.len() as u32,
            )
        };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(Error::Hid(format!(
                "HidD_GetInputReport failed (error {})",
                code
            )));
        }
        Ok(report)
    }
}

impl ElementDevice for HidpDevice {
    fn elements(&self) -> &[ElementInfo] {
        &self.elements
    }

    fn read_element(&mut self, handle: ElementHandle) -> Result<i64> {
        let field = self.field(handle)?;
        if field.report_type != HidP_Input {
            return Err(Error::Hid(format!(
                "element {} is not an input element",
                handle.0
            )));
        }
        let mut report = self.query_input_report(field.report_id)?;
        let report_len = report.len() as u32;

        match field.access {
            FieldAccess::Button => {
                let mut usage_buf = [0u16; 128];
                let mut usage_len = usage_buf.len() as u32;
                let status = unsafe {
                    HidP_GetUsages(
                        HidP_Input,
                        field.usage_page,
                        field.link_collection,
                        usage_buf.as_mut_ptr(),
                        &mut usage_len,
                        self.ppd,
                        report.as_mut_ptr(),
                        report_len,
                    )
                };
                if status != HIDP_STATUS_SUCCESS {
                    return Err(Error::Hid(format!(
                        "HidP_GetUsages failed (status 0x{:08X})",
                        status as u32
                    )));
                }
                let pressed = usage_buf[..usage_len as usize].contains(&field.usage);
                Ok(i64::from(pressed))
            }
            FieldAccess::Value => {
                let mut value: u32 = 0;
                let status = unsafe {
                    HidP_GetUsageValue(
                        HidP_Input,
                        field.usage_page,
                        field.link_collection,
                        field.usage,
                        &mut value,
                        self.ppd,
                        report.as_mut_ptr(),
                        report_len,
                    )
                };
                if status != HIDP_STATUS_SUCCESS {
                    return Err(Error::Hid(format!(
                        "HidP_GetUsageValue failed (status 0x{:08X})",
                        status as u32
                    )));
                }
                Ok(decode_field_value(value, field.bit_size, field.logical_min))
            }
        }
    }

    fn write_element(&mut self, handle: ElementHandle, raw: i64) -> Result<()> {
        let field = self.field(handle)?;
        if field.report_type != HidP_Output {
            return Err(Error::Hid(format!(
                "element {} is not an output element",
                handle.0
            )));
        }
        if self.output_report_len == 0 {
            return Err(Error::Hid("device has no output report".into()));
        }
        let mut report = vec![0u8; self.output_report_len];
        report[0] = field.report_id;
        let report_len = report.len() as u32;

        match field.access {
            FieldAccess::Button => {
                // A zero raw value leaves the usage unset in the zeroed report.
                if raw != 0 {
                    let mut usage_list = [field.usage];
                    let mut usage_len: u32 = 1;
                    let status = unsafe {
                        HidP_SetUsages(
                            HidP_Output,
                            field.usage_page,
                            field.link_collection,
                            usage_list.as_mut_ptr(),
                            &mut usage_len,
                            self.ppd,
                            report.as_mut_ptr(),
                            report_len,
                        )
                    };
                    if status != HIDP_STATUS_SUCCESS {
                        return Err(Error::Hid(format!(
                            "HidP_SetUsages failed (status 0x{:08X})",
                            status as u32
                        )));
                    }
                }
            }
            FieldAccess::Value => {
                let status = unsafe {
                    HidP_SetUsageValue(
                        HidP_Output,
                        field.usage_page,
                        field.link_collection,
                        field.usage,
                        raw as u32,
                        self.ppd,
                        report.as_mut_ptr(),
                        report_len,
                    )
                };
                if status != HIDP_STATUS_SUCCESS {
                    return Err(Error::Hid(format!(
                        "HidP_SetUsageValue failed (status 0x{:08X})",
                        status as u32
                    )));
                }
            }
        }

        let ok = unsafe {
            HidD_SetOutputReport(
                self.handle,
                report.as_mut_ptr() as *mut _,
                report.len() as u32,
            )
        };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(Error::Hid(format!(
                "HidD_SetOutputReport failed (error {})",
                code
            )));
        }
        Ok(())
    }
}

impl Drop for HidpDevice {
    fn drop(&mut self) {
        unsafe {
            if self.ppd != 0 {
                HidD_FreePreparsedData(self.ppd);
                self.ppd = 0;
            }
            if !self.handle.is_null() && self.handle != INVALID_HANDLE_VALUE {
                CloseHandle(self.handle);
                self.handle = std::ptr::null_mut();
            }
        }
    }
}

/// Value caps for one report type, sized from the global caps counts.
fn value_caps(
    ppd: PHIDP_PREPARSED_DATA,
    report_type: HIDP_REPORT_TYPE,
    count: u16,
) -> Vec<HIDP_VALUE_CAPS> {
    if count == 0 {
        return Vec::new();
    }
    let mut caps: Vec<HIDP_VALUE_CAPS> = vec![unsafe { std::mem::zeroed() }; count as usize];
    let mut len = count;
    let status = unsafe { HidP_GetValueCaps(report_type, caps.as_mut_ptr(), &mut len, ppd) };
    if status != HIDP_STATUS_SUCCESS {
        return Vec::new();
    }
    caps.truncate(len as usize);
    caps
}

/// Button caps for one report type, sized from the global caps counts.
fn button_caps(
    ppd: PHIDP_PREPARSED_DATA,
    report_type: HIDP_REPORT_TYPE,
    count: u16,
) -> Vec<HIDP_BUTTON_CAPS> {
    if count == 0 {
        return Vec::new();
    }
    let mut caps: Vec<HIDP_BUTTON_CAPS> = vec![unsafe { std::mem::zeroed() }; count as usize];
    let mut len = count;
    let status = unsafe { HidP_GetButtonCaps(report_type, caps.as_mut_ptr(), &mut len, ppd) };
    if status != HIDP_STATUS_SUCCESS {
        return Vec::new();
    }
    caps.truncate(len as usize);
    caps
}

/// HIDP hands fields back zero-extended; fields with a negative logical
/// minimum are two's-complement in their bit width and need sign extension.
fn decode_field_value(value: u32, bit_size: u32, logical_min: i64) -> i64 {
    if logical_min >= 0 || bit_size == 0 || bit_size >= 32 {
        if logical_min < 0 {
            return i64::from(value as i32);
        }
        return i64::from(value);
    }
    let shift = 32 - bit_size;
    i64::from(((value << shift) as i32) >> shift)
}

/// Open a file handle on a HID interface path, read/write with a read-only
/// fallback for devices another client holds exclusively.
fn open_device_handle(path: &str) -> Result<HANDLE> {
    use std::ptr::{null, null_mut};

    let wide: Vec<u16> = std::ffi::OsStr::new(path)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let try_open = |access: u32| unsafe {
        CreateFileW(
            wide.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            null(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            null_mut(),
        )
    };

    let mut handle = try_open(GENERIC_READ | GENERIC_WRITE);
    if handle == INVALID_HANDLE_VALUE {
        handle = try_open(GENERIC_READ);
    }
    if handle == INVALID_HANDLE_VALUE {
        let code = unsafe { GetLastError() };
        return Err(Error::Hid(format!(
            "cannot open device path (error {})",
            code
        )));
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_sign_extension() {
        // 8-bit signed: 0xFF is -1, 0x80 is -128.
        assert_eq!(decode_field_value(0xFF, 8, -128), -1);
        assert_eq!(decode_field_value(0x80, 8, -128), -128);
        assert_eq!(decode_field_value(0x7F, 8, -128), 127);

        // 16-bit signed center and endpoints.
        assert_eq!(decode_field_value(0x8000, 16, -32768), -32768);
        assert_eq!(decode_field_value(0xFFFF, 16, -32768), -1);
        assert_eq!(decode_field_value(0x7FFF, 16, -32768), 32767);

        // Unsigned fields pass through zero-extended.
        assert_eq!(decode_field_value(0xFF, 8, 0), 255);
        assert_eq!(decode_field_value(0xFFFF, 16, 0), 65535);

        // Full-width fields reinterpret as i32 when signed.
        assert_eq!(decode_field_value(0xFFFF_FFFF, 32, -1), -1);
        assert_eq!(decode_field_value(0xFFFF_FFFF, 32, 0), 4_294_967_295);
    }

    #[test]
    fn odd_bit_widths_sign_extend() {
        // 12-bit signed: 0xFFF is -1.
        assert_eq!(decode_field_value(0xFFF, 12, -2048), -1);
        assert_eq!(decode_field_value(0x800, 12, -2048), -2048);
        assert_eq!(decode_field_value(0x7FF, 12, -2048), 2047);
    }
}
