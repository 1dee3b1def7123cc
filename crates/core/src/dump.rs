//! Capability dump: human-readable element table for diagnostics.
//!
//! The dump exists to answer "what did the session see, and what did it do
//! with it" for a single device, one row per element. It is write-only and
//! purely informational.

use std::io::{self, Write};

use crate::backend::DeviceDescriptor;
use crate::element::{usage_name, ElementInfo, ElementRole};

/// Write a textual capability dump: a header block for the device, then one
/// row per element.
///
/// `roles` carries the classifier's verdict per element, aligned with
/// `elements`; skipped elements render as `-` in the class column.
pub fn write_capability_dump<W: Write>(
    out: &mut W,
    descriptor: &DeviceDescriptor,
    elements: &[ElementInfo],
    roles: &[Option<ElementRole>],
) -> io::Result<()> {
    writeln!(out, "product:  {}", descriptor.product_name)?;
    writeln!(out, "location: {}", descriptor.location_key)?;
    writeln!(out, "elements: {}", elements.len())?;
    writeln!(out)?;
    writeln!(
        out,
        "{:>3}  {:<10}  {:<16}  {:>5}  {:>5}  {:>7}  {:>7}  {:>3}  {:>4}  {:>3}  {:>4}  {:>5}  {:>6}  {:>4}  {}",
        "idx",
        "type",
        "usage",
        "page",
        "code",
        "lmin",
        "lmax",
        "rel",
        "null",
        "rid",
        "rcnt",
        "rsize",
        "unit",
        "uexp",
        "class"
    )?;
    for (index, info) in elements.iter().enumerate() {
        let role = roles.get(index).copied().flatten();
        writeln!(
            out,
            "{:>3}  {:<10}  {:<16}  {:>5}  {:>5}  {:>7}  {:>7}  {:>3}  {:>4}  {:>3}  {:>4}  {:>5}  {:>6}  {:>4}  {}",
            index,
            info.kind.name(),
            usage_name(info.usage_page, info.usage),
            format!("0x{:02X}", info.usage_page),
            format!("0x{:02X}", info.usage),
            info.logical_min,
            info.logical_max,
            if info.is_relative { "yes" } else { "no" },
            if info.has_null_state { "yes" } else { "no" },
            info.report_id,
            info.report_count,
            info.report_size,
            info.unit,
            info.unit_exponent,
            role.map(|r| r.name()).unwrap_or("-"),
        )?;
    }
    Ok(())
}
