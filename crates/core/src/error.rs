//! Error types for open-joystick-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS HID manager could not be created or opened.
    #[error("HID manager error: {0}")]
    Manager(String),

    /// No attached device matches the requested location key.
    #[error("device not found at location key {0}")]
    DeviceNotFound(i32),

    /// Raw HID layer failure (open, descriptor, report plumbing).
    #[error("HID error: {0}")]
    Hid(String),

    /// A per-element input read failed, commonly after device removal.
    #[error("read error on {kind} {index}: {reason}")]
    Read {
        kind: &'static str,
        index: usize,
        reason: String,
    },

    /// A per-element output write failed.
    #[error("write error on output {index}: {reason}")]
    Write { index: usize, reason: String },

    /// Output push called with the wrong number of values.
    #[error("output count mismatch: device has {expected} outputs, got {got} values")]
    OutputCount { expected: usize, got: usize },

    /// Element-level device access is not available on this platform.
    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = Error::DeviceNotFound(-1204736326);
        assert_eq!(e.to_string(), "device not found at location key -1204736326");

        let e = Error::Read {
            kind: "axis",
            index: 2,
            reason: "device disconnected".into(),
        };
        assert_eq!(e.to_string(), "read error on axis 2: device disconnected");

        let e = Error::OutputCount {
            expected: 2,
            got: 5,
        };
        assert_eq!(
            e.to_string(),
            "output count mismatch: device has 2 outputs, got 5 values"
        );
    }
}
