//! Error types for sensor control operations.

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

use crate::controls::ControlId;
use crate::modes::HdrMode;
use crate::traits::FourCC;

/// Fatal mismatches between the board description and what the sensor supports.
///
/// These only occur at attach time; the device does not come up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Only two CSI-2 data lanes are supported.
    #[error("only 2 data lanes are supported, board has {0}")]
    UnsupportedLaneCount(u32),
    /// The board description lists no link frequency.
    #[error("link-frequency property not found")]
    MissingLinkFrequency,
    /// The first listed link frequency is not one the sensor can be programmed for.
    #[error("link frequency not supported: {0} Hz")]
    UnsupportedLinkFrequency(u64),
    /// The input clock does not run at the required rate.
    #[error("inclk frequency not supported: {0} Hz")]
    ClockRate(u32),
    /// The chip identity register did not hold the expected value.
    #[error("chip id mismatch: expected {expected:#06x}, found {found:#06x}")]
    ChipIdMismatch {
        /// Expected identity.
        expected: u32,
        /// Value read from the sensor.
        found: u32,
    },
    /// The board description could not be parsed.
    #[error("invalid board description: {0}")]
    Parse(String),
}

/// Failure to bring up one of the power resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowerError {
    /// A supply rail refused to enable.
    #[error("failed to enable regulator {0}")]
    Regulator(String),
    /// The input clock refused to enable.
    #[error("failed to enable clock")]
    Clock,
}

/// Error type for sensor operations.
#[derive(Debug, Error)]
pub enum SensorError {
    /// A single register transaction failed.
    #[error("register {address:#06x} access failed: {kind}")]
    Io {
        /// Register address of the failed transaction.
        address: u16,
        /// Bus-level failure.
        kind: ErrorKind,
    },
    /// A register list was only partially applied.
    #[error("failed to write {list} at register {address:#06x}: {kind}")]
    RegisterList {
        /// Name of the list being applied.
        list: &'static str,
        /// Last address attempted.
        address: u16,
        /// Bus-level failure.
        kind: ErrorKind,
    },
    /// Board or hardware configuration mismatch.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Power acquisition failed.
    #[error(transparent)]
    Power(#[from] PowerError),
    /// The control id is not handled by this sensor.
    #[error("control {0:#010x} is not handled")]
    UnknownControl(u32),
    /// The control cannot be written by the host.
    #[error("control {0:?} is read-only")]
    ReadOnlyControl(ControlId),
    /// The control is frozen while streaming.
    #[error("control {0:?} cannot change while streaming")]
    ControlGrabbed(ControlId),
    /// No catalog entry uses the requested format code.
    #[error("format not supported: {0}")]
    UnsupportedFormat(FourCC),
    /// No catalog entry matches the current resolution with the requested HDR variant.
    #[error("no {hdr:?} mode for {width}x{height}")]
    NoHdrVariant {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Requested variant.
        hdr: HdrMode,
    },
    /// Enumeration index past the end of the catalog.
    #[error("index {0} out of range")]
    InvalidIndex(u32),
    /// The mode cannot change while streaming.
    #[error("device is streaming")]
    Busy,
    /// Diagnostic register access was requested with the sensor powered down.
    #[error("sensor is not powered")]
    NotPowered,
    /// The device lock was poisoned by a panicking holder.
    #[error("device lock poisoned")]
    LockPoisoned,
    /// A register read back a value other than the one expected.
    #[error("register {address:#06x} holds {found:#x}, expected {expected:#x}")]
    Mismatch {
        /// Register address.
        address: u16,
        /// Expected value.
        expected: u32,
        /// Value read back.
        found: u32,
    },
}

impl SensorError {
    /// Whether the error is a rejected request rather than a hardware or configuration fault.
    pub const fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::UnknownControl(_)
                | Self::ReadOnlyControl(_)
                | Self::ControlGrabbed(_)
                | Self::UnsupportedFormat(_)
                | Self::NoHdrVariant { .. }
                | Self::InvalidIndex(_)
                | Self::Busy
        )
    }
}

/// Result type for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_list_error_names_address() {
        let err = SensorError::RegisterList {
            list: "mode 1920x1080",
            address: 0x0342,
            kind: ErrorKind::Bus,
        };
        let msg = err.to_string();
        assert!(msg.contains("mode 1920x1080"));
        assert!(msg.contains("0x0342"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: SensorError = ConfigError::UnsupportedLaneCount(4).into();
        assert!(matches!(err, SensorError::Config(ConfigError::UnsupportedLaneCount(4))));
        assert!(!err.is_invalid_request());
    }

    #[test]
    fn test_invalid_request_classification() {
        assert!(SensorError::UnknownControl(0x1234).is_invalid_request());
        assert!(SensorError::Busy.is_invalid_request());
        assert!(!SensorError::NotPowered.is_invalid_request());
    }
}
