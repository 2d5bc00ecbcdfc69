//! Core traits and types for the sensor control surface.

use std::fmt;

use embedded_hal::i2c::ErrorKind;

use crate::error::Result;
use crate::modes::HdrMode;

/// Pixel format representation (e.g., RG10 for 10-bit RGGB Bayer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// 10-bit Bayer RGGB, the sensor's native readout order.
    pub const SRGGB10: Self = Self::new(b"RG10");
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

/// Register value width on the control bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWidth {
    /// One byte.
    Byte = 1,
    /// Two bytes, big-endian.
    Word = 2,
}

impl RegWidth {
    /// Number of bytes transferred.
    pub const fn len(self) -> usize {
        self as usize
    }

    /// Largest value that fits in this width.
    pub const fn max_value(self) -> u32 {
        match self {
            Self::Byte => 0xff,
            Self::Word => 0xffff,
        }
    }
}

/// Byte-level register transport to the sensor.
///
/// Addresses are 16-bit. Implementations perform one blocking bus
/// transaction per call.
pub trait RegisterBus {
    /// Read a 1- or 2-byte register.
    fn read(&mut self, address: u16, width: RegWidth) -> std::result::Result<u32, ErrorKind>;

    /// Write a 1- or 2-byte register.
    fn write(
        &mut self,
        address: u16,
        width: RegWidth,
        value: u32,
    ) -> std::result::Result<(), ErrorKind>;
}

/// Diagnostic register readback on a live device.
pub trait RegisterRead {
    /// Read a register while the sensor is powered.
    fn read_register(&self, address: u16, width: RegWidth) -> Result<u32>;
}

/// Which format slot a format request addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatWhich {
    /// Negotiate only; nothing is committed to the device.
    Try,
    /// Negotiate and commit the mode.
    Active,
}

/// Media bus format of the sensor output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub code: FourCC,
}

impl Format {
    /// Create a new format specification.
    #[must_use]
    pub const fn new(width: u32, height: u32, code: FourCC) -> Self {
        Self {
            width,
            height,
            code,
        }
    }
}

/// A rational number, used for frame intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    /// Numerator.
    pub numerator: u32,
    /// Denominator.
    pub denominator: u32,
}

/// Discrete frame size reported during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// Pixel format.
    pub code: FourCC,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Frame interval reported during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIntervalEntry {
    /// Frame size this interval applies to.
    pub size: FrameSize,
    /// Shortest frame interval.
    pub interval: Fraction,
}

/// Camera module identity exposed on the vendor channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Sensor name.
    pub sensor: String,
    /// Camera module name.
    pub module: String,
    /// Lens name.
    pub lens: String,
}

/// Current HDR configuration exposed on the vendor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdrConfig {
    /// Active HDR variant.
    pub mode: HdrMode,
    /// Ratio between successive exposures, 1 when HDR is off.
    pub ratio: u32,
    /// Longest exposure, in lines.
    pub long: u32,
    /// Medium exposure the sensor derives, in lines.
    pub medium: u32,
    /// Short exposure the sensor derives, in lines.
    pub short: u32,
}

/// Physical bus between the sensor and the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbusConfig {
    /// Number of CSI-2 D-PHY data lanes.
    pub data_lanes: u32,
}

/// Operations the host capture framework invokes on the sensor.
///
/// Every method is serialized against the others on the same device.
pub trait SensorSubdev {
    /// Enumerate supported media bus codes.
    fn enum_mbus_code(&self, index: u32) -> Result<FourCC>;

    /// Enumerate supported frame sizes for a code.
    fn enum_frame_size(&self, index: u32, code: FourCC) -> Result<FrameSize>;

    /// Enumerate supported frame intervals.
    fn enum_frame_interval(&self, index: u32) -> Result<FrameIntervalEntry>;

    /// Get the trial or active format.
    fn format(&self, which: FormatWhich) -> Result<Format>;

    /// Negotiate a format. Returns the format actually selected.
    fn set_format(&self, which: FormatWhich, request: &Format) -> Result<Format>;

    /// Frame interval of the active mode.
    fn frame_interval(&self) -> Result<Fraction>;

    /// Get a control value by V4L2 control id.
    fn control(&self, id: u32) -> Result<i64>;

    /// Set a control value by V4L2 control id. Returns the value stored.
    fn set_control(&self, id: u32, value: i64) -> Result<i64>;

    /// Start or stop streaming.
    fn set_stream(&self, enable: bool) -> Result<()>;

    /// Take or drop a host-held power reference.
    fn set_power(&self, on: bool) -> Result<()>;

    /// Camera module identity.
    fn module_info(&self) -> ModuleInfo;

    /// Switch the active mode to the HDR variant of the current resolution.
    fn set_hdr_mode(&self, hdr: HdrMode) -> Result<()>;

    /// Current HDR configuration.
    fn hdr_config(&self) -> Result<HdrConfig>;

    /// Bus configuration.
    fn mbus_config(&self) -> MbusConfig;
}
