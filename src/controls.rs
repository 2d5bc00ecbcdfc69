//! Sensor controls: ranges, clamping, derived limits and register writes.

use crate::error::{Result, SensorError};
use crate::framing::{
    exposure_max, exposure_register, FrameLength, FramingLimits, EXPOSURE_DEFAULT, EXPOSURE_MAX,
    EXPOSURE_MIN, EXPOSURE_STEP,
};
use crate::modes::ModeDescriptor;
use crate::sequencer::RegisterIo;
use crate::traits::{RegWidth, RegisterBus};

/// Streaming on/off register.
pub const REG_MODE_SELECT: u16 = 0x0100;
/// `REG_MODE_SELECT` value for software standby.
pub const MODE_STANDBY: u32 = 0x00;
/// `REG_MODE_SELECT` value for streaming.
pub const MODE_STREAMING: u32 = 0x01;
/// Flip register: bit 0 horizontal, bit 1 vertical.
pub const REG_ORIENTATION: u16 = 0x0101;
/// Frame length in lines, pre-divided by the long-exposure shift.
pub const REG_FRAME_LENGTH: u16 = 0x0340;
/// Long-exposure shift.
pub const REG_LONG_EXP_SHIFT: u16 = 0x3100;
/// Coarse integration time, pre-divided by the long-exposure shift.
pub const REG_EXPOSURE: u16 = 0x0202;
/// Analogue gain code.
pub const REG_ANALOG_GAIN: u16 = 0x0204;
/// Digital gain, Q8.
pub const REG_DIGITAL_GAIN: u16 = 0x020e;
/// Test pattern selector.
pub const REG_TEST_PATTERN: u16 = 0x0600;
/// Test pattern colours in R, Gr, B, Gb order.
pub const REG_TEST_PATTERN_COLOURS: [u16; 4] = [0x0602, 0x0604, 0x0606, 0x0608];

/// Analogue gain range and default.
pub const ANA_GAIN_MIN: i64 = 112;
/// Largest analogue gain code.
pub const ANA_GAIN_MAX: i64 = 960;
/// Digital gain range and default (1.0 in Q8).
pub const DGTL_GAIN_MIN: i64 = 0x0100;
/// Largest digital gain.
pub const DGTL_GAIN_MAX: i64 = 0xffff;
/// Largest test pattern colour component.
pub const TEST_PATTERN_COLOUR_MAX: i64 = 0x0fff;
/// Pixel rate reported before a mode has been applied.
pub const INITIAL_PIXEL_RATE: i64 = 590_000_000;

/// Test pattern menu, in host menu order.
pub const TEST_PATTERN_MENU: [&str; 5] = [
    "Disabled",
    "Color Bars",
    "Solid Color",
    "Grey Color Bars",
    "PN9",
];

/// Register codes for each entry of [`TEST_PATTERN_MENU`].
pub const TEST_PATTERN_CODES: [u32; 5] = [0, 2, 1, 3, 4];

const CID_BASE: u32 = 0x0098_0900;
const CID_IMAGE_SOURCE_BASE: u32 = 0x009e_0900;
const CID_IMAGE_PROC_BASE: u32 = 0x009f_0900;

/// Controls exposed by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    /// Pixel rate (read-only).
    PixelRate,
    /// Link frequency (read-only).
    LinkFrequency,
    /// Vertical blanking, in lines.
    VerticalBlanking,
    /// Horizontal blanking, in pixels (read-only).
    HorizontalBlanking,
    /// Exposure, in lines.
    Exposure,
    /// Analogue gain code.
    AnalogueGain,
    /// Digital gain, Q8.
    DigitalGain,
    /// Horizontal flip.
    HorizontalFlip,
    /// Vertical flip.
    VerticalFlip,
    /// Test pattern menu index.
    TestPattern,
    /// Test pattern red component.
    TestPatternRed,
    /// Test pattern green (red row) component.
    TestPatternGreenRed,
    /// Test pattern blue component.
    TestPatternBlue,
    /// Test pattern green (blue row) component.
    TestPatternGreenBlue,
}

impl ControlId {
    /// Every control, in replay order for the writable ones.
    pub const ALL: [Self; 14] = [
        Self::PixelRate,
        Self::LinkFrequency,
        Self::VerticalBlanking,
        Self::HorizontalBlanking,
        Self::Exposure,
        Self::AnalogueGain,
        Self::DigitalGain,
        Self::HorizontalFlip,
        Self::VerticalFlip,
        Self::TestPattern,
        Self::TestPatternRed,
        Self::TestPatternGreenRed,
        Self::TestPatternBlue,
        Self::TestPatternGreenBlue,
    ];

    /// V4L2 control id.
    pub const fn cid(self) -> u32 {
        match self {
            Self::Exposure => CID_BASE + 17,
            Self::HorizontalFlip => CID_BASE + 20,
            Self::VerticalFlip => CID_BASE + 21,
            Self::VerticalBlanking => CID_IMAGE_SOURCE_BASE + 1,
            Self::HorizontalBlanking => CID_IMAGE_SOURCE_BASE + 2,
            Self::AnalogueGain => CID_IMAGE_SOURCE_BASE + 3,
            Self::TestPatternRed => CID_IMAGE_SOURCE_BASE + 4,
            Self::TestPatternGreenRed => CID_IMAGE_SOURCE_BASE + 5,
            Self::TestPatternBlue => CID_IMAGE_SOURCE_BASE + 6,
            Self::TestPatternGreenBlue => CID_IMAGE_SOURCE_BASE + 7,
            Self::LinkFrequency => CID_IMAGE_PROC_BASE + 1,
            Self::PixelRate => CID_IMAGE_PROC_BASE + 2,
            Self::TestPattern => CID_IMAGE_PROC_BASE + 3,
            Self::DigitalGain => CID_IMAGE_PROC_BASE + 5,
        }
    }

    /// Look up a V4L2 control id.
    pub fn from_cid(cid: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.cid() == cid)
    }

    const fn is_flip(self) -> bool {
        matches!(self, Self::HorizontalFlip | Self::VerticalFlip)
    }
}

impl TryFrom<u32> for ControlId {
    type Error = SensorError;

    fn try_from(cid: u32) -> Result<Self> {
        Self::from_cid(cid).ok_or(SensorError::UnknownControl(cid))
    }
}

/// One integer control with its range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// Which control.
    pub id: ControlId,
    /// Smallest value.
    pub minimum: i64,
    /// Largest value.
    pub maximum: i64,
    /// Granularity.
    pub step: i64,
    /// Default value.
    pub default: i64,
    value: i64,
    read_only: bool,
    grabbed: bool,
}

impl Control {
    const fn new(id: ControlId, minimum: i64, maximum: i64, step: i64, default: i64) -> Self {
        Self {
            id,
            minimum,
            maximum,
            step,
            default,
            value: default,
            read_only: false,
            grabbed: false,
        }
    }

    const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Current value.
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// Whether the host may not write this control.
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether the control is frozen.
    pub const fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    /// Round to the step and clamp into range.
    pub fn clamp(&self, requested: i64) -> i64 {
        let step = self.step.max(1);
        let mut val = if self.maximum >= 0 && requested >= self.maximum - step / 2 {
            self.maximum
        } else {
            requested.saturating_add(step / 2)
        };
        val = val.clamp(self.minimum, self.maximum);
        let offset = val - self.minimum;
        self.minimum + step * (offset / step)
    }

    /// Replace the range; the current value is clamped into it.
    ///
    /// Returns whether the current value changed.
    pub fn modify_range(&mut self, minimum: i64, maximum: i64, step: i64, default: i64) -> bool {
        self.minimum = minimum;
        self.maximum = maximum;
        self.step = step;
        self.default = default;
        let clamped = self.clamp(self.value);
        let changed = clamped != self.value;
        self.value = clamped;
        changed
    }

    fn set_value(&mut self, value: i64) {
        self.value = value;
    }
}

/// Snapshot of the current control values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlValues {
    /// Exposure, in lines.
    pub exposure: u32,
    /// Analogue gain code.
    pub analogue_gain: u32,
    /// Digital gain, Q8.
    pub digital_gain: u32,
    /// Vertical blanking, in lines.
    pub vblank: u32,
    /// Horizontal blanking, in pixels.
    pub hblank: u32,
    /// Pixel rate.
    pub pixel_rate: u64,
    /// Horizontal flip.
    pub hflip: bool,
    /// Vertical flip.
    pub vflip: bool,
    /// Test pattern menu index.
    pub test_pattern: u32,
    /// Test pattern colours in R, Gr, B, Gb order.
    pub test_pattern_colours: [u32; 4],
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Result of storing a control value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Committed {
    /// Value stored.
    pub value: i64,
    /// The exposure value was clamped by a new exposure range.
    pub exposure_clamped: bool,
}

/// All controls of one sensor.
#[derive(Debug, Clone)]
pub struct ControlSet {
    pixel_rate: Control,
    link_frequency: Control,
    vblank: Control,
    hblank: Control,
    exposure: Control,
    analogue_gain: Control,
    digital_gain: Control,
    hflip: Control,
    vflip: Control,
    test_pattern: Control,
    test_pattern_colours: [Control; 4],
}

impl ControlSet {
    /// Create the controls for a sensor running `mode` with the given link frequency.
    pub fn new(mode: &ModeDescriptor, link_frequency_hz: u64) -> Self {
        let link = i64::try_from(link_frequency_hz).unwrap_or(i64::MAX);
        let colour = |id| {
            Control::new(id, 0, TEST_PATTERN_COLOUR_MAX, 1, TEST_PATTERN_COLOUR_MAX)
        };
        let mut set = Self {
            pixel_rate: Control::new(
                ControlId::PixelRate,
                INITIAL_PIXEL_RATE,
                INITIAL_PIXEL_RATE,
                1,
                INITIAL_PIXEL_RATE,
            )
            .read_only(),
            link_frequency: Control::new(ControlId::LinkFrequency, link, link, 1, link)
                .read_only(),
            vblank: Control::new(ControlId::VerticalBlanking, 0, 0xffff, 1, 0),
            hblank: Control::new(ControlId::HorizontalBlanking, 0, 0xffff, 1, 0).read_only(),
            exposure: Control::new(
                ControlId::Exposure,
                i64::from(EXPOSURE_MIN),
                i64::from(EXPOSURE_MAX),
                i64::from(EXPOSURE_STEP),
                i64::from(EXPOSURE_DEFAULT),
            ),
            analogue_gain: Control::new(
                ControlId::AnalogueGain,
                ANA_GAIN_MIN,
                ANA_GAIN_MAX,
                1,
                ANA_GAIN_MIN,
            ),
            digital_gain: Control::new(
                ControlId::DigitalGain,
                DGTL_GAIN_MIN,
                DGTL_GAIN_MAX,
                1,
                DGTL_GAIN_MIN,
            ),
            hflip: Control::new(ControlId::HorizontalFlip, 0, 1, 1, 0),
            vflip: Control::new(ControlId::VerticalFlip, 0, 1, 1, 0),
            test_pattern: Control::new(ControlId::TestPattern, 0, 4, 1, 0),
            test_pattern_colours: [
                colour(ControlId::TestPatternRed),
                colour(ControlId::TestPatternGreenRed),
                colour(ControlId::TestPatternBlue),
                colour(ControlId::TestPatternGreenBlue),
            ],
        };
        set.apply_framing_limits(mode);
        set
    }

    /// Look up a control.
    pub const fn get(&self, id: ControlId) -> &Control {
        match id {
            ControlId::PixelRate => &self.pixel_rate,
            ControlId::LinkFrequency => &self.link_frequency,
            ControlId::VerticalBlanking => &self.vblank,
            ControlId::HorizontalBlanking => &self.hblank,
            ControlId::Exposure => &self.exposure,
            ControlId::AnalogueGain => &self.analogue_gain,
            ControlId::DigitalGain => &self.digital_gain,
            ControlId::HorizontalFlip => &self.hflip,
            ControlId::VerticalFlip => &self.vflip,
            ControlId::TestPattern => &self.test_pattern,
            ControlId::TestPatternRed => &self.test_pattern_colours[0],
            ControlId::TestPatternGreenRed => &self.test_pattern_colours[1],
            ControlId::TestPatternBlue => &self.test_pattern_colours[2],
            ControlId::TestPatternGreenBlue => &self.test_pattern_colours[3],
        }
    }

    fn get_mut(&mut self, id: ControlId) -> &mut Control {
        match id {
            ControlId::PixelRate => &mut self.pixel_rate,
            ControlId::LinkFrequency => &mut self.link_frequency,
            ControlId::VerticalBlanking => &mut self.vblank,
            ControlId::HorizontalBlanking => &mut self.hblank,
            ControlId::Exposure => &mut self.exposure,
            ControlId::AnalogueGain => &mut self.analogue_gain,
            ControlId::DigitalGain => &mut self.digital_gain,
            ControlId::HorizontalFlip => &mut self.hflip,
            ControlId::VerticalFlip => &mut self.vflip,
            ControlId::TestPattern => &mut self.test_pattern,
            ControlId::TestPatternRed => &mut self.test_pattern_colours[0],
            ControlId::TestPatternGreenRed => &mut self.test_pattern_colours[1],
            ControlId::TestPatternBlue => &mut self.test_pattern_colours[2],
            ControlId::TestPatternGreenBlue => &mut self.test_pattern_colours[3],
        }
    }

    /// Current value of a control.
    pub const fn value(&self, id: ControlId) -> i64 {
        self.get(id).value()
    }

    /// Snapshot of every value.
    pub fn values(&self) -> ControlValues {
        let [r, gr, b, gb] = &self.test_pattern_colours;
        ControlValues {
            exposure: to_u32(self.exposure.value),
            analogue_gain: to_u32(self.analogue_gain.value),
            digital_gain: to_u32(self.digital_gain.value),
            vblank: to_u32(self.vblank.value),
            hblank: to_u32(self.hblank.value),
            pixel_rate: u64::try_from(self.pixel_rate.value).unwrap_or_default(),
            hflip: self.hflip.value != 0,
            vflip: self.vflip.value != 0,
            test_pattern: to_u32(self.test_pattern.value),
            test_pattern_colours: [r, gr, b, gb].map(|c| to_u32(c.value)),
        }
    }

    /// Freeze or release the flip pair.
    pub fn grab_flips(&mut self, grabbed: bool) {
        self.hflip.grabbed = grabbed;
        self.vflip.grabbed = grabbed;
    }

    /// Reset pixel rate, blanking and exposure limits for a new mode.
    ///
    /// Vertical blanking returns to the mode default and the exposure
    /// range follows it.
    pub fn apply_framing_limits(&mut self, mode: &ModeDescriptor) -> bool {
        let limits = FramingLimits::for_mode(mode);
        let rate = i64::try_from(limits.pixel_rate).unwrap_or(i64::MAX);
        self.pixel_rate.modify_range(rate, rate, 1, rate);

        let vblank_default = i64::from(limits.vblank_default);
        self.vblank.modify_range(
            i64::from(limits.vblank_min),
            i64::from(limits.vblank_max),
            1,
            vblank_default,
        );
        self.vblank.set_value(vblank_default);

        let hblank = i64::from(limits.hblank);
        self.hblank.modify_range(hblank, hblank, 1, hblank);

        self.adjust_exposure_range(mode)
    }

    /// Bound exposure by the current vertical blanking.
    ///
    /// Returns whether the exposure value had to be clamped.
    pub fn adjust_exposure_range(&mut self, mode: &ModeDescriptor) -> bool {
        let max = i64::from(exposure_max(mode, to_u32(self.vblank.value)));
        let default = max.min(self.exposure.value);
        let (minimum, step) = (self.exposure.minimum, self.exposure.step);
        self.exposure.modify_range(minimum, max, step, default)
    }

    /// Validate a host request and clamp it into range.
    pub fn resolve(&self, id: ControlId, requested: i64) -> Result<i64> {
        let control = self.get(id);
        if control.read_only {
            return Err(SensorError::ReadOnlyControl(id));
        }
        if control.grabbed {
            return Err(SensorError::ControlGrabbed(id));
        }
        Ok(control.clamp(requested))
    }

    /// Store a resolved value and update dependent ranges.
    pub fn commit(&mut self, id: ControlId, value: i64, mode: &ModeDescriptor) -> Committed {
        self.get_mut(id).set_value(value);
        let exposure_clamped =
            id == ControlId::VerticalBlanking && self.adjust_exposure_range(mode);
        Committed {
            value,
            exposure_clamped,
        }
    }

    /// Write one control to the sensor.
    ///
    /// Vertical blanking recomputes the long-exposure shift in `shift`.
    pub fn write<B: RegisterBus>(
        &self,
        id: ControlId,
        io: &mut RegisterIo<'_, B>,
        mode: &ModeDescriptor,
        shift: &mut u8,
    ) -> Result<()> {
        let value = to_u32(self.value(id));
        match id {
            ControlId::PixelRate | ControlId::LinkFrequency | ControlId::HorizontalBlanking => {
                Ok(())
            }
            ControlId::VerticalBlanking => {
                let frame = FrameLength::encode(mode.height + value);
                io.write(REG_FRAME_LENGTH, RegWidth::Word, u32::from(frame.lines))?;
                io.write(REG_LONG_EXP_SHIFT, RegWidth::Byte, u32::from(frame.shift))?;
                *shift = frame.shift;
                Ok(())
            }
            ControlId::Exposure => io.write(
                REG_EXPOSURE,
                RegWidth::Word,
                exposure_register(mode, value, *shift),
            ),
            ControlId::AnalogueGain => io.write(REG_ANALOG_GAIN, RegWidth::Word, value),
            ControlId::DigitalGain => io.write(REG_DIGITAL_GAIN, RegWidth::Word, value),
            ControlId::HorizontalFlip | ControlId::VerticalFlip => {
                let orientation = to_u32(self.hflip.value) | (to_u32(self.vflip.value) << 1);
                io.write(REG_ORIENTATION, RegWidth::Byte, orientation)
            }
            ControlId::TestPattern => {
                let code = usize::try_from(value)
                    .ok()
                    .and_then(|index| TEST_PATTERN_CODES.get(index))
                    .copied()
                    .unwrap_or(0);
                io.write(REG_TEST_PATTERN, RegWidth::Word, code)
            }
            ControlId::TestPatternRed => io.write(REG_TEST_PATTERN_COLOURS[0], RegWidth::Word, value),
            ControlId::TestPatternGreenRed => {
                io.write(REG_TEST_PATTERN_COLOURS[1], RegWidth::Word, value)
            }
            ControlId::TestPatternBlue => {
                io.write(REG_TEST_PATTERN_COLOURS[2], RegWidth::Word, value)
            }
            ControlId::TestPatternGreenBlue => {
                io.write(REG_TEST_PATTERN_COLOURS[3], RegWidth::Word, value)
            }
        }
    }

    /// Write every writable control, blanking first so exposure sees the new shift.
    pub fn replay<B: RegisterBus>(
        &self,
        io: &mut RegisterIo<'_, B>,
        mode: &ModeDescriptor,
        shift: &mut u8,
    ) -> Result<()> {
        let mut flips_written = false;
        for id in ControlId::ALL {
            if self.get(id).read_only {
                continue;
            }
            // the flip pair shares one register
            if id.is_flip() {
                if flips_written {
                    continue;
                }
                flips_written = true;
            }
            self.write(id, io, mode, shift)?;
        }
        Ok(())
    }
}
