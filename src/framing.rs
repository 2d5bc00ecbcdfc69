//! Framing and exposure limits derived from the active mode.
//!
//! Frame length is `height + vblank` lines. When that exceeds the 16-bit
//! frame-length register, the sensor's line unit is scaled by `2^shift` and
//! both frame length and exposure are written pre-divided.

use crate::modes::ModeDescriptor;

/// Largest value of the frame-length register.
pub const FRAME_LENGTH_MAX: u32 = 0xffff;
/// Largest long-exposure shift the sensor accepts.
pub const LONG_EXP_SHIFT_MAX: u8 = 7;
/// Readout margin between frame length and the longest legal exposure, in lines.
pub const EXPOSURE_OFFSET: u32 = 48;
/// Smallest exposure the control accepts, in lines.
pub const EXPOSURE_MIN: u32 = 1;
/// Exposure control step.
pub const EXPOSURE_STEP: u32 = 1;
/// Exposure control default before any mode limits apply.
pub const EXPOSURE_DEFAULT: u32 = 0x640;
/// Exposure control maximum before any mode limits apply.
pub const EXPOSURE_MAX: u32 = FRAME_LENGTH_MAX - EXPOSURE_OFFSET;
/// Ratio between successive exposures (and gains) in HDR readout.
pub const HDR_EXPOSURE_RATIO: u8 = 4;

/// Ranges the host sees for the mode-dependent timing controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingLimits {
    /// Pixel rate, fixed per mode.
    pub pixel_rate: u64,
    /// Horizontal blanking, fixed per mode.
    pub hblank: u32,
    /// Smallest vertical blanking.
    pub vblank_min: u32,
    /// Largest vertical blanking, bounded by the shifted frame-length range.
    pub vblank_max: u32,
    /// Vertical blanking applied on mode change.
    pub vblank_default: u32,
}

impl FramingLimits {
    /// Derive limits for `mode`.
    pub const fn for_mode(mode: &ModeDescriptor) -> Self {
        Self {
            pixel_rate: mode.pixel_rate,
            hblank: mode.line_length_pix - mode.width,
            vblank_min: mode.vblank_min,
            vblank_max: (1 << LONG_EXP_SHIFT_MAX) * FRAME_LENGTH_MAX - mode.height,
            vblank_default: mode.vblank_default,
        }
    }
}

/// Longest exposure legal with the given vertical blanking.
pub const fn exposure_max(mode: &ModeDescriptor, vblank: u32) -> u32 {
    (mode.height + vblank).saturating_sub(EXPOSURE_OFFSET)
}

/// Frame length split into the register value and its shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLength {
    /// Value for the 16-bit frame-length register.
    pub lines: u16,
    /// Value for the long-exposure shift register.
    pub shift: u8,
}

impl FrameLength {
    /// Encode a total frame length in lines.
    ///
    /// Totals beyond what seven halvings can represent saturate.
    pub fn encode(total: u32) -> Self {
        let mut lines = total;
        let mut shift = 0;
        while lines > FRAME_LENGTH_MAX && shift < LONG_EXP_SHIFT_MAX {
            lines >>= 1;
            shift += 1;
        }
        Self {
            lines: u16::try_from(lines).unwrap_or(u16::MAX),
            shift,
        }
    }

    /// Frame length the sensor will actually run, in lines.
    pub fn total(self) -> u32 {
        u32::from(self.lines) << self.shift
    }
}

/// Value for the exposure register given a requested exposure in lines.
///
/// The request is raised to the mode minimum, rounded down to the mode step
/// and scaled by the current long-exposure shift. In HDR modes this is the
/// longest of the three exposures.
pub fn exposure_register(mode: &ModeDescriptor, requested: u32, shift: u8) -> u32 {
    let mut lines = requested.max(mode.exposure_lines_min);
    if mode.exposure_lines_step > 0 {
        lines -= lines % mode.exposure_lines_step;
    }
    lines >> shift
}

/// Exposures the sensor derives in HDR readout, in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdrExposures {
    /// Exposure as programmed.
    pub long: u32,
    /// `long / ratio`.
    pub medium: u32,
    /// `long / ratio²`.
    pub short: u32,
}

impl HdrExposures {
    /// Split a programmed long exposure with the given ratio.
    pub const fn derive(long: u32, ratio: u32) -> Self {
        if ratio <= 1 {
            return Self {
                long,
                medium: long,
                short: long,
            };
        }
        Self {
            long,
            medium: long / ratio,
            short: long / (ratio * ratio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::CATALOG;

    fn binned_1080p() -> &'static ModeDescriptor {
        &CATALOG[1]
    }

    #[test]
    fn test_framing_limits_binned_1080p() {
        let limits = FramingLimits::for_mode(binned_1080p());
        assert_eq!(limits.pixel_rate, 585_600_000);
        assert_eq!(limits.hblank, 0x1e90 - 1920);
        assert_eq!(limits.vblank_min, 40);
        assert_eq!(limits.vblank_max, 128 * 0xffff - 1080);
        assert_eq!(limits.vblank_default, 1198);
    }

    #[test]
    fn test_exposure_max_tracks_vblank() {
        let mode = binned_1080p();
        assert_eq!(exposure_max(mode, 1198), 2230);
        for vblank in [40, 500, 1198, 60_000, 8_000_000] {
            assert_eq!(exposure_max(mode, vblank), 1080 + vblank - 48);
        }
    }

    #[test]
    fn test_frame_length_fits_without_shift() {
        for total in [1, 1120, 0x8000, 0xffff] {
            let encoded = FrameLength::encode(total);
            assert_eq!(encoded.shift, 0);
            assert_eq!(u32::from(encoded.lines), total);
        }
    }

    #[test]
    fn test_frame_length_shifted() {
        let encoded = FrameLength::encode(131_000);
        assert_eq!(encoded, FrameLength { lines: 65_500, shift: 1 });
    }

    #[test]
    fn test_frame_length_reconstruction_bounds() {
        for total in [0x1_0000, 131_071, 262_143, 1_000_001, 4_000_000, 128 * 0xffff] {
            let encoded = FrameLength::encode(total);
            let step = 1u32 << encoded.shift;
            assert!(encoded.shift <= LONG_EXP_SHIFT_MAX);
            assert!(encoded.total() <= total);
            assert!(encoded.total() + step > total, "total {total} -> {encoded:?}");
        }
    }

    #[test]
    fn test_frame_length_saturates() {
        let encoded = FrameLength::encode(u32::MAX);
        assert_eq!(encoded.shift, LONG_EXP_SHIFT_MAX);
        assert_eq!(encoded.lines, u16::MAX);
    }

    #[test]
    fn test_exposure_register_rounding() {
        let mode = binned_1080p();
        // minimum 4, step 2
        assert_eq!(exposure_register(mode, 1, 0), 4);
        assert_eq!(exposure_register(mode, 1001, 0), 1000);
        assert_eq!(exposure_register(mode, 1001, 1), 500);
    }

    #[test]
    fn test_exposure_register_hdr() {
        let hdr = &CATALOG[2];
        // minimum 8*16, step 2*16
        assert_eq!(exposure_register(hdr, 10, 0), 128);
        assert_eq!(exposure_register(hdr, 1000, 0), 992);
    }

    #[test]
    fn test_hdr_exposures() {
        let exposures = HdrExposures::derive(992, u32::from(HDR_EXPOSURE_RATIO));
        assert_eq!(exposures.medium, 248);
        assert_eq!(exposures.short, 62);
        assert_eq!(HdrExposures::derive(500, 1).short, 500);
    }
}
