//! Catalog of supported sensor modes and best-fit negotiation.

use log::{debug, warn};

use crate::error::{Result, SensorError};
use crate::framing::HDR_EXPOSURE_RATIO;
use crate::sequencer::RegisterList;
use crate::tables;
use crate::traits::{FourCC, Fraction};

/// Left edge of the active pixel array.
pub const PIXEL_ARRAY_LEFT: u32 = 16;
/// Top edge of the active pixel array.
pub const PIXEL_ARRAY_TOP: u32 = 24;
/// Active pixel array width.
pub const PIXEL_ARRAY_WIDTH: u32 = 4608;
/// Active pixel array height.
pub const PIXEL_ARRAY_HEIGHT: u32 = 2592;

/// HDR readout variant of a mode.
///
/// Discriminants are the board-description codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HdrMode {
    /// Single exposure.
    #[default]
    Off = 0,
    /// Two exposures.
    X2 = 5,
    /// Three exposures with a fixed ratio.
    X3 = 6,
}

impl HdrMode {
    /// Look up a board-description code.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            5 => Some(Self::X2),
            6 => Some(Self::X3),
            _ => None,
        }
    }

    /// Exposure ratio the sensor applies between successive exposures.
    pub const fn exposure_ratio(self) -> u32 {
        match self {
            Self::Off => 1,
            Self::X2 | Self::X3 => HDR_EXPOSURE_RATIO as u32,
        }
    }
}

/// A rectangle on the pixel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// A supported operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDescriptor {
    /// Output pixel format.
    pub code: FourCC,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
    /// Shortest frame interval.
    pub max_fps: Fraction,
    /// Line length including horizontal blanking, in pixels.
    pub line_length_pix: u32,
    /// Analog crop rectangle.
    pub crop: Rect,
    /// Smallest vertical blanking.
    pub vblank_min: u32,
    /// Vertical blanking applied on mode change.
    pub vblank_default: u32,
    /// Registers that configure the mode.
    pub reg_list: RegisterList<'static>,
    /// Pixel rate.
    pub pixel_rate: u64,
    /// Smallest exposure, in lines.
    pub exposure_lines_min: u32,
    /// Exposure granularity, in lines.
    pub exposure_lines_step: u32,
    /// HDR variant.
    pub hdr: HdrMode,
}

const FULL_ARRAY: Rect = Rect {
    left: PIXEL_ARRAY_LEFT,
    top: PIXEL_ARRAY_TOP,
    width: PIXEL_ARRAY_WIDTH,
    height: PIXEL_ARRAY_HEIGHT,
};

const HDR_RATIO_SQ: u32 = (HDR_EXPOSURE_RATIO as u32) * (HDR_EXPOSURE_RATIO as u32);

/// Supported modes. Order is negotiation priority.
pub static CATALOG: [ModeDescriptor; 4] = [
    // Full resolution.
    ModeDescriptor {
        code: FourCC::SRGGB10,
        width: 4608,
        height: 2592,
        max_fps: Fraction {
            numerator: 10000,
            denominator: 140_000,
        },
        line_length_pix: 0x3d20,
        crop: FULL_ARRAY,
        vblank_min: 58,
        vblank_default: 58,
        reg_list: RegisterList::new("mode 4608x2592", tables::MODE_4608X2592_REGS),
        pixel_rate: 595_200_000,
        exposure_lines_min: 8,
        exposure_lines_step: 1,
        hdr: HdrMode::Off,
    },
    // 2x2 binned.
    ModeDescriptor {
        code: FourCC::SRGGB10,
        width: 1920,
        height: 1080,
        max_fps: Fraction {
            numerator: 10000,
            denominator: 660_000,
        },
        line_length_pix: 0x1e90,
        crop: FULL_ARRAY,
        vblank_min: 40,
        vblank_default: 1198,
        reg_list: RegisterList::new("mode 1920x1080", tables::MODE_2X2_BINNED_REGS),
        pixel_rate: 585_600_000,
        exposure_lines_min: 4,
        exposure_lines_step: 2,
        hdr: HdrMode::Off,
    },
    // The only HDR mode, 2x2 downscaled.
    ModeDescriptor {
        code: FourCC::SRGGB10,
        width: 1920,
        height: 1080,
        max_fps: Fraction {
            numerator: 10000,
            denominator: 310_000,
        },
        line_length_pix: 0x1460,
        crop: FULL_ARRAY,
        vblank_min: 3673,
        vblank_default: 3673,
        reg_list: RegisterList::new("mode 1920x1080 hdr", tables::MODE_HDR_REGS),
        pixel_rate: 777_600_000,
        exposure_lines_min: 8 * HDR_RATIO_SQ,
        exposure_lines_step: 2 * HDR_RATIO_SQ,
        hdr: HdrMode::X3,
    },
    // 2x2 binned and cropped for 720p.
    ModeDescriptor {
        code: FourCC::SRGGB10,
        width: 1536,
        height: 864,
        max_fps: Fraction {
            numerator: 10000,
            denominator: 1_200_000,
        },
        line_length_pix: 0x1460,
        crop: Rect {
            left: PIXEL_ARRAY_LEFT + 768,
            top: PIXEL_ARRAY_TOP + 432,
            width: 3072,
            height: 1728,
        },
        vblank_min: 40,
        vblank_default: 2755,
        reg_list: RegisterList::new("mode 1536x864", tables::MODE_2X2_BINNED_720P_REGS),
        pixel_rate: 566_400_000,
        exposure_lines_min: 4,
        exposure_lines_step: 2,
        hdr: HdrMode::Off,
    },
];

/// Resolution distance used for best-fit selection.
const fn resolution_distance(mode: &ModeDescriptor, width: u32, height: u32) -> u32 {
    mode.width.abs_diff(width) + mode.height.abs_diff(height)
}

/// Pick the closest mode for a format request.
///
/// Among modes with the requested code, the one minimizing
/// `|Δwidth| + |Δheight|` wins; ties go to the earlier catalog entry.
pub fn find_best_fit(code: FourCC, width: u32, height: u32) -> Result<&'static ModeDescriptor> {
    let mut best: Option<(usize, &'static ModeDescriptor, u32)> = None;
    for (index, mode) in CATALOG.iter().enumerate() {
        if mode.code != code {
            continue;
        }
        let dist = resolution_distance(mode, width, height);
        if best.map_or(true, |(_, _, best_dist)| dist < best_dist) {
            best = Some((index, mode, dist));
        }
    }

    let (index, mode, _) = best.ok_or(SensorError::UnsupportedFormat(code))?;
    debug!("best fit for {code} {width}x{height}: mode {index} ({}x{})", mode.width, mode.height);
    Ok(mode)
}

/// Find the mode with exactly this resolution and HDR variant.
pub fn find_hdr_variant(width: u32, height: u32, hdr: HdrMode) -> Result<&'static ModeDescriptor> {
    CATALOG
        .iter()
        .find(|mode| mode.width == width && mode.height == height && mode.hdr == hdr)
        .ok_or(SensorError::NoHdrVariant { width, height, hdr })
}

/// Mode selected at attach time from the board's HDR preference.
pub fn initial_mode(hdr: Option<HdrMode>) -> &'static ModeDescriptor {
    let [first, ..] = &CATALOG;
    let Some(hdr) = hdr else {
        warn!("no hdr mode configured, using {}x{}", first.width, first.height);
        return first;
    };
    CATALOG.iter().find(|mode| mode.hdr == hdr).unwrap_or_else(|| {
        warn!("no {hdr:?} mode in catalog, using {}x{}", first.width, first.height);
        first
    })
}

/// Catalog entry by enumeration index.
pub fn mode_at(index: u32) -> Result<&'static ModeDescriptor> {
    usize::try_from(index)
        .ok()
        .and_then(|i| CATALOG.get(i))
        .ok_or(SensorError::InvalidIndex(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_fit_exact_prefers_non_hdr() {
        let mode = find_best_fit(FourCC::SRGGB10, 1920, 1080).expect("mode should match");
        assert_eq!((mode.width, mode.height), (1920, 1080));
        assert_eq!(mode.hdr, HdrMode::Off);
    }

    #[test]
    fn test_best_fit_nearest() {
        let mode = find_best_fit(FourCC::SRGGB10, 1280, 720).expect("mode should match");
        assert_eq!((mode.width, mode.height), (1536, 864));

        let mode = find_best_fit(FourCC::SRGGB10, 4000, 3000).expect("mode should match");
        assert_eq!((mode.width, mode.height), (4608, 2592));
    }

    #[test]
    fn test_best_fit_minimizes_distance() {
        for (width, height) in [(0, 0), (640, 480), (1700, 1000), (3264, 2448), (9000, 9000)] {
            let mode = find_best_fit(FourCC::SRGGB10, width, height).expect("mode should match");
            let best = resolution_distance(mode, width, height);
            let first_best = CATALOG
                .iter()
                .position(|m| resolution_distance(m, width, height) == best)
                .expect("some mode has the best distance");
            assert!(CATALOG.iter().all(|m| resolution_distance(m, width, height) >= best));
            assert!(std::ptr::eq(mode, &CATALOG[first_best]));
        }
    }

    #[test]
    fn test_best_fit_unknown_code() {
        let err = find_best_fit(FourCC::new(b"YUYV"), 1920, 1080).expect_err("should fail");
        assert!(matches!(err, SensorError::UnsupportedFormat(code) if code == FourCC::new(b"YUYV")));
    }

    #[test]
    fn test_find_hdr_variant() {
        let mode = find_hdr_variant(1920, 1080, HdrMode::X3).expect("hdr mode exists");
        assert_eq!(mode.hdr, HdrMode::X3);
        assert_eq!(mode.exposure_lines_min, 128);

        let err = find_hdr_variant(4608, 2592, HdrMode::X3).expect_err("no hdr at full res");
        assert!(matches!(err, SensorError::NoHdrVariant { width: 4608, .. }));
    }

    #[test]
    fn test_initial_mode() {
        assert_eq!(initial_mode(Some(HdrMode::Off)).width, 4608);
        assert_eq!(initial_mode(Some(HdrMode::X3)).hdr, HdrMode::X3);
        assert_eq!(initial_mode(Some(HdrMode::X2)).width, 4608);
        assert_eq!(initial_mode(None).width, 4608);
    }

    #[test]
    fn test_catalog_uniqueness() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in CATALOG.iter().skip(i + 1) {
                let same_size = a.width == b.width && a.height == b.height && a.code == b.code;
                assert!(!(same_size && a.hdr == b.hdr));
            }
        }
    }

    #[test]
    fn test_hdr_code() {
        assert_eq!(HdrMode::from_code(6), Some(HdrMode::X3));
        assert_eq!(HdrMode::from_code(3), None);
        assert_eq!(HdrMode::X3.exposure_ratio(), 4);
        assert_eq!(HdrMode::Off.exposure_ratio(), 1);
    }

    #[test]
    fn test_mode_at() {
        assert_eq!(mode_at(3).expect("index 3 exists").width, 1536);
        assert!(matches!(mode_at(4), Err(SensorError::InvalidIndex(4))));
    }
}
