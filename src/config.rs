//! Board description: CSI-2 endpoint and camera module properties.

use log::debug;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::modes::HdrMode;
use crate::sequencer::RegisterList;
use crate::tables;

/// Number of CSI-2 data lanes the mode tables are written for.
pub const DATA_LANES: u32 = 2;

/// Link frequencies the sensor PLL can be programmed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFrequency {
    /// 450 MHz.
    Mhz450,
    /// 447 MHz.
    Mhz447,
    /// 453 MHz.
    Mhz453,
}

impl LinkFrequency {
    /// Every supported frequency.
    pub const ALL: [Self; 3] = [Self::Mhz450, Self::Mhz447, Self::Mhz453];

    /// Frequency in Hz.
    pub const fn hz(self) -> u64 {
        match self {
            Self::Mhz450 => 450_000_000,
            Self::Mhz447 => 447_000_000,
            Self::Mhz453 => 453_000_000,
        }
    }

    /// Look up a frequency in Hz.
    pub fn from_hz(hz: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|freq| freq.hz() == hz)
    }

    /// PLL registers for this frequency.
    pub const fn registers(self) -> RegisterList<'static> {
        match self {
            Self::Mhz450 => RegisterList::new("link 450MHz", tables::LINK_450MHZ_REGS),
            Self::Mhz447 => RegisterList::new("link 447MHz", tables::LINK_447MHZ_REGS),
            Self::Mhz453 => RegisterList::new("link 453MHz", tables::LINK_453MHZ_REGS),
        }
    }
}

/// Which side of the device the module faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFacing {
    /// Rear camera.
    #[default]
    Back,
    /// Front camera.
    Front,
}

impl ModuleFacing {
    /// Single-letter tag used in device names.
    pub const fn tag(self) -> char {
        match self {
            Self::Back => 'b',
            Self::Front => 'f',
        }
    }
}

/// Board description as written by the integrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardConfig {
    /// CSI-2 data lanes wired to the sensor.
    pub data_lanes: u32,
    /// Link frequencies in Hz; only the first is used.
    #[serde(default)]
    pub link_frequencies: Vec<u64>,
    /// Camera module index.
    #[serde(default)]
    pub module_index: u32,
    /// Module orientation.
    #[serde(default)]
    pub module_facing: ModuleFacing,
    /// Module model name.
    #[serde(default)]
    pub module_name: String,
    /// Lens model name.
    #[serde(default)]
    pub lens_name: String,
    /// Preferred HDR variant code for the initial mode.
    #[serde(default)]
    pub hdr_mode: Option<u32>,
}

/// Validated board properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardInfo {
    /// Programmed link frequency.
    pub link_frequency: LinkFrequency,
    /// Camera module index.
    pub module_index: u32,
    /// Module orientation.
    pub module_facing: ModuleFacing,
    /// Module model name.
    pub module_name: String,
    /// Lens model name.
    pub lens_name: String,
    /// Preferred HDR variant.
    pub hdr_mode: Option<HdrMode>,
}

impl BoardConfig {
    /// Parse a TOML board description.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate against what the sensor supports.
    pub fn resolve(&self) -> Result<BoardInfo, ConfigError> {
        if self.data_lanes != DATA_LANES {
            return Err(ConfigError::UnsupportedLaneCount(self.data_lanes));
        }

        let first = *self
            .link_frequencies
            .first()
            .ok_or(ConfigError::MissingLinkFrequency)?;
        let link_frequency =
            LinkFrequency::from_hz(first).ok_or(ConfigError::UnsupportedLinkFrequency(first))?;

        let hdr_mode = match self.hdr_mode {
            Some(code) => Some(
                HdrMode::from_code(code)
                    .ok_or_else(|| ConfigError::Parse(format!("unknown hdr mode {code}")))?,
            ),
            None => None,
        };

        debug!(
            "board: {} lanes, link {} Hz, module {} {:?}",
            self.data_lanes,
            link_frequency.hz(),
            self.module_index,
            self.module_facing
        );

        Ok(BoardInfo {
            link_frequency,
            module_index: self.module_index,
            module_facing: self.module_facing,
            module_name: self.module_name.clone(),
            lens_name: self.lens_name.clone(),
            hdr_mode,
        })
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_lanes: DATA_LANES,
            link_frequencies: vec![LinkFrequency::Mhz450.hz()],
            module_index: 0,
            module_facing: ModuleFacing::Back,
            module_name: String::new(),
            lens_name: String::new(),
            hdr_mode: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_board_description() {
        let config = BoardConfig::from_toml_str(
            r#"
            data_lanes = 2
            link_frequencies = [447000000, 450000000]
            module_index = 1
            module_facing = "front"
            module_name = "rpi-v3"
            lens_name = "wide"
            hdr_mode = 6
            "#,
        )
        .expect("parse should succeed");

        let info = config.resolve().expect("board should resolve");
        assert_eq!(info.link_frequency, LinkFrequency::Mhz447);
        assert_eq!(info.module_index, 1);
        assert_eq!(info.module_facing, ModuleFacing::Front);
        assert_eq!(info.module_name, "rpi-v3");
        assert_eq!(info.hdr_mode, Some(HdrMode::X3));
    }

    #[test]
    fn test_minimal_description_uses_defaults() {
        let config = BoardConfig::from_toml_str("data_lanes = 2\nlink_frequencies = [453000000]")
            .expect("parse should succeed");
        let info = config.resolve().expect("board should resolve");
        assert_eq!(info.link_frequency, LinkFrequency::Mhz453);
        assert_eq!(info.module_facing, ModuleFacing::Back);
        assert_eq!(info.hdr_mode, None);
    }

    #[test]
    fn test_rejects_lane_count() {
        let config = BoardConfig {
            data_lanes: 4,
            ..BoardConfig::default()
        };
        assert_eq!(config.resolve(), Err(ConfigError::UnsupportedLaneCount(4)));
    }

    #[test]
    fn test_rejects_missing_link_frequency() {
        let config = BoardConfig {
            link_frequencies: Vec::new(),
            ..BoardConfig::default()
        };
        assert_eq!(config.resolve(), Err(ConfigError::MissingLinkFrequency));
    }

    #[test]
    fn test_only_first_link_frequency_checked() {
        let config = BoardConfig {
            link_frequencies: vec![400_000_000, 450_000_000],
            ..BoardConfig::default()
        };
        assert_eq!(
            config.resolve(),
            Err(ConfigError::UnsupportedLinkFrequency(400_000_000))
        );
    }

    #[test]
    fn test_rejects_unknown_hdr_code() {
        let config = BoardConfig {
            hdr_mode: Some(3),
            ..BoardConfig::default()
        };
        assert!(matches!(config.resolve(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_error() {
        let err = BoardConfig::from_toml_str("data_lanes = \"two\"").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_link_registers() {
        let list = LinkFrequency::Mhz453.registers();
        assert_eq!(list.regs.len(), 2);
        assert_eq!(list.regs[1].value, 0x2e);
        assert_eq!(LinkFrequency::from_hz(450_000_000), Some(LinkFrequency::Mhz450));
        assert_eq!(ModuleFacing::Front.tag(), 'f');
    }
}
