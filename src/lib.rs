//! imx708-control: control core for the Sony IMX708 image sensor
//!
//! This library negotiates sensor modes, derives exposure and timing limits,
//! and sequences the sensor through power-up, calibration, mode programming
//! and streaming. Hardware is reached through small traits so the same
//! logic runs against a real I2C bus or the mock register file.

pub mod config;
pub mod controls;
pub mod device;
pub mod error;
pub mod framing;
pub mod i2c;
pub mod mock;
pub mod modes;
pub mod power;
pub mod sequencer;
mod tables;
pub mod traits;
pub mod validation;

pub use config::{BoardConfig, BoardInfo, LinkFrequency, ModuleFacing};
pub use controls::{ControlId, ControlValues};
pub use device::{Imx708, SensorStatus};
pub use error::{ConfigError, PowerError, Result, SensorError};
pub use i2c::CciBus;
pub use modes::{HdrMode, ModeDescriptor, CATALOG};
pub use power::{PowerManager, PowerResources};
pub use traits::{
    Format, FormatWhich, FourCC, Fraction, HdrConfig, ModuleInfo, RegWidth, RegisterBus,
    RegisterRead, SensorSubdev,
};
