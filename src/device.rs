//! IMX708 device: identification, mode negotiation, controls and streaming.
//!
//! All mutable state lives behind one lock. Every host operation takes the
//! lock for its full duration, including blocking register sequences and
//! power-up delays.

use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};

use crate::config::{BoardConfig, LinkFrequency, DATA_LANES};
use crate::controls::{
    Control, ControlId, ControlSet, ControlValues, MODE_STANDBY, MODE_STREAMING, REG_MODE_SELECT,
};
use crate::error::{ConfigError, Result, SensorError};
use crate::framing::{exposure_register, HdrExposures};
use crate::modes::{self, HdrMode, ModeDescriptor};
use crate::power::{PowerControl, PowerManager, PowerToken, PowerTransition, INCLK_FREQ_HZ};
use crate::sequencer::{CalibrationOutcome, RegisterIo, RegisterList};
use crate::tables;
use crate::traits::{
    FormatWhich, Format, FourCC, Fraction, FrameIntervalEntry, FrameSize, HdrConfig, MbusConfig,
    ModuleInfo, RegWidth, RegisterBus, RegisterRead, SensorSubdev,
};

/// Base sensor name.
pub const SENSOR_NAME: &str = "imx708";
/// Chip identity register.
pub const REG_CHIP_ID: u16 = 0x0016;
/// Expected chip identity.
pub const CHIP_ID: u32 = 0x0708;
/// Camera module identity register.
pub const REG_MODULE_ID: u16 = 0x0000;

const MODULE_ID_WIDE: u32 = 0x02;
const MODULE_ID_NOIR: u32 = 0x80;

enum StreamState {
    Standby,
    Streaming(PowerToken),
}

impl StreamState {
    const fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }
}

struct SensorState {
    mode: &'static ModeDescriptor,
    long_exp_shift: u8,
    stream: StreamState,
    calibrated: bool,
    link_frequency: LinkFrequency,
    host_power: Option<PowerToken>,
    try_format: Format,
}

/// Point-in-time view of the sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorStatus {
    /// Active mode.
    pub mode: &'static ModeDescriptor,
    /// Long-exposure shift last programmed.
    pub long_exp_shift: u8,
    /// Whether the sensor is streaming.
    pub streaming: bool,
    /// Whether the common registers and calibration patch are in place.
    pub calibrated: bool,
    /// Whether the sensor has power.
    pub powered: bool,
    /// Outstanding power references.
    pub power_usage: u32,
    /// Programmed link frequency.
    pub link_frequency: LinkFrequency,
}

struct Inner<B, W> {
    bus: B,
    power: PowerManager<W>,
    state: SensorState,
    controls: ControlSet,
}

/// A Sony IMX708 attached to a register bus and power resources.
pub struct Imx708<B, W> {
    inner: Mutex<Inner<B, W>>,
    name: String,
    variant: String,
    info: ModuleInfo,
}

fn identify<B: RegisterBus>(io: &mut RegisterIo<'_, B>) -> Result<String> {
    let found = io.read(REG_CHIP_ID, RegWidth::Word).inspect_err(|err| {
        error!("failed to read chip id {CHIP_ID:x}: {err}");
    })?;
    if found != CHIP_ID {
        error!("chip id mismatch: {CHIP_ID:x}!={found:x}");
        return Err(ConfigError::ChipIdMismatch {
            expected: CHIP_ID,
            found,
        }
        .into());
    }

    let mut variant = SENSOR_NAME.to_owned();
    match io.read(REG_MODULE_ID, RegWidth::Word) {
        Ok(id) => {
            info!("camera module ID {id:#06x}");
            if id & MODULE_ID_WIDE != 0 {
                variant.push_str("_wide");
            }
            if id & MODULE_ID_NOIR != 0 {
                variant.push_str("_noir");
            }
        }
        Err(err) => warn!("failed to read module id: {err}"),
    }
    Ok(variant)
}

impl<B: RegisterBus, W: PowerControl> Imx708<B, W> {
    /// Validate the board, identify the sensor and set up controls.
    ///
    /// The sensor is powered only for identification and is left powered
    /// down.
    pub fn attach(mut bus: B, power: W, board: &BoardConfig) -> Result<Self> {
        let board = board.resolve()?;

        let rate = power.clock_rate();
        if rate != INCLK_FREQ_HZ {
            error!("inclk frequency not supported: {rate} Hz");
            return Err(ConfigError::ClockRate(rate).into());
        }

        let mode = modes::initial_mode(board.hdr_mode);
        let mut power = PowerManager::new(power);

        let token = power.acquire()?;
        let identified = identify(&mut RegisterIo::new(&mut bus, &token));
        power.release(token);
        let variant = identified?;

        let name = format!(
            "m{:02}_{}_{SENSOR_NAME}",
            board.module_index,
            board.module_facing.tag()
        );
        info!("{name}: {variant} attached, initial mode {}x{}", mode.width, mode.height);

        let [first, ..] = &modes::CATALOG;
        let state = SensorState {
            mode,
            long_exp_shift: 0,
            stream: StreamState::Standby,
            calibrated: false,
            link_frequency: board.link_frequency,
            host_power: None,
            try_format: Format::new(first.width, first.height, first.code),
        };
        let controls = ControlSet::new(mode, board.link_frequency.hz());

        Ok(Self {
            inner: Mutex::new(Inner {
                bus,
                power,
                state,
                controls,
            }),
            name,
            variant,
            info: ModuleInfo {
                sensor: SENSOR_NAME.to_owned(),
                module: board.module_name,
                lens: board.lens_name,
            },
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<B, W>>> {
        self.inner.lock().map_err(|_| SensorError::LockPoisoned)
    }

    /// Device name, `m<index>_<facing>_imx708`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sensor name with module variant suffixes.
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Snapshot of the sensor state.
    pub fn status(&self) -> Result<SensorStatus> {
        let inner = self.lock()?;
        Ok(SensorStatus {
            mode: inner.state.mode,
            long_exp_shift: inner.state.long_exp_shift,
            streaming: inner.state.stream.is_streaming(),
            calibrated: inner.state.calibrated,
            powered: inner.power.is_powered(),
            power_usage: inner.power.usage(),
            link_frequency: inner.state.link_frequency,
        })
    }

    /// Current control values.
    pub fn control_values(&self) -> Result<ControlValues> {
        Ok(self.lock()?.controls.values())
    }

    /// A control with its current range.
    pub fn control_info(&self, id: ControlId) -> Result<Control> {
        Ok(self.lock()?.controls.get(id).clone())
    }

    /// Start streaming. Does nothing if already streaming.
    pub fn start_streaming(&self) -> Result<()> {
        self.lock()?.start_streaming()
    }

    /// Stop streaming. Does nothing if not streaming.
    pub fn stop_streaming(&self) -> Result<()> {
        self.lock()?.stop_streaming();
        Ok(())
    }

    /// System sleep: stop the sensor output and remove power.
    ///
    /// A streaming device stays marked as streaming and restarts on
    /// [`resume`](Self::resume).
    pub fn suspend(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.state.stream.is_streaming() {
            inner.write_stream_off();
        }
        if inner.power.suspend() {
            inner.state.calibrated = false;
            debug!("{}: suspended", self.name);
        }
        Ok(())
    }

    /// Restore power and restart streaming if it was running at suspend.
    pub fn resume(&self) -> Result<()> {
        let mut inner = self.lock()?;
        if let Err(err) = inner.power.resume() {
            error!("{}: failed to resume power: {err}", self.name);
            inner.stop_streaming();
            return Err(err.into());
        }

        let StreamState::Streaming(token) =
            mem::replace(&mut inner.state.stream, StreamState::Standby)
        else {
            return Ok(());
        };
        match inner.program(&token) {
            Ok(()) => {
                inner.state.stream = StreamState::Streaming(token);
                debug!("{}: resumed streaming", self.name);
                Ok(())
            }
            Err(err) => {
                error!("{}: failed to restart streaming: {err}", self.name);
                inner.release_power(token);
                inner.controls.grab_flips(false);
                Err(err)
            }
        }
    }

    /// Stop streaming, drop every power reference and power down.
    pub fn detach(self) {
        let mut inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        inner.stop_streaming();
        if let Some(token) = inner.state.host_power.take() {
            inner.release_power(token);
        }
        if inner.power.suspend() {
            inner.state.calibrated = false;
        }
        info!("{}: detached", self.name);
    }
}

impl<B: RegisterBus, W: PowerControl> Inner<B, W> {
    fn release_power(&mut self, token: PowerToken) {
        if self.power.release(token) == PowerTransition::PoweredDown {
            self.state.calibrated = false;
        }
    }

    /// Steps of stream start that run with power already held.
    fn program(&mut self, token: &PowerToken) -> Result<()> {
        let Self {
            bus,
            state,
            controls,
            ..
        } = self;
        let mut io = RegisterIo::new(bus, token);

        if !state.calibrated {
            io.apply_register_list(&RegisterList::new("common", tables::MODE_COMMON_REGS))?;
            if io.apply_calibration_patch()? == CalibrationOutcome::Applied {
                debug!("PDAF gains written");
            }
            state.calibrated = true;
        }

        io.apply_register_list(&state.mode.reg_list)?;
        io.apply_register_list(&state.link_frequency.registers())?;
        controls.replay(&mut io, state.mode, &mut state.long_exp_shift)?;
        io.write(REG_MODE_SELECT, RegWidth::Byte, MODE_STREAMING)
    }

    fn start_streaming(&mut self) -> Result<()> {
        if self.state.stream.is_streaming() {
            return Ok(());
        }

        let token = self.power.acquire()?;
        if let Err(err) = self.program(&token) {
            error!("failed to start streaming: {err}");
            self.release_power(token);
            return Err(err);
        }

        self.state.stream = StreamState::Streaming(token);
        self.controls.grab_flips(true);
        info!(
            "streaming {}x{} at {} Hz link",
            self.state.mode.width,
            self.state.mode.height,
            self.state.link_frequency.hz()
        );
        Ok(())
    }

    fn write_stream_off(&mut self) {
        let Some(token) = self.power.get_if_in_use() else {
            return;
        };
        let result = RegisterIo::new(&mut self.bus, &token).write(
            REG_MODE_SELECT,
            RegWidth::Byte,
            MODE_STANDBY,
        );
        if let Err(err) = result {
            error!("failed to set stream off: {err}");
        }
        self.release_power(token);
    }

    fn stop_streaming(&mut self) {
        if !self.state.stream.is_streaming() {
            return;
        }
        self.write_stream_off();
        if let StreamState::Streaming(token) =
            mem::replace(&mut self.state.stream, StreamState::Standby)
        {
            self.release_power(token);
        }
        self.controls.grab_flips(false);
        info!("streaming stopped");
    }

    /// Write one control, plus exposure when blanking moved its range or scale.
    fn apply_control(
        &mut self,
        id: ControlId,
        exposure_clamped: bool,
        token: &PowerToken,
    ) -> Result<()> {
        let Self {
            bus,
            state,
            controls,
            ..
        } = self;
        let mut io = RegisterIo::new(bus, token);
        let shift_before = state.long_exp_shift;
        controls.write(id, &mut io, state.mode, &mut state.long_exp_shift)?;
        if id == ControlId::VerticalBlanking
            && (exposure_clamped || state.long_exp_shift != shift_before)
        {
            controls.write(ControlId::Exposure, &mut io, state.mode, &mut state.long_exp_shift)?;
        }
        Ok(())
    }

    fn set_control(&mut self, id: ControlId, requested: i64) -> Result<i64> {
        let value = self.controls.resolve(id, requested)?;
        let committed = self.controls.commit(id, value, self.state.mode);
        debug!("control {id:?}: requested {requested}, stored {value}");

        let Some(token) = self.power.get_if_in_use() else {
            return Ok(committed.value);
        };
        let result = self.apply_control(id, committed.exposure_clamped, &token);
        self.release_power(token);
        result.map(|()| committed.value)
    }

    fn commit_mode(&mut self, mode: &'static ModeDescriptor) -> Result<()> {
        if self.state.stream.is_streaming() {
            if mode == self.state.mode {
                return Ok(());
            }
            return Err(SensorError::Busy);
        }

        self.state.mode = mode;
        self.controls.apply_framing_limits(mode);
        debug!(
            "mode {}x{} {:?}, vblank {}",
            mode.width,
            mode.height,
            mode.hdr,
            mode.vblank_default
        );

        if let Some(token) = self.power.get_if_in_use() {
            let result = self.apply_control(ControlId::VerticalBlanking, true, &token);
            self.release_power(token);
            result?;
        }
        Ok(())
    }

    fn set_power(&mut self, on: bool) -> Result<()> {
        if on == self.state.host_power.is_some() {
            return Ok(());
        }
        if on {
            self.state.host_power = Some(self.power.acquire()?);
        } else if let Some(token) = self.state.host_power.take() {
            self.release_power(token);
        }
        debug!("host power {}", if on { "on" } else { "off" });
        Ok(())
    }
}

impl<B: RegisterBus, W: PowerControl> RegisterRead for Imx708<B, W> {
    fn read_register(&self, address: u16, width: RegWidth) -> Result<u32> {
        let mut inner = self.lock()?;
        let token = inner.power.get_if_in_use().ok_or(SensorError::NotPowered)?;
        let result = RegisterIo::new(&mut inner.bus, &token).read(address, width);
        inner.release_power(token);
        result
    }
}

impl<B: RegisterBus, W: PowerControl> SensorSubdev for Imx708<B, W> {
    fn enum_mbus_code(&self, index: u32) -> Result<FourCC> {
        match index {
            0 => Ok(FourCC::SRGGB10),
            _ => Err(SensorError::InvalidIndex(index)),
        }
    }

    fn enum_frame_size(&self, index: u32, code: FourCC) -> Result<FrameSize> {
        if code != FourCC::SRGGB10 {
            return Err(SensorError::UnsupportedFormat(code));
        }
        let mode = modes::mode_at(index)?;
        Ok(FrameSize {
            code,
            width: mode.width,
            height: mode.height,
        })
    }

    fn enum_frame_interval(&self, index: u32) -> Result<FrameIntervalEntry> {
        let mode = modes::mode_at(index)?;
        Ok(FrameIntervalEntry {
            size: FrameSize {
                code: mode.code,
                width: mode.width,
                height: mode.height,
            },
            interval: mode.max_fps,
        })
    }

    fn format(&self, which: FormatWhich) -> Result<Format> {
        let inner = self.lock()?;
        Ok(match which {
            FormatWhich::Try => inner.state.try_format,
            FormatWhich::Active => {
                let mode = inner.state.mode;
                Format::new(mode.width, mode.height, mode.code)
            }
        })
    }

    fn set_format(&self, which: FormatWhich, request: &Format) -> Result<Format> {
        let mode = modes::find_best_fit(request.code, request.width, request.height)?;
        let format = Format::new(mode.width, mode.height, mode.code);

        let mut inner = self.lock()?;
        match which {
            FormatWhich::Try => inner.state.try_format = format,
            FormatWhich::Active => inner.commit_mode(mode)?,
        }
        Ok(format)
    }

    fn frame_interval(&self) -> Result<Fraction> {
        Ok(self.lock()?.state.mode.max_fps)
    }

    fn control(&self, id: u32) -> Result<i64> {
        let id = ControlId::try_from(id)?;
        Ok(self.lock()?.controls.value(id))
    }

    fn set_control(&self, id: u32, value: i64) -> Result<i64> {
        let id = ControlId::try_from(id).inspect_err(|_| {
            warn!("{}: unhandled control {id:#010x}", self.name);
        })?;
        self.lock()?.set_control(id, value)
    }

    fn set_stream(&self, enable: bool) -> Result<()> {
        let mut inner = self.lock()?;
        if enable {
            inner.start_streaming()
        } else {
            inner.stop_streaming();
            Ok(())
        }
    }

    fn set_power(&self, on: bool) -> Result<()> {
        self.lock()?.set_power(on)
    }

    fn module_info(&self) -> ModuleInfo {
        self.info.clone()
    }

    fn set_hdr_mode(&self, hdr: HdrMode) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.state.stream.is_streaming() {
            return Err(SensorError::Busy);
        }
        let current = inner.state.mode;
        let mode = modes::find_hdr_variant(current.width, current.height, hdr)?;
        inner.commit_mode(mode)
    }

    fn hdr_config(&self) -> Result<HdrConfig> {
        let inner = self.lock()?;
        let mode = inner.state.mode;
        let ratio = mode.hdr.exposure_ratio();
        let long = exposure_register(mode, inner.controls.values().exposure, 0);
        let exposures = HdrExposures::derive(long, ratio);
        Ok(HdrConfig {
            mode: mode.hdr,
            ratio,
            long: exposures.long,
            medium: exposures.medium,
            short: exposures.short,
        })
    }

    fn mbus_config(&self) -> MbusConfig {
        MbusConfig {
            data_lanes: DATA_LANES,
        }
    }
}
