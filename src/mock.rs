//! Simulated sensor hardware for testing without a board.
//!
//! [`MockBus`] is a register file behind the [`RegisterBus`] trait. The mock
//! power resources record every rail, clock, reset and delay operation in a
//! shared [`PowerLog`]. Both hand out cloneable handles so tests can inspect
//! and inject failures after the hardware has been moved into a device.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::i2c::ErrorKind;

use crate::error::PowerError;
use crate::power::{ClockSource, PowerRail, PowerResources, INCLK_FREQ_HZ, SUPPLY_NAMES};
use crate::traits::{RegWidth, RegisterBus};

/// A register write observed on the mock bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    /// Register address.
    pub address: u16,
    /// Transfer width.
    pub width: RegWidth,
    /// Value written.
    pub value: u32,
}

#[derive(Debug, Default)]
struct BusState {
    registers: HashMap<u16, u8>,
    writes: Vec<WriteRecord>,
    reads: usize,
    fail_write_at: Option<u16>,
    fail_reads: bool,
}

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock register bus backed by a simulated register file.
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// Create a bus presenting a freshly reset IMX708.
    #[must_use]
    pub fn new() -> Self {
        let bus = Self {
            state: Arc::new(Mutex::new(BusState::default())),
        };
        let handle = bus.handle();
        handle.set_register16(0x0016, 0x0708); // chip id
        handle.set_register16(0x0000, 0x0000); // module id
        handle.set_register(0x7b10, 0x40); // PDAF gains not yet written
        bus
    }

    /// Set the module id register.
    #[must_use]
    pub fn with_module_id(self, id: u16) -> Self {
        self.handle().set_register16(0x0000, id);
        self
    }

    /// Set the chip id register.
    #[must_use]
    pub fn with_chip_id(self, id: u16) -> Self {
        self.handle().set_register16(0x0016, id);
        self
    }

    /// Handle for inspecting the register file.
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl RegisterBus for MockBus {
    fn read(&mut self, address: u16, width: RegWidth) -> Result<u32, ErrorKind> {
        let mut state = lock(&self.state);
        if state.fail_reads {
            return Err(ErrorKind::Bus);
        }
        state.reads += 1;
        let byte = |addr: u16| u32::from(state.registers.get(&addr).copied().unwrap_or(0));
        Ok(match width {
            RegWidth::Byte => byte(address),
            RegWidth::Word => (byte(address) << 8) | byte(address.wrapping_add(1)),
        })
    }

    fn write(&mut self, address: u16, width: RegWidth, value: u32) -> Result<(), ErrorKind> {
        let mut state = lock(&self.state);
        if state.fail_write_at == Some(address) {
            return Err(ErrorKind::Bus);
        }
        let [_, _, hi, lo] = value.to_be_bytes();
        match width {
            RegWidth::Byte => {
                state.registers.insert(address, lo);
            }
            RegWidth::Word => {
                state.registers.insert(address, hi);
                state.registers.insert(address.wrapping_add(1), lo);
            }
        }
        state.writes.push(WriteRecord {
            address,
            width,
            value,
        });
        Ok(())
    }
}

/// Shared view of a [`MockBus`].
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<BusState>>,
}

impl MockHandle {
    /// All successful writes, oldest first.
    pub fn writes(&self) -> Vec<WriteRecord> {
        lock(&self.state).writes.clone()
    }

    /// Forget recorded writes.
    pub fn clear_writes(&self) {
        lock(&self.state).writes.clear();
    }

    /// Number of successful reads.
    pub fn read_count(&self) -> usize {
        lock(&self.state).reads
    }

    /// Current byte value of a register.
    pub fn register(&self, address: u16) -> u8 {
        lock(&self.state)
            .registers
            .get(&address)
            .copied()
            .unwrap_or(0)
    }

    /// Current big-endian value of a 16-bit register pair.
    pub fn register16(&self, address: u16) -> u16 {
        u16::from_be_bytes([self.register(address), self.register(address.wrapping_add(1))])
    }

    /// Preset a register without recording a write.
    pub fn set_register(&self, address: u16, value: u8) {
        lock(&self.state).registers.insert(address, value);
    }

    /// Preset a 16-bit register pair without recording a write.
    pub fn set_register16(&self, address: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        let mut state = lock(&self.state);
        state.registers.insert(address, hi);
        state.registers.insert(address.wrapping_add(1), lo);
    }

    /// Fail every write to `address`.
    pub fn fail_writes_at(&self, address: u16) {
        lock(&self.state).fail_write_at = Some(address);
    }

    /// Fail every read.
    pub fn fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    /// Remove injected failures.
    pub fn clear_failures(&self) {
        let mut state = lock(&self.state);
        state.fail_write_at = None;
        state.fail_reads = false;
    }
}

/// Power operation observed by the mock resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerEvent {
    /// A rail was enabled.
    RailOn(String),
    /// A rail was disabled.
    RailOff(String),
    /// The clock was started.
    ClockOn,
    /// The clock was stopped.
    ClockOff,
    /// The reset line was driven; `true` releases the sensor from reset.
    Reset(bool),
    /// A delay, in nanoseconds.
    Delay(u32),
}

#[derive(Debug, Default)]
struct PowerState {
    events: Vec<PowerEvent>,
    rails_on: Vec<String>,
    fail_rail: Option<String>,
    fail_clock: bool,
}

/// Shared log of mock power operations.
#[derive(Clone, Default)]
pub struct PowerLog {
    state: Arc<Mutex<PowerState>>,
}

impl PowerLog {
    /// All operations, oldest first.
    pub fn events(&self) -> Vec<PowerEvent> {
        lock(&self.state).events.clone()
    }

    /// Rails currently enabled.
    pub fn rails_on(&self) -> Vec<String> {
        lock(&self.state).rails_on.clone()
    }

    /// Number of times the clock was started.
    pub fn power_ons(&self) -> usize {
        self.count(&PowerEvent::ClockOn)
    }

    /// Number of times the clock was stopped.
    pub fn power_offs(&self) -> usize {
        self.count(&PowerEvent::ClockOff)
    }

    /// Make the named rail refuse to enable.
    pub fn fail_rail(&self, name: &str) {
        lock(&self.state).fail_rail = Some(name.to_owned());
    }

    /// Make the clock refuse to start.
    pub fn fail_clock(&self) {
        lock(&self.state).fail_clock = true;
    }

    /// Remove injected failures.
    pub fn clear_failures(&self) {
        let mut state = lock(&self.state);
        state.fail_rail = None;
        state.fail_clock = false;
    }

    fn count(&self, event: &PowerEvent) -> usize {
        lock(&self.state).events.iter().filter(|e| *e == event).count()
    }

    fn push(&self, event: PowerEvent) {
        lock(&self.state).events.push(event);
    }
}

/// Mock supply rail.
pub struct MockRail {
    name: String,
    log: PowerLog,
}

impl PowerRail for MockRail {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<(), PowerError> {
        let mut state = lock(&self.log.state);
        if state.fail_rail.as_deref() == Some(self.name.as_str()) {
            return Err(PowerError::Regulator(self.name.clone()));
        }
        state.rails_on.push(self.name.clone());
        state.events.push(PowerEvent::RailOn(self.name.clone()));
        Ok(())
    }

    fn disable(&mut self) {
        let mut state = lock(&self.log.state);
        state.rails_on.retain(|name| *name != self.name);
        state.events.push(PowerEvent::RailOff(self.name.clone()));
    }
}

/// Mock input clock.
pub struct MockClock {
    rate: u32,
    log: PowerLog,
}

impl ClockSource for MockClock {
    fn rate_hz(&self) -> u32 {
        self.rate
    }

    fn enable(&mut self) -> Result<(), PowerError> {
        if lock(&self.log.state).fail_clock {
            return Err(PowerError::Clock);
        }
        self.log.push(PowerEvent::ClockOn);
        Ok(())
    }

    fn disable(&mut self) {
        self.log.push(PowerEvent::ClockOff);
    }
}

/// Mock reset line.
pub struct MockResetPin {
    log: PowerLog,
}

impl ErrorType for MockResetPin {
    type Error = Infallible;
}

impl OutputPin for MockResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(PowerEvent::Reset(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(PowerEvent::Reset(true));
        Ok(())
    }
}

/// Mock delay provider; records instead of sleeping.
pub struct MockDelay {
    log: PowerLog,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(PowerEvent::Delay(ns));
    }
}

/// Power resources built from the mock parts.
pub type MockPower = PowerResources<MockRail, MockClock, MockResetPin, MockDelay>;

/// Mock power resources with a correct input clock.
pub fn mock_power() -> (MockPower, PowerLog) {
    mock_power_with_clock(INCLK_FREQ_HZ)
}

/// Mock power resources with the given input clock rate.
pub fn mock_power_with_clock(rate: u32) -> (MockPower, PowerLog) {
    let log = PowerLog::default();
    let rails = SUPPLY_NAMES
        .iter()
        .map(|&name| MockRail {
            name: name.to_owned(),
            log: log.clone(),
        })
        .collect();
    let resources = PowerResources::new(
        rails,
        MockClock {
            rate,
            log: log.clone(),
        },
        Some(MockResetPin { log: log.clone() }),
        MockDelay { log: log.clone() },
    );
    (resources, log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_bus_defaults() {
        let mut bus = MockBus::new();
        assert_eq!(bus.read(0x0016, RegWidth::Word), Ok(0x0708));
        assert_eq!(bus.read(0x7b10, RegWidth::Byte), Ok(0x40));
        assert_eq!(bus.handle().read_count(), 2);
    }

    #[test]
    fn test_mock_bus_word_write() {
        let mut bus = MockBus::new();
        let handle = bus.handle();
        bus.write(0x0340, RegWidth::Word, 0x04e6)
            .expect("write should succeed");
        assert_eq!(handle.register(0x0340), 0x04);
        assert_eq!(handle.register(0x0341), 0xe6);
        assert_eq!(handle.register16(0x0340), 0x04e6);
        assert_eq!(handle.writes().len(), 1);
    }

    #[test]
    fn test_mock_bus_failures() {
        let mut bus = MockBus::new();
        let handle = bus.handle();
        handle.fail_writes_at(0x0100);
        assert_eq!(bus.write(0x0100, RegWidth::Byte, 1), Err(ErrorKind::Bus));
        assert!(bus.write(0x0101, RegWidth::Byte, 1).is_ok());

        handle.fail_reads(true);
        assert_eq!(bus.read(0x0016, RegWidth::Word), Err(ErrorKind::Bus));

        handle.clear_failures();
        assert!(bus.write(0x0100, RegWidth::Byte, 1).is_ok());
        assert!(bus.read(0x0016, RegWidth::Word).is_ok());
    }

    #[test]
    fn test_mock_power_parts() {
        let (resources, log) = mock_power_with_clock(19_200_000);
        let mut rail = MockRail {
            name: "vdig".to_owned(),
            log: log.clone(),
        };
        assert_eq!(rail.name(), "vdig");
        rail.enable().expect("enable should succeed");
        assert_eq!(log.rails_on(), vec!["vdig".to_owned()]);
        rail.disable();
        assert!(log.rails_on().is_empty());
        drop(resources);
    }
}
