//! Power sequencing and reference-counted power usage.
//!
//! Register access is only legal while power is in use. Every successful
//! [`PowerManager::acquire`] hands out a [`PowerToken`], and the register
//! sequencer cannot be constructed without one.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, warn};

use crate::error::PowerError;

/// Required input clock rate.
pub const INCLK_FREQ_HZ: u32 = 24_000_000;

/// Settling delay between releasing reset and the first register access.
pub const XCLR_MIN_DELAY_US: u32 = 8000;

/// Supply rails, in no particular order.
pub const SUPPLY_NAMES: [&str; 4] = [
    "vana1", // analog 2.8V
    "vana2", // analog 1.8V
    "vdig",  // digital core 1.1V
    "vddl",  // interface 1.8V
];

/// A switchable supply rail.
pub trait PowerRail {
    /// Supply name, for diagnostics.
    fn name(&self) -> &str;

    /// Turn the rail on.
    fn enable(&mut self) -> Result<(), PowerError>;

    /// Turn the rail off.
    fn disable(&mut self);
}

/// The sensor input clock.
pub trait ClockSource {
    /// Configured rate in Hz.
    fn rate_hz(&self) -> u32;

    /// Start the clock.
    fn enable(&mut self) -> Result<(), PowerError>;

    /// Stop the clock.
    fn disable(&mut self);
}

/// Raw power-up and power-down of the sensor.
pub trait PowerControl {
    /// Input clock rate in Hz.
    fn clock_rate(&self) -> u32;

    /// Bring the sensor to a state where registers may be accessed.
    fn power_on(&mut self) -> Result<(), PowerError>;

    /// Remove power.
    fn power_off(&mut self);
}

/// Rails, clock and reset line of one sensor.
pub struct PowerResources<R, C, P, D> {
    rails: Vec<R>,
    clock: C,
    reset: Option<P>,
    delay: D,
}

impl<R, C, P, D> PowerResources<R, C, P, D>
where
    R: PowerRail,
    C: ClockSource,
    P: OutputPin,
    D: DelayNs,
{
    /// Bundle the power resources. A missing reset line is tolerated.
    pub fn new(rails: Vec<R>, clock: C, reset: Option<P>, delay: D) -> Self {
        if reset.is_none() {
            warn!("Failed to get reset-gpios");
        }
        Self {
            rails,
            clock,
            reset,
            delay,
        }
    }

    fn disable_rails(&mut self) {
        for rail in self.rails.iter_mut().rev() {
            rail.disable();
        }
    }

    fn set_reset(&mut self, released: bool) {
        let Some(pin) = self.reset.as_mut() else {
            return;
        };
        let result = if released {
            pin.set_high()
        } else {
            pin.set_low()
        };
        if result.is_err() {
            warn!("failed to drive reset line");
        }
    }
}

impl<R, C, P, D> PowerControl for PowerResources<R, C, P, D>
where
    R: PowerRail,
    C: ClockSource,
    P: OutputPin,
    D: DelayNs,
{
    fn clock_rate(&self) -> u32 {
        self.clock.rate_hz()
    }

    fn power_on(&mut self) -> Result<(), PowerError> {
        for index in 0..self.rails.len() {
            let Some(rail) = self.rails.get_mut(index) else {
                break;
            };
            if let Err(err) = rail.enable() {
                error!("failed to enable regulator {}: {err}", rail.name());
                for enabled in self.rails.iter_mut().take(index).rev() {
                    enabled.disable();
                }
                return Err(err);
            }
        }

        if let Err(err) = self.clock.enable() {
            error!("failed to enable clock");
            self.disable_rails();
            return Err(err);
        }

        self.set_reset(true);
        self.delay.delay_us(XCLR_MIN_DELAY_US);
        debug!("sensor powered on");
        Ok(())
    }

    fn power_off(&mut self) {
        self.set_reset(false);
        self.disable_rails();
        self.clock.disable();
        debug!("sensor powered off");
    }
}

/// Proof that sensor power is in use.
///
/// Only [`PowerManager`] creates tokens, and each must be handed back
/// through [`PowerManager::release`].
#[derive(Debug)]
#[must_use = "power usage must be released"]
pub struct PowerToken {
    _private: (),
}

impl PowerToken {
    #[cfg(test)]
    pub(crate) const fn for_tests() -> Self {
        Self { _private: () }
    }
}

/// Outcome of releasing a power reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTransition {
    /// Other references keep the sensor powered.
    StillInUse,
    /// That was the last reference; the sensor is now off.
    PoweredDown,
}

/// Reference-counted power usage over a [`PowerControl`].
pub struct PowerManager<W> {
    control: W,
    usage: u32,
    powered: bool,
}

impl<W: PowerControl> PowerManager<W> {
    /// Wrap power control. The sensor starts powered down.
    pub const fn new(control: W) -> Self {
        Self {
            control,
            usage: 0,
            powered: false,
        }
    }

    /// Input clock rate of the underlying resources.
    pub fn clock_rate(&self) -> u32 {
        self.control.clock_rate()
    }

    /// Number of outstanding references.
    pub const fn usage(&self) -> u32 {
        self.usage
    }

    /// Whether the sensor currently has power.
    pub const fn is_powered(&self) -> bool {
        self.powered
    }

    /// Take a reference, powering up if needed.
    pub fn acquire(&mut self) -> Result<PowerToken, PowerError> {
        if !self.powered {
            self.control.power_on()?;
            self.powered = true;
        }
        self.usage += 1;
        Ok(PowerToken { _private: () })
    }

    /// Take a reference only if power is already in use.
    pub fn get_if_in_use(&mut self) -> Option<PowerToken> {
        if self.usage == 0 || !self.powered {
            return None;
        }
        self.usage += 1;
        Some(PowerToken { _private: () })
    }

    /// Hand back a reference, powering down after the last one.
    #[allow(clippy::needless_pass_by_value)]
    pub fn release(&mut self, token: PowerToken) -> PowerTransition {
        let PowerToken { _private: () } = token;
        self.usage = self.usage.saturating_sub(1);
        if self.usage == 0 && self.powered {
            self.control.power_off();
            self.powered = false;
            return PowerTransition::PoweredDown;
        }
        PowerTransition::StillInUse
    }

    /// Remove power regardless of outstanding references.
    ///
    /// Returns whether the sensor was powered.
    pub fn suspend(&mut self) -> bool {
        if !self.powered {
            return false;
        }
        self.control.power_off();
        self.powered = false;
        true
    }

    /// Restore power if references are outstanding.
    pub fn resume(&mut self) -> Result<(), PowerError> {
        if self.usage > 0 && !self.powered {
            self.control.power_on()?;
            self.powered = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_power, PowerEvent};

    #[test]
    fn test_power_on_sequence() {
        let (mut resources, log) = mock_power();
        resources.power_on().expect("power on should succeed");

        let events = log.events();
        assert_eq!(events.len(), 7);
        assert!(events[..4]
            .iter()
            .all(|e| matches!(e, PowerEvent::RailOn(_))));
        assert_eq!(events[4], PowerEvent::ClockOn);
        assert_eq!(events[5], PowerEvent::Reset(true));
        assert_eq!(events[6], PowerEvent::Delay(XCLR_MIN_DELAY_US * 1000));
    }

    #[test]
    fn test_failed_rail_unwinds() {
        let (mut resources, log) = mock_power();
        log.fail_rail("vdig");

        let err = resources.power_on().expect_err("power on should fail");
        assert_eq!(err, PowerError::Regulator("vdig".to_owned()));

        let events = log.events();
        assert_eq!(
            events,
            vec![
                PowerEvent::RailOn("vana1".to_owned()),
                PowerEvent::RailOn("vana2".to_owned()),
                PowerEvent::RailOff("vana2".to_owned()),
                PowerEvent::RailOff("vana1".to_owned()),
            ]
        );
    }

    #[test]
    fn test_failed_clock_disables_rails() {
        let (mut resources, log) = mock_power();
        log.fail_clock();

        assert_eq!(resources.power_on(), Err(PowerError::Clock));
        assert!(log.rails_on().is_empty());
        assert!(!log.events().contains(&PowerEvent::Reset(true)));
    }

    #[test]
    fn test_reference_counting() {
        let (resources, log) = mock_power();
        let mut manager = PowerManager::new(resources);

        assert!(manager.get_if_in_use().is_none());

        let first = manager.acquire().expect("acquire should succeed");
        let second = manager.acquire().expect("acquire should succeed");
        assert_eq!(log.power_ons(), 1);
        assert_eq!(manager.usage(), 2);

        let probe = manager.get_if_in_use().expect("power is in use");
        assert_eq!(manager.release(probe), PowerTransition::StillInUse);
        assert_eq!(manager.release(first), PowerTransition::StillInUse);
        assert!(manager.is_powered());
        assert_eq!(manager.release(second), PowerTransition::PoweredDown);
        assert!(!manager.is_powered());
        assert_eq!(log.power_offs(), 1);
    }

    #[test]
    fn test_failed_acquire_leaves_usage() {
        let (resources, log) = mock_power();
        log.fail_clock();
        let mut manager = PowerManager::new(resources);

        assert!(manager.acquire().is_err());
        assert_eq!(manager.usage(), 0);
        assert!(!manager.is_powered());
    }

    #[test]
    fn test_suspend_resume() {
        let (resources, log) = mock_power();
        let mut manager = PowerManager::new(resources);
        let token = manager.acquire().expect("acquire should succeed");

        assert!(manager.suspend());
        assert!(!manager.suspend());
        assert!(manager.get_if_in_use().is_none());

        manager.resume().expect("resume should succeed");
        assert!(manager.is_powered());
        assert_eq!(log.power_ons(), 2);
        assert_eq!(manager.release(token), PowerTransition::PoweredDown);
    }
}
