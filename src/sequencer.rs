//! Ordered register-list application and the post-power-on calibration patch.

use log::{debug, error};

use crate::error::{Result, SensorError};
use crate::power::PowerToken;
use crate::traits::{RegWidth, RegisterBus};

/// A single 8-bit register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    /// Register address.
    pub address: u16,
    /// Value written.
    pub value: u8,
}

/// Shorthand for table construction.
pub(crate) const fn reg(address: u16, value: u8) -> Register {
    Register { address, value }
}

/// A named, ordered list of register writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterList<'a> {
    /// Name used in diagnostics.
    pub name: &'static str,
    /// Writes in application order.
    pub regs: &'a [Register],
}

impl<'a> RegisterList<'a> {
    /// Create a named list.
    pub const fn new(name: &'static str, regs: &'a [Register]) -> Self {
        Self { name, regs }
    }
}

/// Register holding the calibration sentinel, also the first left-table entry.
pub const REG_BASE_SPC_GAINS_L: u16 = 0x7b10;
/// First right-table entry.
pub const REG_BASE_SPC_GAINS_R: u16 = 0x7c00;
/// Sentinel value present until the gain tables have been written.
pub const SPC_SENTINEL: u32 = 0x40;
/// Entries per gain table.
pub const SPC_TABLE_LEN: usize = 54;

/// PDAF pixel correction gain patterns, one per table.
pub const PDAF_GAINS: [[u8; 9]; 2] = [
    [0x4c, 0x4c, 0x4c, 0x46, 0x3e, 0x38, 0x35, 0x35, 0x35],
    [0x35, 0x35, 0x35, 0x38, 0x3e, 0x46, 0x4c, 0x4c, 0x4c],
];

/// Result of [`RegisterIo::apply_calibration_patch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// Both gain tables were written.
    Applied,
    /// The sentinel did not match; nothing was written.
    Skipped,
}

/// Build one gain table by cycling a pattern from a base address.
pub fn calibration_table(base: u16, pattern: &[u8; 9]) -> Vec<Register> {
    pattern
        .iter()
        .cycle()
        .take(SPC_TABLE_LEN)
        .zip(base..)
        .map(|(&value, address)| reg(address, value))
        .collect()
}

/// Register access on a powered sensor.
///
/// Construction requires a [`PowerToken`], so register traffic cannot be
/// issued while the sensor is powered down.
pub struct RegisterIo<'a, B> {
    bus: &'a mut B,
    _power: &'a PowerToken,
}

impl<'a, B: RegisterBus> RegisterIo<'a, B> {
    /// Bind a bus to proof that power is in use.
    pub fn new(bus: &'a mut B, power: &'a PowerToken) -> Self {
        Self { bus, _power: power }
    }

    /// Read a register.
    pub fn read(&mut self, address: u16, width: RegWidth) -> Result<u32> {
        self.bus
            .read(address, width)
            .map_err(|kind| SensorError::Io { address, kind })
    }

    /// Write a register.
    pub fn write(&mut self, address: u16, width: RegWidth, value: u32) -> Result<()> {
        self.bus
            .write(address, width, value)
            .map_err(|kind| SensorError::Io { address, kind })
    }

    /// Write every entry of `list` in order, stopping at the first failure.
    ///
    /// Entries before the failing one stay applied.
    pub fn apply_register_list(&mut self, list: &RegisterList<'_>) -> Result<()> {
        for entry in list.regs {
            if let Err(kind) = self
                .bus
                .write(entry.address, RegWidth::Byte, u32::from(entry.value))
            {
                error!(
                    "Failed to write reg {:#06x} of {}: {kind}",
                    entry.address, list.name
                );
                return Err(SensorError::RegisterList {
                    list: list.name,
                    address: entry.address,
                    kind,
                });
            }
        }
        debug!("applied {} ({} writes)", list.name, list.regs.len());
        Ok(())
    }

    /// Write the PDAF gain tables if the sentinel shows they are missing.
    pub fn apply_calibration_patch(&mut self) -> Result<CalibrationOutcome> {
        let sentinel = self.read(REG_BASE_SPC_GAINS_L, RegWidth::Byte)?;
        if sentinel != SPC_SENTINEL {
            debug!("PDAF gains already present (sentinel {sentinel:#04x})");
            return Ok(CalibrationOutcome::Skipped);
        }

        let [left, right] = &PDAF_GAINS;
        let left = calibration_table(REG_BASE_SPC_GAINS_L, left);
        let right = calibration_table(REG_BASE_SPC_GAINS_R, right);
        self.apply_register_list(&RegisterList::new("pdaf gains left", &left))?;
        self.apply_register_list(&RegisterList::new("pdaf gains right", &right))?;

        Ok(CalibrationOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;
    use embedded_hal::i2c::ErrorKind;

    const LIST: &[Register] = &[reg(0x0100, 0x00), reg(0x0136, 0x18), reg(0x0137, 0x00)];

    #[test]
    fn test_apply_register_list_in_order() {
        let mut bus = MockBus::new();
        let handle = bus.handle();
        let token = PowerToken::for_tests();
        let mut io = RegisterIo::new(&mut bus, &token);

        io.apply_register_list(&RegisterList::new("test", LIST))
            .expect("apply should succeed");

        let addresses: Vec<u16> = handle.writes().iter().map(|w| w.address).collect();
        assert_eq!(addresses, vec![0x0100, 0x0136, 0x0137]);
        assert_eq!(handle.register(0x0136), 0x18);
    }

    #[test]
    fn test_apply_register_list_stops_at_failure() {
        let mut bus = MockBus::new();
        let handle = bus.handle();
        handle.fail_writes_at(0x0136);
        let token = PowerToken::for_tests();
        let mut io = RegisterIo::new(&mut bus, &token);

        let err = io
            .apply_register_list(&RegisterList::new("test", LIST))
            .expect_err("apply should fail");

        assert!(matches!(
            err,
            SensorError::RegisterList {
                list: "test",
                address: 0x0136,
                kind: ErrorKind::Bus,
            }
        ));
        // the first write landed, the third was never attempted
        assert_eq!(handle.writes().len(), 1);
    }

    #[test]
    fn test_calibration_table_cycles_pattern() {
        let table = calibration_table(REG_BASE_SPC_GAINS_R, &PDAF_GAINS[1]);
        assert_eq!(table.len(), SPC_TABLE_LEN);
        assert_eq!(table[0], reg(0x7c00, 0x35));
        assert_eq!(table[9], reg(0x7c09, 0x35));
        assert_eq!(table[53], reg(0x7c35, 0x4c));
    }

    #[test]
    fn test_calibration_patch_applied_on_sentinel() {
        let mut bus = MockBus::new();
        let handle = bus.handle();
        let token = PowerToken::for_tests();
        let mut io = RegisterIo::new(&mut bus, &token);

        let outcome = io.apply_calibration_patch().expect("patch should succeed");

        assert_eq!(outcome, CalibrationOutcome::Applied);
        assert_eq!(handle.writes().len(), 2 * SPC_TABLE_LEN);
        assert_eq!(handle.register(0x7b10), 0x4c);
        assert_eq!(handle.register(0x7b13), 0x46);
        assert_eq!(handle.register(0x7c03), 0x38);
    }

    #[test]
    fn test_calibration_patch_skipped_without_sentinel() {
        let mut bus = MockBus::new();
        let handle = bus.handle();
        handle.set_register(REG_BASE_SPC_GAINS_L, 0x4c);
        let token = PowerToken::for_tests();
        let mut io = RegisterIo::new(&mut bus, &token);

        let outcome = io.apply_calibration_patch().expect("patch should succeed");

        assert_eq!(outcome, CalibrationOutcome::Skipped);
        assert!(handle.writes().is_empty());
    }

    #[test]
    fn test_calibration_patch_propagates_read_failure() {
        let mut bus = MockBus::new();
        let handle = bus.handle();
        handle.fail_reads(true);
        let token = PowerToken::for_tests();
        let mut io = RegisterIo::new(&mut bus, &token);

        let err = io.apply_calibration_patch().expect_err("patch should fail");
        assert!(matches!(err, SensorError::Io { address: 0x7b10, .. }));
    }
}
