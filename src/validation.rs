//! Register readback validation for bring-up and integration testing.
//!
//! These helpers read registers through [`RegisterRead`] and compare them
//! with what the programming model says should be there. They are useful
//! against the mock register file as well as on a live sensor.

use crate::controls::{REG_EXPOSURE, REG_FRAME_LENGTH, REG_LONG_EXP_SHIFT, REG_ORIENTATION};
use crate::error::{Result, SensorError};
use crate::framing::{exposure_register, FrameLength};
use crate::modes::ModeDescriptor;
use crate::sequencer::{
    calibration_table, RegisterList, PDAF_GAINS, REG_BASE_SPC_GAINS_L, REG_BASE_SPC_GAINS_R,
};
use crate::traits::{RegWidth, RegisterRead};

fn expect_register<S: RegisterRead>(
    sensor: &S,
    address: u16,
    width: RegWidth,
    expected: u32,
) -> Result<()> {
    let found = sensor.read_register(address, width)?;
    if found != expected {
        return Err(SensorError::Mismatch {
            address,
            expected,
            found,
        });
    }
    Ok(())
}

/// Validates that every entry of a register list holds its listed value.
///
/// Registers written more than once are checked against their last value.
///
/// # Errors
///
/// Returns `Mismatch` for the first register that differs, or the read
/// error if the sensor is not powered.
pub fn validate_register_list<S: RegisterRead>(sensor: &S, list: &RegisterList<'_>) -> Result<()> {
    for (index, entry) in list.regs.iter().enumerate() {
        let overwritten = list
            .regs
            .iter()
            .skip(index + 1)
            .any(|later| later.address == entry.address);
        if overwritten {
            continue;
        }
        expect_register(sensor, entry.address, RegWidth::Byte, u32::from(entry.value))?;
    }
    Ok(())
}

/// Validates that both PDAF gain tables are present.
///
/// # Errors
///
/// Returns `Mismatch` for the first table entry that differs.
pub fn validate_calibration_tables<S: RegisterRead>(sensor: &S) -> Result<()> {
    let [left, right] = &PDAF_GAINS;
    for (base, pattern) in [(REG_BASE_SPC_GAINS_L, left), (REG_BASE_SPC_GAINS_R, right)] {
        let table = calibration_table(base, pattern);
        validate_register_list(sensor, &RegisterList::new("pdaf gains", &table))?;
    }
    Ok(())
}

/// Validates the frame-length and long-exposure shift registers.
///
/// # Arguments
///
/// * `sensor` - Powered sensor to read from
/// * `total_lines` - Frame length in lines, `height + vblank`
///
/// # Errors
///
/// Returns `Mismatch` if either register differs from the encoding of
/// `total_lines`.
pub fn validate_frame_length<S: RegisterRead>(sensor: &S, total_lines: u32) -> Result<()> {
    let encoded = FrameLength::encode(total_lines);
    expect_register(
        sensor,
        REG_FRAME_LENGTH,
        RegWidth::Word,
        u32::from(encoded.lines),
    )?;
    expect_register(
        sensor,
        REG_LONG_EXP_SHIFT,
        RegWidth::Byte,
        u32::from(encoded.shift),
    )
}

/// Validates the exposure register for a requested exposure in lines.
///
/// The expected value is scaled by the shift currently programmed on the
/// sensor.
pub fn validate_exposure<S: RegisterRead>(
    sensor: &S,
    mode: &ModeDescriptor,
    lines: u32,
) -> Result<()> {
    let shift = sensor.read_register(REG_LONG_EXP_SHIFT, RegWidth::Byte)?;
    let shift = u8::try_from(shift).unwrap_or(u8::MAX);
    expect_register(
        sensor,
        REG_EXPOSURE,
        RegWidth::Word,
        exposure_register(mode, lines, shift),
    )
}

/// Validates the flip register.
pub fn validate_orientation<S: RegisterRead>(sensor: &S, hflip: bool, vflip: bool) -> Result<()> {
    let expected = u32::from(hflip) | (u32::from(vflip) << 1);
    expect_register(sensor, REG_ORIENTATION, RegWidth::Byte, expected)
}
