//! Compiled-in register tables.
//!
//! Values are 8-bit writes applied in list order. Multi-byte registers are
//! split high byte first.

use crate::framing::HDR_EXPOSURE_RATIO;
use crate::sequencer::{reg, Register};

/// Sensor-wide defaults written once per power cycle.
pub(crate) const MODE_COMMON_REGS: &[Register] = &[
    reg(0x0100, 0x00),
    reg(0x0136, 0x18),
    reg(0x0137, 0x00),
    reg(0x33F0, 0x02),
    reg(0x33F1, 0x05),
    reg(0x3062, 0x00),
    reg(0x3063, 0x12),
    reg(0x3068, 0x00),
    reg(0x3069, 0x12),
    reg(0x306A, 0x00),
    reg(0x306B, 0x30),
    reg(0x3076, 0x00),
    reg(0x3077, 0x30),
    reg(0x3078, 0x00),
    reg(0x3079, 0x30),
    reg(0x5E54, 0x0C),
    reg(0x6E44, 0x00),
    reg(0xB0B6, 0x01),
    reg(0xE829, 0x00),
    reg(0xF001, 0x08),
    reg(0xF003, 0x08),
    reg(0xF00D, 0x10),
    reg(0xF00F, 0x10),
    reg(0xF031, 0x08),
    reg(0xF033, 0x08),
    reg(0xF03D, 0x10),
    reg(0xF03F, 0x10),
    reg(0x0112, 0x0A),
    reg(0x0113, 0x0A),
    reg(0x0114, 0x01),
    reg(0x0B8E, 0x01),
    reg(0x0B8F, 0x00),
    reg(0x0B94, 0x01),
    reg(0x0B95, 0x00),
    reg(0x3400, 0x01),
    reg(0x3478, 0x01),
    reg(0x3479, 0x1C),
    reg(0x3091, 0x01),
    reg(0x3092, 0x00),
    reg(0x3419, 0x00),
    reg(0xBCF1, 0x02),
    reg(0x3094, 0x01),
    reg(0x3095, 0x01),
    reg(0x3362, 0x00),
    reg(0x3363, 0x00),
    reg(0x3364, 0x00),
    reg(0x3365, 0x00),
    reg(0x0138, 0x01),
];

/// Full-resolution 10-bit readout.
pub(crate) const MODE_4608X2592_REGS: &[Register] = &[
    reg(0x0342, 0x3D),
    reg(0x0343, 0x20),
    reg(0x0340, 0x0A),
    reg(0x0341, 0x59),
    reg(0x0344, 0x00),
    reg(0x0345, 0x00),
    reg(0x0346, 0x00),
    reg(0x0347, 0x00),
    reg(0x0348, 0x11),
    reg(0x0349, 0xFF),
    reg(0x034A, 0x0A),
    reg(0x034B, 0x1F),
    reg(0x0220, 0x62),
    reg(0x0222, 0x01),
    reg(0x0900, 0x00),
    reg(0x0901, 0x11),
    reg(0x0902, 0x0A),
    reg(0x3200, 0x01),
    reg(0x3201, 0x01),
    reg(0x32D5, 0x01),
    reg(0x32D6, 0x00),
    reg(0x32DB, 0x01),
    reg(0x32DF, 0x00),
    reg(0x350C, 0x00),
    reg(0x350D, 0x00),
    reg(0x0408, 0x00),
    reg(0x0409, 0x00),
    reg(0x040A, 0x00),
    reg(0x040B, 0x00),
    reg(0x040C, 0x12),
    reg(0x040D, 0x00),
    reg(0x040E, 0x0A),
    reg(0x040F, 0x20),
    reg(0x034C, 0x12),
    reg(0x034D, 0x00),
    reg(0x034E, 0x0A),
    reg(0x034F, 0x20),
    reg(0x0301, 0x05),
    reg(0x0303, 0x02),
    reg(0x0305, 0x02),
    reg(0x0306, 0x00),
    reg(0x0307, 0x7C),
    reg(0x030B, 0x02),
    reg(0x030D, 0x04),
    reg(0x0310, 0x01),
    reg(0x3CA0, 0x00),
    reg(0x3CA1, 0x64),
    reg(0x3CA4, 0x00),
    reg(0x3CA5, 0x00),
    reg(0x3CA6, 0x00),
    reg(0x3CA7, 0x00),
    reg(0x3CAA, 0x00),
    reg(0x3CAB, 0x00),
    reg(0x3CB8, 0x00),
    reg(0x3CB9, 0x08),
    reg(0x3CBA, 0x00),
    reg(0x3CBB, 0x00),
    reg(0x3CBC, 0x00),
    reg(0x3CBD, 0x3C),
    reg(0x3CBE, 0x00),
    reg(0x3CBF, 0x00),
    reg(0x0202, 0x0A),
    reg(0x0203, 0x29),
    reg(0x0224, 0x01),
    reg(0x0225, 0xF4),
    reg(0x3116, 0x01),
    reg(0x3117, 0xF4),
    reg(0x0204, 0x00),
    reg(0x0205, 0x00),
    reg(0x0216, 0x00),
    reg(0x0217, 0x00),
    reg(0x0218, 0x01),
    reg(0x0219, 0x00),
    reg(0x020E, 0x01),
    reg(0x020F, 0x00),
    reg(0x3118, 0x00),
    reg(0x3119, 0x00),
    reg(0x311A, 0x01),
    reg(0x311B, 0x00),
    reg(0x341A, 0x00),
    reg(0x341B, 0x00),
    reg(0x341C, 0x00),
    reg(0x341D, 0x00),
    reg(0x341E, 0x01),
    reg(0x341F, 0x20),
    reg(0x3420, 0x00),
    reg(0x3421, 0xD8),
    reg(0xC428, 0x00),
    reg(0xC429, 0x04),
    reg(0x3366, 0x00),
    reg(0x3367, 0x00),
    reg(0x3368, 0x00),
    reg(0x3369, 0x00),
];

/// 2x2 binned 1920x1080.
pub(crate) const MODE_2X2_BINNED_REGS: &[Register] = &[
    reg(0x0342, 0x1E),
    reg(0x0343, 0x90),
    reg(0x0340, 0x05),
    reg(0x0341, 0x38),
    reg(0x0344, 0x00),
    reg(0x0345, 0x00),
    reg(0x0346, 0x00),
    reg(0x0347, 0x00),
    reg(0x0348, 0x11),
    reg(0x0349, 0xFF),
    reg(0x034A, 0x0A),
    reg(0x034B, 0x1F),
    reg(0x0220, 0x62),
    reg(0x0222, 0x01),
    reg(0x0900, 0x01),
    reg(0x0901, 0x22),
    reg(0x0902, 0x08),
    reg(0x3200, 0x41),
    reg(0x3201, 0x41),
    reg(0x32D5, 0x00),
    reg(0x32D6, 0x00),
    reg(0x32DB, 0x01),
    reg(0x32DF, 0x00),
    reg(0x350C, 0x00),
    reg(0x350D, 0x00),
    reg(0x0408, 0x00),
    reg(0x0409, 0x00),
    reg(0x040A, 0x00),
    reg(0x040B, 0x00),
    reg(0x040C, 0x09),
    reg(0x040D, 0x00),
    reg(0x040E, 0x05),
    reg(0x040F, 0x10),
    reg(0x034C, 0x09),
    reg(0x034D, 0x00),
    reg(0x034E, 0x05),
    reg(0x034F, 0x10),
    reg(0x0301, 0x05),
    reg(0x0303, 0x02),
    reg(0x0305, 0x02),
    reg(0x0306, 0x00),
    reg(0x0307, 0x7A),
    reg(0x030B, 0x02),
    reg(0x030D, 0x04),
    reg(0x0310, 0x01),
    reg(0x3CA0, 0x00),
    reg(0x3CA1, 0x3C),
    reg(0x3CA4, 0x00),
    reg(0x3CA5, 0x3C),
    reg(0x3CA6, 0x00),
    reg(0x3CA7, 0x00),
    reg(0x3CAA, 0x00),
    reg(0x3CAB, 0x00),
    reg(0x3CB8, 0x00),
    reg(0x3CB9, 0x1C),
    reg(0x3CBA, 0x00),
    reg(0x3CBB, 0x08),
    reg(0x3CBC, 0x00),
    reg(0x3CBD, 0x1E),
    reg(0x3CBE, 0x00),
    reg(0x3CBF, 0x0A),
    reg(0x0202, 0x05),
    reg(0x0203, 0x08),
    reg(0x0224, 0x01),
    reg(0x0225, 0xF4),
    reg(0x3116, 0x01),
    reg(0x3117, 0xF4),
    reg(0x0204, 0x00),
    reg(0x0205, 0x70),
    reg(0x0216, 0x00),
    reg(0x0217, 0x70),
    reg(0x0218, 0x01),
    reg(0x0219, 0x00),
    reg(0x020E, 0x01),
    reg(0x020F, 0x00),
    reg(0x3118, 0x00),
    reg(0x3119, 0x70),
    reg(0x311A, 0x01),
    reg(0x311B, 0x00),
    reg(0x341A, 0x00),
    reg(0x341B, 0x00),
    reg(0x341C, 0x00),
    reg(0x341D, 0x00),
    reg(0x341E, 0x00),
    reg(0x341F, 0x90),
    reg(0x3420, 0x00),
    reg(0x3421, 0x6C),
    reg(0x3366, 0x07),
    reg(0x3367, 0x80),
    reg(0x3368, 0x04),
    reg(0x3369, 0x38),
];

/// 2x2 binned and cropped 1536x864.
pub(crate) const MODE_2X2_BINNED_720P_REGS: &[Register] = &[
    reg(0x0342, 0x14),
    reg(0x0343, 0x60),
    reg(0x0340, 0x04),
    reg(0x0341, 0xB6),
    reg(0x0344, 0x03),
    reg(0x0345, 0x00),
    reg(0x0346, 0x01),
    reg(0x0347, 0xB0),
    reg(0x0348, 0x0E),
    reg(0x0349, 0xFF),
    reg(0x034A, 0x08),
    reg(0x034B, 0x6F),
    reg(0x0220, 0x62),
    reg(0x0222, 0x01),
    reg(0x0900, 0x01),
    reg(0x0901, 0x22),
    reg(0x0902, 0x08),
    reg(0x3200, 0x41),
    reg(0x3201, 0x41),
    reg(0x32D5, 0x00),
    reg(0x32D6, 0x00),
    reg(0x32DB, 0x01),
    reg(0x32DF, 0x01),
    reg(0x350C, 0x00),
    reg(0x350D, 0x00),
    reg(0x0408, 0x00),
    reg(0x0409, 0x00),
    reg(0x040A, 0x00),
    reg(0x040B, 0x00),
    reg(0x040C, 0x06),
    reg(0x040D, 0x00),
    reg(0x040E, 0x03),
    reg(0x040F, 0x60),
    reg(0x034C, 0x06),
    reg(0x034D, 0x00),
    reg(0x034E, 0x03),
    reg(0x034F, 0x60),
    reg(0x0301, 0x05),
    reg(0x0303, 0x02),
    reg(0x0305, 0x02),
    reg(0x0306, 0x00),
    reg(0x0307, 0x76),
    reg(0x030B, 0x02),
    reg(0x030D, 0x04),
    reg(0x0310, 0x01),
    reg(0x3CA0, 0x00),
    reg(0x3CA1, 0x3C),
    reg(0x3CA4, 0x01),
    reg(0x3CA5, 0x5E),
    reg(0x3CA6, 0x00),
    reg(0x3CA7, 0x00),
    reg(0x3CAA, 0x00),
    reg(0x3CAB, 0x00),
    reg(0x3CB8, 0x00),
    reg(0x3CB9, 0x0C),
    reg(0x3CBA, 0x00),
    reg(0x3CBB, 0x04),
    reg(0x3CBC, 0x00),
    reg(0x3CBD, 0x1E),
    reg(0x3CBE, 0x00),
    reg(0x3CBF, 0x05),
    reg(0x0202, 0x04),
    reg(0x0203, 0x86),
    reg(0x0224, 0x01),
    reg(0x0225, 0xF4),
    reg(0x3116, 0x01),
    reg(0x3117, 0xF4),
    reg(0x0204, 0x00),
    reg(0x0205, 0x70),
    reg(0x0216, 0x00),
    reg(0x0217, 0x70),
    reg(0x0218, 0x01),
    reg(0x0219, 0x00),
    reg(0x020E, 0x01),
    reg(0x020F, 0x00),
    reg(0x3118, 0x00),
    reg(0x3119, 0x70),
    reg(0x311A, 0x01),
    reg(0x311B, 0x00),
    reg(0x341A, 0x00),
    reg(0x341B, 0x00),
    reg(0x341C, 0x00),
    reg(0x341D, 0x00),
    reg(0x341E, 0x00),
    reg(0x341F, 0x60),
    reg(0x3420, 0x00),
    reg(0x3421, 0x48),
    reg(0x3366, 0x00),
    reg(0x3367, 0x00),
    reg(0x3368, 0x00),
    reg(0x3369, 0x00),
];

/// Three-exposure HDR, 2x2 downscaled to 1920x1080.
pub(crate) const MODE_HDR_REGS: &[Register] = &[
    reg(0x0342, 0x14),
    reg(0x0343, 0x60),
    reg(0x0340, 0x0A),
    reg(0x0341, 0x5B),
    reg(0x0344, 0x00),
    reg(0x0345, 0x00),
    reg(0x0346, 0x00),
    reg(0x0347, 0x00),
    reg(0x0348, 0x11),
    reg(0x0349, 0xFF),
    reg(0x034A, 0x0A),
    reg(0x034B, 0x1F),
    reg(0x0220, 0x01),
    reg(0x0222, HDR_EXPOSURE_RATIO),
    reg(0x0900, 0x00),
    reg(0x0901, 0x11),
    reg(0x0902, 0x0A),
    reg(0x3200, 0x01),
    reg(0x3201, 0x01),
    reg(0x32D5, 0x00),
    reg(0x32D6, 0x00),
    reg(0x32DB, 0x01),
    reg(0x32DF, 0x00),
    reg(0x350C, 0x00),
    reg(0x350D, 0x00),
    reg(0x0408, 0x00),
    reg(0x0409, 0x00),
    reg(0x040A, 0x00),
    reg(0x040B, 0x00),
    reg(0x040C, 0x09),
    reg(0x040D, 0x00),
    reg(0x040E, 0x05),
    reg(0x040F, 0x10),
    reg(0x034C, 0x09),
    reg(0x034D, 0x00),
    reg(0x034E, 0x05),
    reg(0x034F, 0x10),
    reg(0x0301, 0x05),
    reg(0x0303, 0x02),
    reg(0x0305, 0x02),
    reg(0x0306, 0x00),
    reg(0x0307, 0xA2),
    reg(0x030B, 0x02),
    reg(0x030D, 0x04),
    reg(0x0310, 0x01),
    reg(0x3CA0, 0x00),
    reg(0x3CA1, 0x00),
    reg(0x3CA4, 0x00),
    reg(0x3CA5, 0x00),
    reg(0x3CA6, 0x00),
    reg(0x3CA7, 0x28),
    reg(0x3CAA, 0x00),
    reg(0x3CAB, 0x00),
    reg(0x3CB8, 0x00),
    reg(0x3CB9, 0x30),
    reg(0x3CBA, 0x00),
    reg(0x3CBB, 0x00),
    reg(0x3CBC, 0x00),
    reg(0x3CBD, 0x32),
    reg(0x3CBE, 0x00),
    reg(0x3CBF, 0x00),
    reg(0x0202, 0x0A),
    reg(0x0203, 0x2B),
    reg(0x0224, 0x0A),
    reg(0x0225, 0x2B),
    reg(0x3116, 0x0A),
    reg(0x3117, 0x2B),
    reg(0x0204, 0x00),
    reg(0x0205, 0x00),
    reg(0x0216, 0x00),
    reg(0x0217, 0x00),
    reg(0x0218, 0x01),
    reg(0x0219, 0x00),
    reg(0x020E, 0x01),
    reg(0x020F, 0x00),
    reg(0x3118, 0x00),
    reg(0x3119, 0x00),
    reg(0x311A, 0x01),
    reg(0x311B, 0x00),
    reg(0x341A, 0x00),
    reg(0x341B, 0x00),
    reg(0x341C, 0x00),
    reg(0x341D, 0x00),
    reg(0x341E, 0x00),
    reg(0x341F, 0x90),
    reg(0x3420, 0x00),
    reg(0x3421, 0x6C),
    reg(0x3360, 0x01),
    reg(0x3361, 0x01),
    reg(0x3366, 0x07),
    reg(0x3367, 0x80),
    reg(0x3368, 0x04),
    reg(0x3369, 0x38),
];

pub(crate) const LINK_450MHZ_REGS: &[Register] = &[
    reg(0x030E, 0x01),
    reg(0x030F, 0x2C),
];

pub(crate) const LINK_447MHZ_REGS: &[Register] = &[
    reg(0x030E, 0x01),
    reg(0x030F, 0x2A),
];

pub(crate) const LINK_453MHZ_REGS: &[Register] = &[
    reg(0x030E, 0x01),
    reg(0x030F, 0x2E),
];
