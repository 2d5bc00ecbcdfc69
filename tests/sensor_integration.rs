//! End-to-end bring-up scenarios against the mock register file.
//!
//! Each test attaches a sensor from a TOML board description, drives it
//! through the host-facing `SensorSubdev` operations and checks the
//! resulting register state with the readback validators.

use imx708_control::controls::ControlId;
use imx708_control::mock::{mock_power, MockBus, MockHandle, MockPower, PowerLog};
use imx708_control::validation::{
    validate_calibration_tables, validate_exposure, validate_frame_length, validate_orientation,
    validate_register_list,
};
use imx708_control::{
    BoardConfig, Format, FormatWhich, FourCC, HdrMode, Imx708, LinkFrequency, RegWidth,
    RegisterRead, SensorError, SensorSubdev,
};

const BOARD: &str = r#"
data_lanes = 2
link_frequencies = [450000000]
module_index = 0
module_facing = "back"
module_name = "rpi-camera-v3"
lens_name = "default"
"#;

type Sensor = Imx708<MockBus, MockPower>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bring_up() -> (Sensor, MockHandle, PowerLog) {
    init_logging();
    let board = BoardConfig::from_toml_str(BOARD).expect("Failed to parse board description");
    let bus = MockBus::new();
    let handle = bus.handle();
    let (power, log) = mock_power();
    let sensor = Imx708::attach(bus, power, &board).expect("Failed to attach sensor");
    (sensor, handle, log)
}

fn select_binned_1080p(sensor: &Sensor) -> Format {
    sensor
        .set_format(
            FormatWhich::Active,
            &Format::new(1920, 1080, FourCC::SRGGB10),
        )
        .expect("Failed to set format")
}

#[test]
fn test_stream_bring_up_programs_sensor() {
    let (sensor, _, _) = bring_up();
    let format = select_binned_1080p(&sensor);
    assert_eq!((format.width, format.height), (1920, 1080));

    sensor.set_stream(true).expect("Failed to start streaming");

    let status = sensor.status().expect("Failed to read status");
    assert!(status.streaming, "sensor should be streaming");
    assert!(status.calibrated, "calibration should be applied");
    assert_eq!(status.mode.hdr, HdrMode::Off);

    validate_calibration_tables(&sensor).expect("PDAF tables should be present");
    validate_register_list(&sensor, &LinkFrequency::Mhz450.registers())
        .expect("link frequency registers should be programmed");
    validate_frame_length(&sensor, 1080 + 1198).expect("frame length should match vblank");
    validate_exposure(&sensor, status.mode, 0x640).expect("exposure should be replayed");
    validate_orientation(&sensor, false, false).expect("orientation should be replayed");
}

#[test]
fn test_long_frame_uses_exposure_shift() {
    let (sensor, _, _) = bring_up();
    let format = select_binned_1080p(&sensor);
    sensor.set_stream(true).expect("Failed to start streaming");

    let vblank = 131_000 - format.height;
    let stored = sensor
        .set_control(ControlId::VerticalBlanking.cid(), i64::from(vblank))
        .expect("Failed to set vblank");
    assert_eq!(stored, i64::from(vblank));

    let exposure = sensor
        .control_info(ControlId::Exposure)
        .expect("exposure control should exist");
    assert_eq!(exposure.maximum, 131_000 - 48);

    sensor
        .set_control(ControlId::Exposure.cid(), 100_001)
        .expect("Failed to set exposure");

    let status = sensor.status().expect("Failed to read status");
    assert_eq!(status.long_exp_shift, 1);
    validate_frame_length(&sensor, 131_000).expect("frame length should be shifted");
    validate_exposure(&sensor, status.mode, 100_001).expect("exposure should be shifted");
}

#[test]
fn test_failed_start_with_host_power_keeps_calibration() {
    let (sensor, handle, _) = bring_up();
    sensor.set_power(true).expect("Failed to take power");

    // 0x0100 is also the first entry of the common list
    handle.fail_writes_at(0x0100);
    let err = sensor.set_stream(true).expect_err("stream on should fail");
    assert!(matches!(err, SensorError::RegisterList { list: "common", .. }));

    let status = sensor.status().expect("Failed to read status");
    assert!(!status.streaming);
    assert!(!status.calibrated, "common list did not complete");
    assert_eq!(status.power_usage, 1);

    handle.clear_failures();
    sensor.set_stream(true).expect("retry should succeed");
    sensor.set_stream(false).expect("Failed to stop streaming");

    let status = sensor.status().expect("Failed to read status");
    assert!(status.calibrated, "host power keeps the sensor calibrated");
    assert!(status.powered);

    sensor.set_power(false).expect("Failed to drop power");
    let status = sensor.status().expect("Failed to read status");
    assert!(!status.powered);
    assert!(!status.calibrated);
}

#[test]
fn test_flip_frozen_during_stream() {
    let (sensor, _, _) = bring_up();
    sensor
        .set_control(ControlId::VerticalFlip.cid(), 1)
        .expect("Failed to set vflip");
    sensor.set_stream(true).expect("Failed to start streaming");
    validate_orientation(&sensor, false, true).expect("vflip should be applied");

    let err = sensor
        .set_control(ControlId::HorizontalFlip.cid(), 1)
        .expect_err("flip must be rejected while streaming");
    assert!(err.is_invalid_request());
    validate_orientation(&sensor, false, true).expect("orientation must not change");

    sensor.set_stream(false).expect("Failed to stop streaming");
    sensor
        .set_control(ControlId::HorizontalFlip.cid(), 1)
        .expect("flip allowed after stream off");
}

#[test]
fn test_suspend_resume_cycle() {
    let (sensor, _, log) = bring_up();
    sensor.set_stream(true).expect("Failed to start streaming");

    sensor.suspend().expect("Failed to suspend");
    assert!(matches!(
        sensor.read_register(0x0100, RegWidth::Byte),
        Err(SensorError::NotPowered)
    ));

    sensor.resume().expect("Failed to resume");
    assert_eq!(sensor.read_register(0x0100, RegWidth::Byte).ok(), Some(1));
    validate_calibration_tables(&sensor).expect("PDAF tables should survive resume");

    sensor.detach();
    assert!(log.rails_on().is_empty(), "all rails should be off after detach");
}

#[test]
fn test_hdr_mode_round_trip() {
    let (sensor, _, _) = bring_up();
    select_binned_1080p(&sensor);

    sensor
        .set_hdr_mode(HdrMode::X3)
        .expect("Failed to select HDR variant");
    let config = sensor.hdr_config().expect("Failed to read HDR config");
    assert_eq!(config.mode, HdrMode::X3);
    assert_eq!(config.medium, config.long / 4);
    assert_eq!(config.short, config.long / 16);

    let active = sensor
        .format(FormatWhich::Active)
        .expect("Failed to read format");
    assert_eq!((active.width, active.height), (1920, 1080));

    sensor.set_stream(true).expect("Failed to start streaming");
    let status = sensor.status().expect("Failed to read status");
    validate_frame_length(&sensor, 1080 + status.mode.vblank_default)
        .expect("HDR frame length should be programmed");
}
