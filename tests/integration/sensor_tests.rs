//! Edge-latched sensors and the light sensor against the recording mock,
//! plus a polling loop that wires sensors to the alarm.

use firewatch::alarm::{Alarm, AlarmMode};
use firewatch::app::ports::{Edge, PinMode};
use firewatch::config::SystemConfig;
use firewatch::drivers::actuator::Actuator;
use firewatch::drivers::rgb_led::RgbPins;
use firewatch::sensors::flame::FlameDetector;
use firewatch::sensors::light::{LightLevel, LightSensor};
use firewatch::sensors::motion::MotionSensor;

use crate::mock_hw::{MockPlatform, MockTimer, PlatformCall as P};

const FLAME_D: u8 = 4;
const FLAME_A: u8 = 34;
const PIR: u8 = 13;
const LDR: u8 = 35;

#[test]
fn flame_detector_rearm_sequence() {
    let hw = MockPlatform::new();
    let mut flame = FlameDetector::new(hw.clone(), FLAME_D, FLAME_A);
    flame.enable_detection();
    assert_eq!(
        hw.take_calls(),
        vec![
            P::PinMode(FLAME_A, PinMode::Input),
            P::PinMode(FLAME_D, PinMode::Input),
            P::DetachIrq(FLAME_D),
            P::AttachIrq(FLAME_D, Edge::Rising),
        ]
    );

    // Nothing latched: polling is side-effect free.
    assert!(!flame.is_flame_detected());
    assert!(!flame.is_flame_ended());
    assert!(hw.take_calls().is_empty());

    assert!(hw.trigger(FLAME_D));
    assert!(flame.is_flame_detected());
    assert_eq!(hw.take_calls(), vec![P::AttachIrq(FLAME_D, Edge::Falling)]);
    assert!(!flame.is_flame_detected());

    assert!(hw.trigger(FLAME_D));
    assert!(flame.is_flame_ended());
    assert_eq!(hw.take_calls(), vec![P::AttachIrq(FLAME_D, Edge::Rising)]);
    assert!(!flame.is_flame_ended());
}

#[test]
fn flame_intensity_is_raw_analog() {
    let hw = MockPlatform::new();
    let flame = FlameDetector::new(hw.clone(), FLAME_D, FLAME_A);
    hw.set_analog(FLAME_A, 3071);
    assert_eq!(flame.flame_intensity(), 3071);
}

#[test]
fn motion_disable_detaches() {
    let hw = MockPlatform::new();
    let mut pir = MotionSensor::new(hw.clone(), PIR);
    pir.enable_detection();
    hw.trigger(PIR);
    pir.disable_detection();

    assert_eq!(hw.armed(PIR), None);
    assert!(!pir.is_motion_detected());
    assert_eq!(hw.calls().last(), Some(&P::DetachIrq(PIR)));
}

#[test]
fn light_sensor_bands_follow_config() {
    let hw = MockPlatform::new();
    let cfg = SystemConfig::default();
    let ldr = LightSensor::new(hw.clone(), LDR, cfg.light);

    for (raw, level) in [
        (0, LightLevel::Dark),
        (1000, LightLevel::Dark),
        (1001, LightLevel::LowLight),
        (2000, LightLevel::LowLight),
        (2001, LightLevel::NormalLight),
        (4000, LightLevel::NormalLight),
        (4001, LightLevel::HighLight),
    ] {
        hw.set_analog(LDR, raw);
        assert_eq!(ldr.light_value(), raw);
        assert_eq!(ldr.light_level(), level, "raw {raw}");
    }
}

/// The foreground loop an application would run: poll each latch once
/// and drive the arbiter.
fn poll_once(
    flame: &mut FlameDetector<MockPlatform>,
    pir: &mut MotionSensor<MockPlatform>,
    alarm: &mut Alarm<MockTimer, MockPlatform>,
) {
    if flame.is_flame_detected() {
        alarm.activate_flame_alarm();
    }
    if flame.is_flame_ended() {
        alarm.deactivate_flame_alarm();
    }
    if pir.is_motion_detected() {
        alarm.activate_motion_alarm();
    }
    if pir.is_motion_ended() {
        alarm.deactivate_motion_alarm();
    }
}

#[test]
fn polling_loop_drives_alarm_modes() {
    let hw = MockPlatform::new();
    let timer = MockTimer::new();
    let cfg = SystemConfig::default();
    let actuator = Actuator::new(&hw, 25, RgbPins { red: 26, green: 27, blue: 14 }, &cfg);
    let mut alarm = Alarm::new(timer.clone(), actuator, &cfg.alarm);
    let mut flame = FlameDetector::new(hw.clone(), FLAME_D, FLAME_A);
    let mut pir = MotionSensor::new(hw.clone(), PIR);
    flame.enable_detection();
    pir.enable_detection();

    hw.trigger(PIR);
    poll_once(&mut flame, &mut pir, &mut alarm);
    assert_eq!(alarm.mode(), AlarmMode::Motion);

    hw.trigger(FLAME_D);
    poll_once(&mut flame, &mut pir, &mut alarm);
    assert_eq!(alarm.mode(), AlarmMode::Flame);

    // Motion ends while flame runs: ignored.
    hw.trigger(PIR);
    poll_once(&mut flame, &mut pir, &mut alarm);
    assert_eq!(alarm.mode(), AlarmMode::Flame);

    hw.trigger(FLAME_D);
    poll_once(&mut flame, &mut pir, &mut alarm);
    assert_eq!(alarm.mode(), AlarmMode::Idle);
    assert!(!timer.tick());
}
