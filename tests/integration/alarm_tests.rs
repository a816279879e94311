//! Alarm arbiter against the recording mock: exact peripheral call
//! sequences for every transition.

use firewatch::alarm::{Alarm, AlarmMode};
use firewatch::app::ports::Pin;
use firewatch::config::{BoardProfile, SystemConfig};
use firewatch::drivers::actuator::Actuator;
use firewatch::drivers::rgb_led::{RgbPins, COLOUR_BLUE, COLOUR_RED};

use crate::mock_hw::{MockPlatform, MockTimer, PlatformCall as P, TimerCall as T};

const BUZZER: Pin = 25;
const RGB: RgbPins = RgbPins { red: 26, green: 27, blue: 14 };

fn rgb(r: u16, g: u16, b: u16) -> Vec<P> {
    vec![P::Duty(RGB.red, r), P::Duty(RGB.green, g), P::Duty(RGB.blue, b)]
}

fn setup(board: BoardProfile) -> (MockPlatform, MockTimer, Alarm<MockTimer, MockPlatform>) {
    let hw = MockPlatform::new();
    let timer = MockTimer::new();
    let cfg = SystemConfig::for_board(board);
    let actuator = Actuator::new(&hw, BUZZER, RGB, &cfg);
    let alarm = Alarm::new(timer.clone(), actuator, &cfg.alarm);
    hw.take_calls();
    (hw, timer, alarm)
}

#[test]
fn actuator_construction_configures_pins() {
    let hw = MockPlatform::new();
    let cfg = SystemConfig::default();
    let _actuator = Actuator::new(&hw, BUZZER, RGB, &cfg);
    assert_eq!(
        hw.calls(),
        vec![
            P::PinMode(BUZZER, firewatch::app::ports::PinMode::Output),
            P::AttachPwm { pin: RGB.red, freq_hz: 12_000, bits: 8 },
            P::AttachPwm { pin: RGB.green, freq_hz: 12_000, bits: 8 },
            P::AttachPwm { pin: RGB.blue, freq_hz: 12_000, bits: 8 },
        ]
    );
}

#[test]
fn construction_touches_no_timer() {
    let (hw, timer, alarm) = setup(BoardProfile::Esp32);
    assert_eq!(alarm.mode(), AlarmMode::Idle);
    assert!(timer.calls().is_empty());
    assert!(hw.calls().is_empty());
}

#[test]
fn flame_activation_sequence() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    assert!(alarm.activate_flame_alarm());

    let mut expected = rgb(0, 0, 0); // colour stored while off
    expected.push(P::StopTone(BUZZER)); // frequency stored while off
    expected.extend(rgb(255, 0, 0));
    expected.push(P::Tone { pin: BUZZER, hz: 1000, ms: 0 });
    assert_eq!(hw.take_calls(), expected);

    assert_eq!(
        timer.take_calls(),
        vec![T::Begin(1_000_000), T::Attach, T::SetAlarm { ticks: 250_000, repeat: true }]
    );
}

#[test]
fn flame_tick_sequence() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_flame_alarm();
    hw.take_calls();

    assert!(timer.tick());
    let mut expected = vec![P::Tone { pin: BUZZER, hz: 500, ms: 0 }];
    expected.extend(rgb(0, 0, 255));
    assert_eq!(hw.take_calls(), expected);

    assert!(timer.tick());
    let mut expected = vec![P::Tone { pin: BUZZER, hz: 1000, ms: 0 }];
    expected.extend(rgb(255, 0, 0));
    assert_eq!(hw.take_calls(), expected);
}

#[test]
fn flame_pattern_has_period_two_over_many_ticks() {
    let (_, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_flame_alarm();
    for n in 1..=20 {
        timer.tick();
        let s = alarm.actuator_state();
        let expected = if n % 2 == 1 { (500, COLOUR_BLUE) } else { (1000, COLOUR_RED) };
        assert_eq!((s.tone_hz, s.colour), expected, "tick {n}");
    }
}

#[test]
fn deactivate_flame_cancels_timer_before_outputs() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_flame_alarm();
    timer.take_calls();
    hw.take_calls();

    assert!(alarm.deactivate_flame_alarm());
    assert_eq!(timer.take_calls(), vec![T::Detach, T::Stop]);
    let mut expected = rgb(0, 0, 0);
    expected.push(P::StopTone(BUZZER));
    assert_eq!(hw.take_calls(), expected);
}

#[test]
fn stale_tick_after_deactivation_changes_nothing() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_flame_alarm();
    alarm.deactivate_flame_alarm();
    hw.take_calls();

    assert!(!timer.tick());
    timer.replay_stale();
    assert!(hw.calls().is_empty());
    assert!(!alarm.actuator_state().buzzer_on);
}

#[test]
fn motion_activation_and_ticks() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    assert!(alarm.activate_motion_alarm());
    assert_eq!(
        hw.take_calls(),
        vec![P::StopTone(BUZZER), P::Tone { pin: BUZZER, hz: 1000, ms: 0 }]
    );
    assert_eq!(
        timer.take_calls(),
        vec![T::Begin(1_000_000), T::Attach, T::SetAlarm { ticks: 250_000, repeat: true }]
    );

    timer.tick();
    assert_eq!(
        hw.take_calls(),
        vec![P::Tone { pin: BUZZER, hz: 1000, ms: 0 }, P::Tone { pin: BUZZER, hz: 500, ms: 0 }]
    );
    timer.tick();
    assert_eq!(
        hw.take_calls(),
        vec![P::Tone { pin: BUZZER, hz: 500, ms: 0 }, P::Tone { pin: BUZZER, hz: 1000, ms: 0 }]
    );
}

#[test]
fn motion_deactivation_leaves_rgb_alone() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_motion_alarm();
    timer.take_calls();
    hw.take_calls();

    assert!(alarm.deactivate_motion_alarm());
    assert_eq!(timer.take_calls(), vec![T::Detach, T::Stop]);
    assert_eq!(hw.take_calls(), vec![P::StopTone(BUZZER)]);
}

#[test]
fn flame_preempts_motion_with_full_teardown() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_motion_alarm();
    timer.take_calls();
    hw.take_calls();

    assert!(alarm.activate_flame_alarm());
    assert_eq!(
        timer.take_calls(),
        vec![
            T::Detach,
            T::Stop,
            T::Begin(1_000_000),
            T::Attach,
            T::SetAlarm { ticks: 250_000, repeat: true },
        ]
    );
    assert_eq!(hw.calls().first(), Some(&P::StopTone(BUZZER)));
    assert_eq!(alarm.mode(), AlarmMode::Flame);
}

#[test]
fn guarded_motion_calls_touch_no_hardware() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_flame_alarm();
    timer.take_calls();
    hw.take_calls();

    assert!(!alarm.activate_motion_alarm());
    assert!(!alarm.deactivate_motion_alarm());
    assert!(timer.calls().is_empty());
    assert!(hw.calls().is_empty());
}

#[test]
fn avr_profile_timing_and_digital_blue() {
    let hw = MockPlatform::new();
    let timer = MockTimer::new();
    let cfg = SystemConfig::for_board(BoardProfile::AvrUno);
    let actuator = Actuator::new(&hw, BUZZER, RGB, &cfg);
    assert!(hw.calls().contains(&P::PinMode(RGB.blue, firewatch::app::ports::PinMode::Output)));

    let mut alarm = Alarm::new(timer.clone(), actuator, &cfg.alarm);
    alarm.activate_flame_alarm();
    assert!(timer.calls().contains(&T::SetAlarm { ticks: 100_000, repeat: true }));
    hw.take_calls();

    timer.tick();
    assert_eq!(
        hw.take_calls(),
        vec![
            P::Tone { pin: BUZZER, hz: 700, ms: 0 },
            P::Duty(RGB.red, 0),
            P::Duty(RGB.green, 0),
            P::Write(RGB.blue, firewatch::app::ports::PinState::High),
        ]
    );
}

#[test]
fn dropping_alarm_silences_everything() {
    let (hw, timer, mut alarm) = setup(BoardProfile::Esp32);
    alarm.activate_flame_alarm();
    hw.take_calls();
    timer.take_calls();

    drop(alarm);
    assert_eq!(timer.calls(), vec![T::Detach, T::Stop]);
    let calls = hw.calls();
    assert!(calls.contains(&P::StopTone(BUZZER)));
    assert!(calls.contains(&P::Duty(RGB.red, 0)));
    assert!(!timer.tick());
}
