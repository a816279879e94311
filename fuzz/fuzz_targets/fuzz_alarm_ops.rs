//! Fuzz target: alarm arbiter operation sequences
//!
//! Each input byte selects one operation (activate/deactivate flame or
//! motion, or a timer tick).  After every step:
//! - flame and motion are never both active
//! - the timer runs exactly when a mode is active
//! - an idle alarm has its buzzer off
//!
//! cargo fuzz run fuzz_alarm_ops

#![no_main]

use firewatch::adapters::sim::{SimPlatform, SimTimer};
use firewatch::alarm::{Alarm, AlarmMode};
use firewatch::config::SystemConfig;
use firewatch::drivers::actuator::Actuator;
use firewatch::drivers::rgb_led::RgbPins;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let sim = SimPlatform::new();
    let timer = SimTimer::new();
    let cfg = SystemConfig::default();
    let act = Actuator::new(&sim, 25, RgbPins { red: 26, green: 27, blue: 14 }, &cfg);
    let mut alarm = Alarm::new(timer.clone(), act, &cfg.alarm);

    for &op in data {
        match op % 5 {
            0 => {
                alarm.activate_flame_alarm();
            }
            1 => {
                alarm.deactivate_flame_alarm();
            }
            2 => {
                alarm.activate_motion_alarm();
            }
            3 => {
                alarm.deactivate_motion_alarm();
            }
            _ => {
                timer.fire();
            }
        }

        assert!(!(alarm.is_flame_active() && alarm.is_motion_active()));
        assert_eq!(timer.is_running(), alarm.mode() != AlarmMode::Idle);
        if alarm.mode() == AlarmMode::Idle {
            assert!(!alarm.actuator_state().buzzer_on);
        }
    }
});
