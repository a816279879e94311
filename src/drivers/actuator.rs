//! Alarm actuator bundle: one buzzer plus one RGB LED.
//!
//! The ESP32 board drives both from a single object; the AVR board had
//! them as two separate drivers.  Bundling them lets the alarm own one
//! value and hand it to its timer callback as a unit.

use crate::app::ports::{GpioPort, Pin, PwmPort};
use crate::config::SystemConfig;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::rgb_led::{Rgb, RgbLed, RgbPins};

/// Point-in-time view of what the actuators are doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub buzzer_on: bool,
    pub tone_hz: u32,
    pub rgb_on: bool,
    pub colour: Rgb,
}

pub struct Actuator<P: GpioPort + PwmPort> {
    buzzer: Buzzer<P>,
    rgb: RgbLed<P>,
}

impl<P: GpioPort + PwmPort + Clone> Actuator<P> {
    /// Build both drivers on one platform handle.
    pub fn new(port: &P, buzzer_pin: Pin, rgb_pins: RgbPins, config: &SystemConfig) -> Self {
        let pwm = &config.pwm;
        Self::from_parts(
            Buzzer::new(port.clone(), buzzer_pin),
            RgbLed::new(
                port.clone(),
                rgb_pins,
                pwm.rgb_freq_hz,
                pwm.resolution_bits,
                pwm.blue_channel,
            ),
        )
    }
}

impl<P: GpioPort + PwmPort> Actuator<P> {
    pub fn from_parts(buzzer: Buzzer<P>, rgb: RgbLed<P>) -> Self {
        Self { buzzer, rgb }
    }

    // ── Buzzer ────────────────────────────────────────────────

    pub fn turn_on_buzzer(&mut self) {
        self.buzzer.turn_on();
    }

    pub fn turn_off_buzzer(&mut self) {
        self.buzzer.turn_off();
    }

    pub fn set_buzzer_frequency(&mut self, frequency_hz: u32) {
        self.buzzer.set_frequency(frequency_hz);
    }

    pub fn set_buzzer_duration(&mut self, duration_ms: u32) {
        self.buzzer.set_duration(duration_ms);
    }

    pub fn buzzer_is_on(&self) -> bool {
        self.buzzer.is_on()
    }

    // ── RGB ───────────────────────────────────────────────────

    pub fn turn_on_rgb(&mut self) {
        self.rgb.turn_on();
    }

    pub fn turn_off_rgb(&mut self) {
        self.rgb.turn_off();
    }

    pub fn set_rgb_color(&mut self, red: u16, green: u16, blue: u16) {
        self.rgb.set_color(red, green, blue);
    }

    /// Convenience for pattern code that already holds an [`Rgb`].
    pub fn set_rgb(&mut self, (r, g, b): Rgb) {
        self.rgb.set_color(u16::from(r), u16::from(g), u16::from(b));
    }

    pub fn rgb_is_on(&self) -> bool {
        self.rgb.is_on()
    }

    // ── Bundle ────────────────────────────────────────────────

    pub fn all_off(&mut self) {
        self.buzzer.turn_off();
        self.rgb.turn_off();
    }

    pub fn state(&self) -> ActuatorState {
        ActuatorState {
            buzzer_on: self.buzzer.is_on(),
            tone_hz: self.buzzer.frequency(),
            rgb_on: self.rgb.is_on(),
            colour: self.rgb.colour(),
        }
    }
}
