//! Passive buzzer driver.
//!
//! The buzzer is a tone generator on one pin: ESP32 drives it from an
//! LEDC channel, AVR from the `tone()` timer.  Both look the same through
//! [`PwmPort::write_tone`].
//!
//! Settings are applied immediately: changing the frequency while the
//! buzzer sounds retunes it, changing it while silent keeps it silent.

use log::debug;

use crate::app::ports::{GpioPort, Pin, PinMode, PwmPort};

pub struct Buzzer<P: GpioPort + PwmPort> {
    port: P,
    pin: Pin,
    frequency_hz: u32,
    duration_ms: u32,
    on: bool,
}

impl<P: GpioPort + PwmPort> Buzzer<P> {
    pub fn new(mut port: P, pin: Pin) -> Self {
        port.set_pin_mode(pin, PinMode::Output);
        Self {
            port,
            pin,
            frequency_hz: 0,
            duration_ms: 0,
            on: false,
        }
    }

    pub fn turn_on(&mut self) {
        self.port.write_tone(self.pin, self.frequency_hz, self.duration_ms);
        self.on = true;
    }

    pub fn turn_off(&mut self) {
        self.port.stop_tone(self.pin);
        self.on = false;
    }

    /// Store the frequency and re-apply the current on/off state.
    pub fn set_frequency(&mut self, frequency_hz: u32) {
        self.frequency_hz = frequency_hz;
        if self.on {
            self.turn_on();
        } else {
            self.turn_off();
        }
    }

    /// Only stored; takes effect on the next [`turn_on`](Self::turn_on).
    /// Zero means continuous.
    pub fn set_duration(&mut self, duration_ms: u32) {
        debug!("buzzer: duration {}ms", duration_ms);
        self.duration_ms = duration_ms;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn frequency(&self) -> u32 {
        self.frequency_hz
    }

    pub fn duration(&self) -> u32 {
        self.duration_ms
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }
}

impl<P: GpioPort + PwmPort> Drop for Buzzer<P> {
    fn drop(&mut self) {
        self.turn_off();
    }
}
