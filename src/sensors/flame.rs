//! IR flame sensor module (KY-026 style).
//!
//! The module has a comparator output (digital, high while a flame is
//! seen) and the raw photodiode level on an analog pin.  The digital side
//! is edge-latched through [`EdgeSensor`]; the analog side is sampled on
//! demand.

use crate::app::ports::{GpioPort, Pin, PinMode};
use crate::sensors::{EdgeSensor, LatchState};

pub struct FlameDetector<G: GpioPort> {
    sensor: EdgeSensor<G>,
    analog_pin: Pin,
}

impl<G: GpioPort> FlameDetector<G> {
    pub fn new(mut gpio: G, digital_pin: Pin, analog_pin: Pin) -> Self {
        gpio.set_pin_mode(analog_pin, PinMode::Input);
        Self {
            sensor: EdgeSensor::new(gpio, digital_pin, "flame"),
            analog_pin,
        }
    }

    pub fn enable_detection(&mut self) {
        self.sensor.enable_detection();
    }

    pub fn disable_detection(&mut self) {
        self.sensor.disable_detection();
    }

    /// `true` once per flame onset.
    pub fn is_flame_detected(&mut self) -> bool {
        self.sensor.poll_detected()
    }

    /// `true` once per flame going out.
    pub fn is_flame_ended(&mut self) -> bool {
        self.sensor.poll_ended()
    }

    /// Raw analog intensity.  Lower means stronger IR on most modules.
    pub fn flame_intensity(&self) -> u16 {
        self.sensor.gpio().analog_read(self.analog_pin)
    }

    pub fn latch_state(&self) -> LatchState {
        self.sensor.latch_state()
    }

    pub fn sensor(&self) -> &EdgeSensor<G> {
        &self.sensor
    }
}
