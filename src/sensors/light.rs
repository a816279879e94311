//! Ambient light sensor (LDR voltage divider on an ADC pin).
//!
//! Each read is an independent raw sample: no averaging, no hysteresis.
//! A value sitting on a threshold will flip bands from one read to the
//! next.

use crate::app::ports::{GpioPort, Pin, PinMode};
use crate::config::LightThresholds;

/// Ordered brightness bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LightLevel {
    Dark,
    LowLight,
    NormalLight,
    HighLight,
}

impl LightLevel {
    /// Bucket a raw sample.  Each threshold is the inclusive upper bound
    /// of the lower band.
    pub fn classify(raw: u16, t: &LightThresholds) -> Self {
        if raw <= t.dark_max {
            Self::Dark
        } else if raw <= t.low_max {
            Self::LowLight
        } else if raw <= t.normal_max {
            Self::NormalLight
        } else {
            Self::HighLight
        }
    }
}

pub struct LightSensor<G: GpioPort> {
    gpio: G,
    pin: Pin,
    thresholds: LightThresholds,
}

impl<G: GpioPort> LightSensor<G> {
    pub fn new(mut gpio: G, pin: Pin, thresholds: LightThresholds) -> Self {
        gpio.set_pin_mode(pin, PinMode::Input);
        Self { gpio, pin, thresholds }
    }

    pub fn light_value(&self) -> u16 {
        self.gpio.analog_read(self.pin)
    }

    pub fn light_level(&self) -> LightLevel {
        LightLevel::classify(self.light_value(), &self.thresholds)
    }

    pub fn thresholds(&self) -> LightThresholds {
        self.thresholds
    }
}
