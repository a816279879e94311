//! RGB LED driver.
//!
//! Red and green are always PWM channels.  Blue depends on the board:
//!
//! | Variant                | Blue drive        | Accepted range |
//! |------------------------|-------------------|----------------|
//! | [`BlueChannel::Pwm`]     | PWM duty          | 0 – 255        |
//! | [`BlueChannel::Digital`] | digital write     | 0 – 1          |
//!
//! The AVR board wires blue to a pin driven with `digitalWrite`, so any
//! non-zero request saturates to 1 there.
//!
//! Colour inputs are `u16` so out-of-range requests (e.g. 300) clamp
//! instead of wrapping.

use serde::{Deserialize, Serialize};

use crate::app::ports::{GpioPort, Pin, PinMode, PinState, PwmPort};

/// Colour as (R, G, B) tuple.
pub type Rgb = (u8, u8, u8);

pub const COLOUR_OFF: Rgb = (0, 0, 0);
pub const COLOUR_RED: Rgb = (255, 0, 0);
pub const COLOUR_BLUE: Rgb = (0, 0, 255);

const CHANNEL_MAX: u16 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlueChannel {
    Pwm,
    Digital,
}

impl BlueChannel {
    pub const fn max(self) -> u16 {
        match self {
            Self::Pwm => CHANNEL_MAX,
            Self::Digital => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbPins {
    pub red: Pin,
    pub green: Pin,
    pub blue: Pin,
}

/// Clamp a requested colour to what the channels can show.
pub fn clamp_colour(red: u16, green: u16, blue: u16, blue_channel: BlueChannel) -> Rgb {
    (
        red.min(CHANNEL_MAX) as u8,
        green.min(CHANNEL_MAX) as u8,
        blue.min(blue_channel.max()) as u8,
    )
}

pub struct RgbLed<P: GpioPort + PwmPort> {
    port: P,
    pins: RgbPins,
    blue_channel: BlueChannel,
    colour: Rgb,
    on: bool,
}

impl<P: GpioPort + PwmPort> RgbLed<P> {
    pub fn new(
        mut port: P,
        pins: RgbPins,
        freq_hz: u32,
        resolution_bits: u8,
        blue_channel: BlueChannel,
    ) -> Self {
        port.attach_pwm(pins.red, freq_hz, resolution_bits);
        port.attach_pwm(pins.green, freq_hz, resolution_bits);
        match blue_channel {
            BlueChannel::Pwm => port.attach_pwm(pins.blue, freq_hz, resolution_bits),
            BlueChannel::Digital => port.set_pin_mode(pins.blue, PinMode::Output),
        }
        Self {
            port,
            pins,
            blue_channel,
            colour: COLOUR_OFF,
            on: false,
        }
    }

    pub fn turn_on(&mut self) {
        let (r, g, b) = self.colour;
        self.write(r, g, b);
        self.on = true;
    }

    pub fn turn_off(&mut self) {
        self.write(0, 0, 0);
        self.on = false;
    }

    /// Clamp and store the colour, then re-apply the on/off state.
    pub fn set_color(&mut self, red: u16, green: u16, blue: u16) {
        self.colour = clamp_colour(red, green, blue, self.blue_channel);
        if self.on {
            self.turn_on();
        } else {
            self.turn_off();
        }
    }

    pub fn colour(&self) -> Rgb {
        self.colour
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn blue_channel(&self) -> BlueChannel {
        self.blue_channel
    }

    fn write(&mut self, r: u8, g: u8, b: u8) {
        self.port.write_duty_cycle(self.pins.red, u16::from(r));
        self.port.write_duty_cycle(self.pins.green, u16::from(g));
        match self.blue_channel {
            BlueChannel::Pwm => self.port.write_duty_cycle(self.pins.blue, u16::from(b)),
            BlueChannel::Digital => self.port.digital_write(self.pins.blue, PinState::from(b != 0)),
        }
    }
}

impl<P: GpioPort + PwmPort> Drop for RgbLed<P> {
    fn drop(&mut self) {
        self.turn_off();
        self.port.detach_pwm(self.pins.red);
        self.port.detach_pwm(self.pins.green);
        if self.blue_channel == BlueChannel::Pwm {
            self.port.detach_pwm(self.pins.blue);
        }
    }
}
