//! Ventilation fan driver (L293D-style H-bridge).
//!
//! One digital enable line plus one PWM line per rotation direction.
//! Only the line for the selected direction carries the speed; the other
//! is held at zero so the bridge never sees both halves driven.
//!
//! Construction touches no hardware; call [`Fan::initialize`] once the
//! board is up.

use crate::app::ports::{GpioPort, Pin, PinMode, PinState, PwmPort};

const MAX_SPEED: u16 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDirection {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanPins {
    pub enable: Pin,
    pub clockwise: Pin,
    pub counter_clockwise: Pin,
}

pub struct Fan<P: GpioPort + PwmPort> {
    port: P,
    pins: FanPins,
    freq_hz: u32,
    resolution_bits: u8,
    speed: u16,
    direction: FanDirection,
    on: bool,
}

impl<P: GpioPort + PwmPort> Fan<P> {
    pub fn new(port: P, pins: FanPins, freq_hz: u32, resolution_bits: u8) -> Self {
        Self {
            port,
            pins,
            freq_hz,
            resolution_bits,
            speed: 0,
            direction: FanDirection::Clockwise,
            on: false,
        }
    }

    /// Configure the pins and leave the fan stopped at speed 0.
    pub fn initialize(&mut self) {
        self.port.set_pin_mode(self.pins.enable, PinMode::Output);
        self.port.set_pin_mode(self.pins.clockwise, PinMode::Output);
        self.port.set_pin_mode(self.pins.counter_clockwise, PinMode::Output);
        self.port.attach_pwm(self.pins.clockwise, self.freq_hz, self.resolution_bits);
        self.port.attach_pwm(self.pins.counter_clockwise, self.freq_hz, self.resolution_bits);
        self.turn_off();
        self.set_speed(0);
    }

    pub fn turn_on(&mut self) {
        self.port.digital_write(self.pins.enable, PinState::High);
        self.on = true;
    }

    pub fn turn_off(&mut self) {
        self.port.digital_write(self.pins.enable, PinState::Low);
        self.on = false;
    }

    /// Clamped to 255.
    pub fn set_speed(&mut self, speed: u16) {
        self.speed = speed.min(MAX_SPEED);
        self.apply();
    }

    pub fn set_direction(&mut self, direction: FanDirection) {
        self.direction = direction;
        self.apply();
    }

    pub fn speed(&self) -> u16 {
        self.speed
    }

    pub fn direction(&self) -> FanDirection {
        self.direction
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    fn apply(&mut self) {
        let (idle, active) = match self.direction {
            FanDirection::Clockwise => (self.pins.counter_clockwise, self.pins.clockwise),
            FanDirection::CounterClockwise => (self.pins.clockwise, self.pins.counter_clockwise),
        };
        self.port.write_duty_cycle(idle, 0);
        self.port.write_duty_cycle(active, self.speed);
    }
}

impl<P: GpioPort + PwmPort> Drop for Fan<P> {
    fn drop(&mut self) {
        self.port.digital_write(self.pins.enable, PinState::Low);
        self.port.write_duty_cycle(self.pins.clockwise, 0);
        self.port.write_duty_cycle(self.pins.counter_clockwise, 0);
    }
}
