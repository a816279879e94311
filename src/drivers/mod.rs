//! Actuator drivers and the shared alarm timer.

pub mod actuator;
pub mod buzzer;
pub mod fan;
pub mod hw_timer;
pub mod rgb_led;
