//! Adapters: concrete implementations of the platform port traits.
//!
//! | Adapter | Implements                        | Connects to                     |
//! |---------|-----------------------------------|---------------------------------|
//! | `esp32` | GpioPort, PwmPort, TimerPort      | ESP-IDF GPIO, ADC, LEDC, esp_timer |
//! | `sim`   | GpioPort, PwmPort, TimerPort      | In-memory pin/timer model (host) |

#[cfg(target_os = "espidf")]
pub mod esp32;
#[cfg(not(target_os = "espidf"))]
pub mod sim;
