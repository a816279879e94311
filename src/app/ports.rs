//! Port traits: the boundary between alarm/sensor logic and the board.
//!
//! ```text
//!   Board adapter ──▶ Port trait ──▶ drivers / sensors / Alarm
//! ```
//!
//! Both board variants expose the same three capabilities: digital/analog
//! I/O with edge interrupts, PWM/tone generation, and one periodic timer.
//! Adapters in [`crate::adapters`] implement these traits; the domain code
//! consumes them via generics, so nothing above this line touches registers.
//!
//! All port operations are treated as infallible.  Adapters that talk to
//! real peripherals log the vendor error code and carry on.

use std::sync::Arc;

pub use embedded_hal::digital::PinState;

/// GPIO number as wired on the board.
pub type Pin = u8;

/// Callback registered for a pin edge or a timer tick.
///
/// Runs in interrupt (or timer-task) context: it must only touch atomics
/// or state guarded by `critical_section`, and must return quickly.  The
/// handler captures its owner's state, so several instances can coexist.
pub type IsrHandler = Arc<dyn Fn() + Send + Sync + 'static>;

/// Signal transition an interrupt is armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// The transition that ends the state this edge starts.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Rising => Self::Falling,
            Self::Falling => Self::Rising,
        }
    }
}

/// Electrical configuration of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    InputPullup,
    Output,
}

// ───────────────────────────────────────────────────────────────
// Digital / analog I/O
// ───────────────────────────────────────────────────────────────

pub trait GpioPort {
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode);

    fn digital_read(&self, pin: Pin) -> PinState;

    fn digital_write(&mut self, pin: Pin, level: PinState);

    /// Single raw ADC sample (12-bit on ESP32, 10-bit on AVR).
    fn analog_read(&self, pin: Pin) -> u16;

    /// Arm `handler` for `edge` on `pin`.  Replaces any handler already
    /// attached to that pin.
    fn attach_pin_interrupt(&mut self, pin: Pin, edge: Edge, handler: IsrHandler);

    /// Disarm the pin.  No-op if nothing is attached.
    fn detach_pin_interrupt(&mut self, pin: Pin);
}

// ───────────────────────────────────────────────────────────────
// PWM / tone generation
// ───────────────────────────────────────────────────────────────

pub trait PwmPort {
    /// Bind a PWM channel to `pin` at the given carrier frequency.
    fn attach_pwm(&mut self, pin: Pin, freq_hz: u32, resolution_bits: u8);

    /// Release the PWM channel bound to `pin`.
    fn detach_pwm(&mut self, pin: Pin);

    /// Raw duty value, passed through without scaling.
    fn write_duty_cycle(&mut self, pin: Pin, value: u16);

    /// Square wave at `frequency_hz`.  `duration_ms == 0` keeps it
    /// running until [`stop_tone`](Self::stop_tone).
    fn write_tone(&mut self, pin: Pin, frequency_hz: u32, duration_ms: u32);

    fn stop_tone(&mut self, pin: Pin);
}

// ───────────────────────────────────────────────────────────────
// Periodic hardware timer
// ───────────────────────────────────────────────────────────────

/// One periodic-interrupt timer.  The boards expose very few of these,
/// so a single instance is shared by every alarm mode.
pub trait TimerPort {
    /// Start the counter at `basis_hz` ticks per second.
    fn begin(&mut self, basis_hz: u32);

    fn attach_interrupt(&mut self, handler: IsrHandler);

    /// Fire after `period_ticks` counter ticks, repeatedly if `repeat`.
    fn set_alarm(&mut self, period_ticks: u64, repeat: bool);

    /// Synchronous: once this returns the handler is never invoked again.
    fn detach_interrupt(&mut self);

    fn stop(&mut self);
}
