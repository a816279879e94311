//! Sensor subsystem: interrupt-latched digital sensors and the light sensor.
//!
//! The flame and motion sensors share one mechanism: a digital output
//! that goes high while something is detected.  A GPIO edge interrupt
//! records the transition in an [`EdgeLatch`]; the control loop consumes
//! it by polling, and every consumed edge re-arms the interrupt for the
//! opposite one.
//!
//! ```text
//!   enable ──▶ armed Rising ──[rise]──▶ detected ──poll──▶ armed Falling
//!                   ▲                                          │
//!                   └────poll──── ended ◀────────[fall]────────┘
//! ```
//!
//! The latch is single-slot: an edge that is not polled before the next
//! one arrives is overwritten, so fast detect→end→detect bursts collapse
//! into the latest state.

pub mod flame;
pub mod light;
pub mod motion;

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::app::ports::{Edge, GpioPort, IsrHandler, Pin, PinMode};

/// Two mutually exclusive "event since last poll" flags.
///
/// Written from the GPIO ISR, consumed from the foreground.  The ISR side
/// always clears the opposite flag *before* setting its own, so a reader
/// can never observe both set.
pub struct EdgeLatch {
    detected: AtomicBool,
    ended: AtomicBool,
}

/// Snapshot of an [`EdgeLatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    Clear,
    Detected,
    Ended,
}

impl EdgeLatch {
    pub const fn new() -> Self {
        Self {
            detected: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        }
    }

    /// Rising-edge ISR body.  Lock-free.
    pub fn on_rise(&self) {
        self.ended.store(false, Ordering::Release);
        self.detected.store(true, Ordering::Release);
    }

    /// Falling-edge ISR body.  Lock-free.
    pub fn on_fall(&self) {
        self.detected.store(false, Ordering::Release);
        self.ended.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.detected.store(false, Ordering::Release);
        self.ended.store(false, Ordering::Release);
    }

    /// Consume a pending detection.  `true` at most once per rising edge.
    pub fn take_detected(&self) -> bool {
        if self.ended.load(Ordering::Acquire) {
            return false;
        }
        self.detected
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Consume a pending end.  `true` at most once per falling edge.
    pub fn take_ended(&self) -> bool {
        if self.detected.load(Ordering::Acquire) {
            return false;
        }
        self.ended
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn state(&self) -> LatchState {
        if self.detected.load(Ordering::Acquire) {
            LatchState::Detected
        } else if self.ended.load(Ordering::Acquire) {
            LatchState::Ended
        } else {
            LatchState::Clear
        }
    }
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// A digital sensor pin whose edges are latched by interrupt.
///
/// Each instance owns its latch; the registered handlers capture an
/// `Arc` to it, so two sensors never share state.
pub struct EdgeSensor<G: GpioPort> {
    gpio: G,
    pin: Pin,
    latch: Arc<EdgeLatch>,
    armed: Option<Edge>,
    label: &'static str,
}

impl<G: GpioPort> EdgeSensor<G> {
    pub fn new(mut gpio: G, pin: Pin, label: &'static str) -> Self {
        gpio.set_pin_mode(pin, PinMode::Input);
        Self {
            gpio,
            pin,
            latch: Arc::new(EdgeLatch::new()),
            armed: None,
            label,
        }
    }

    /// Clear both flags and arm for the rising edge.
    pub fn enable_detection(&mut self) {
        self.gpio.detach_pin_interrupt(self.pin);
        self.latch.clear();
        self.arm(Edge::Rising);
        debug!("{}: detection enabled on pin {}", self.label, self.pin);
    }

    /// Disarm and clear both flags.
    pub fn disable_detection(&mut self) {
        self.gpio.detach_pin_interrupt(self.pin);
        self.armed = None;
        self.latch.clear();
        debug!("{}: detection disabled", self.label);
    }

    /// `true` once per latched rising edge; re-arms for the falling edge.
    pub fn poll_detected(&mut self) -> bool {
        self.consume(Edge::Rising)
    }

    /// `true` once per latched falling edge; re-arms for the rising edge.
    pub fn poll_ended(&mut self) -> bool {
        self.consume(Edge::Falling)
    }

    pub fn armed_edge(&self) -> Option<Edge> {
        self.armed
    }

    pub fn latch_state(&self) -> LatchState {
        self.latch.state()
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub(crate) fn gpio(&self) -> &G {
        &self.gpio
    }

    fn consume(&mut self, edge: Edge) -> bool {
        let taken = match edge {
            Edge::Rising => self.latch.take_detected(),
            Edge::Falling => self.latch.take_ended(),
        };
        if !taken {
            return false;
        }
        self.arm(edge.opposite());
        debug!("{}: {:?} edge consumed", self.label, edge);
        true
    }

    fn arm(&mut self, edge: Edge) {
        self.gpio.attach_pin_interrupt(self.pin, edge, self.handler(edge));
        self.armed = Some(edge);
    }

    fn handler(&self, edge: Edge) -> IsrHandler {
        let latch = Arc::clone(&self.latch);
        match edge {
            Edge::Rising => Arc::new(move || latch.on_rise()),
            Edge::Falling => Arc::new(move || latch.on_fall()),
        }
    }
}

impl<G: GpioPort> Drop for EdgeSensor<G> {
    fn drop(&mut self) {
        self.disable_detection();
    }
}
