//! Mock platform for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history without touching real GPIO/PWM/timer registers.  Pin edge
//! handlers and the timer handler are kept so tests can fire them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use firewatch::app::ports::{
    Edge, GpioPort, IsrHandler, Pin, PinMode, PinState, PwmPort, TimerPort,
};

// ── Platform call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    PinMode(Pin, PinMode),
    Write(Pin, PinState),
    AttachIrq(Pin, Edge),
    DetachIrq(Pin),
    AttachPwm { pin: Pin, freq_hz: u32, bits: u8 },
    DetachPwm(Pin),
    Duty(Pin, u16),
    Tone { pin: Pin, hz: u32, ms: u32 },
    StopTone(Pin),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCall {
    Begin(u32),
    Attach,
    SetAlarm { ticks: u64, repeat: bool },
    Detach,
    Stop,
}

// ── MockPlatform ──────────────────────────────────────────────

#[derive(Default)]
struct PlatformInner {
    calls: Vec<PlatformCall>,
    analog: HashMap<Pin, u16>,
    levels: HashMap<Pin, PinState>,
    irqs: HashMap<Pin, (Edge, IsrHandler)>,
}

#[derive(Clone, Default)]
pub struct MockPlatform {
    inner: Arc<Mutex<PlatformInner>>,
}

#[allow(dead_code)]
impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlatformInner> {
        self.inner.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    /// Drain and return the history recorded so far.
    pub fn take_calls(&self) -> Vec<PlatformCall> {
        std::mem::take(&mut self.lock().calls)
    }

    pub fn set_analog(&self, pin: Pin, raw: u16) {
        self.lock().analog.insert(pin, raw);
    }

    pub fn armed(&self, pin: Pin) -> Option<Edge> {
        self.lock().irqs.get(&pin).map(|(e, _)| *e)
    }

    /// Fire the handler armed on `pin`, whatever its edge.
    pub fn trigger(&self, pin: Pin) -> bool {
        let handler = self.lock().irqs.get(&pin).map(|(_, h)| Arc::clone(h));
        match handler {
            Some(h) => {
                h();
                true
            }
            None => false,
        }
    }
}

impl GpioPort for MockPlatform {
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode) {
        self.lock().calls.push(PlatformCall::PinMode(pin, mode));
    }

    fn digital_read(&self, pin: Pin) -> PinState {
        self.lock().levels.get(&pin).copied().unwrap_or(PinState::Low)
    }

    fn digital_write(&mut self, pin: Pin, level: PinState) {
        let mut inner = self.lock();
        inner.levels.insert(pin, level);
        inner.calls.push(PlatformCall::Write(pin, level));
    }

    fn analog_read(&self, pin: Pin) -> u16 {
        self.lock().analog.get(&pin).copied().unwrap_or(0)
    }

    fn attach_pin_interrupt(&mut self, pin: Pin, edge: Edge, handler: IsrHandler) {
        let mut inner = self.lock();
        inner.irqs.insert(pin, (edge, handler));
        inner.calls.push(PlatformCall::AttachIrq(pin, edge));
    }

    fn detach_pin_interrupt(&mut self, pin: Pin) {
        let mut inner = self.lock();
        inner.irqs.remove(&pin);
        inner.calls.push(PlatformCall::DetachIrq(pin));
    }
}

impl PwmPort for MockPlatform {
    fn attach_pwm(&mut self, pin: Pin, freq_hz: u32, resolution_bits: u8) {
        self.lock().calls.push(PlatformCall::AttachPwm { pin, freq_hz, bits: resolution_bits });
    }

    fn detach_pwm(&mut self, pin: Pin) {
        self.lock().calls.push(PlatformCall::DetachPwm(pin));
    }

    fn write_duty_cycle(&mut self, pin: Pin, value: u16) {
        self.lock().calls.push(PlatformCall::Duty(pin, value));
    }

    fn write_tone(&mut self, pin: Pin, frequency_hz: u32, duration_ms: u32) {
        self.lock().calls.push(PlatformCall::Tone { pin, hz: frequency_hz, ms: duration_ms });
    }

    fn stop_tone(&mut self, pin: Pin) {
        self.lock().calls.push(PlatformCall::StopTone(pin));
    }
}

// ── MockTimer ─────────────────────────────────────────────────

#[derive(Default)]
struct TimerInner {
    calls: Vec<TimerCall>,
    handler: Option<IsrHandler>,
    /// Last handler ever attached; survives detach so tests can replay
    /// a callback that was already in flight.
    last_handler: Option<IsrHandler>,
}

#[derive(Clone, Default)]
pub struct MockTimer {
    inner: Arc<Mutex<TimerInner>>,
}

#[allow(dead_code)]
impl MockTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimerInner> {
        self.inner.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<TimerCall> {
        self.lock().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<TimerCall> {
        std::mem::take(&mut self.lock().calls)
    }

    /// One timer period elapses.
    pub fn tick(&self) -> bool {
        let handler = self.lock().handler.clone();
        match handler {
            Some(h) => {
                h();
                true
            }
            None => false,
        }
    }

    /// Run the most recently attached handler even if it was detached.
    pub fn replay_stale(&self) {
        let handler = self.lock().last_handler.clone();
        if let Some(h) = handler {
            h();
        }
    }
}

impl TimerPort for MockTimer {
    fn begin(&mut self, basis_hz: u32) {
        self.lock().calls.push(TimerCall::Begin(basis_hz));
    }

    fn attach_interrupt(&mut self, handler: IsrHandler) {
        let mut inner = self.lock();
        inner.last_handler = Some(Arc::clone(&handler));
        inner.handler = Some(handler);
        inner.calls.push(TimerCall::Attach);
    }

    fn set_alarm(&mut self, period_ticks: u64, repeat: bool) {
        self.lock().calls.push(TimerCall::SetAlarm { ticks: period_ticks, repeat });
    }

    fn detach_interrupt(&mut self) {
        let mut inner = self.lock();
        inner.handler = None;
        inner.calls.push(TimerCall::Detach);
    }

    fn stop(&mut self) {
        self.lock().calls.push(TimerCall::Stop);
    }
}
