//! Host simulation platform.
//!
//! In-memory stand-in for the board on non-espidf targets.  Every port
//! call updates a register-like model that tests can inspect, and the
//! injection hooks (`set_analog`, `drive`, `SimTimer::fire`) play the role
//! of the outside world: a sensor changing level, the ADC moving, the
//! timer expiring.
//!
//! Pin handlers are invoked outside the state lock, the same way a real
//! interrupt preempts whatever the foreground was doing.  Timer handlers
//! run inside the critical section, so `detach_interrupt` blocks until a
//! tick already in progress has returned.

use core::cell::RefCell;
use std::sync::Arc;

use critical_section::Mutex;
use heapless::FnvIndexMap;
use log::warn;

use crate::app::ports::{Edge, GpioPort, IsrHandler, Pin, PinMode, PinState, PwmPort, TimerPort};

const MAX_PINS: usize = 64;
const MAX_IRQ_PINS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPwm {
    pub freq_hz: u32,
    pub resolution_bits: u8,
    pub duty: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimTone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

struct SimState {
    modes: FnvIndexMap<Pin, PinMode, MAX_PINS>,
    levels: FnvIndexMap<Pin, PinState, MAX_PINS>,
    analog: FnvIndexMap<Pin, u16, MAX_PINS>,
    pwm: FnvIndexMap<Pin, SimPwm, MAX_PINS>,
    tones: FnvIndexMap<Pin, SimTone, MAX_IRQ_PINS>,
    interrupts: FnvIndexMap<Pin, (Edge, IsrHandler), MAX_IRQ_PINS>,
}

impl SimState {
    fn new() -> Self {
        Self {
            modes: FnvIndexMap::new(),
            levels: FnvIndexMap::new(),
            analog: FnvIndexMap::new(),
            pwm: FnvIndexMap::new(),
            tones: FnvIndexMap::new(),
            interrupts: FnvIndexMap::new(),
        }
    }
}

/// Cheap-to-clone handle onto one simulated board.  Clones share state,
/// like several drivers sharing one set of peripherals.
#[derive(Clone)]
pub struct SimPlatform {
    state: Arc<Mutex<RefCell<SimState>>>,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RefCell::new(SimState::new()))),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    // ── Injection ─────────────────────────────────────────────

    /// Set the value the ADC returns for `pin`.
    pub fn set_analog(&self, pin: Pin, raw: u16) {
        self.with(|s| {
            if s.analog.insert(pin, raw).is_err() {
                warn!("sim: analog table full, pin {} ignored", pin);
            }
        });
    }

    /// Drive an input pin to `level`.  Fires the attached handler when the
    /// transition matches the armed edge.  Returns `true` if it fired.
    pub fn drive(&self, pin: Pin, level: PinState) -> bool {
        let handler = self.with(|s| {
            let previous = s.levels.get(&pin).copied().unwrap_or(PinState::Low);
            let _ = s.levels.insert(pin, level);
            let edge = match (previous, level) {
                (PinState::Low, PinState::High) => Edge::Rising,
                (PinState::High, PinState::Low) => Edge::Falling,
                _ => return None,
            };
            match s.interrupts.get(&pin) {
                Some((armed, handler)) if *armed == edge => Some(Arc::clone(handler)),
                _ => None,
            }
        });
        match handler {
            Some(h) => {
                h();
                true
            }
            None => false,
        }
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn pin_mode(&self, pin: Pin) -> Option<PinMode> {
        self.with(|s| s.modes.get(&pin).copied())
    }

    pub fn level(&self, pin: Pin) -> PinState {
        self.with(|s| s.levels.get(&pin).copied().unwrap_or(PinState::Low))
    }

    pub fn pwm(&self, pin: Pin) -> Option<SimPwm> {
        self.with(|s| s.pwm.get(&pin).copied())
    }

    /// Current duty on `pin`, `None` if no PWM channel is bound.
    pub fn duty(&self, pin: Pin) -> Option<u16> {
        self.pwm(pin).map(|p| p.duty)
    }

    pub fn tone(&self, pin: Pin) -> Option<SimTone> {
        self.with(|s| s.tones.get(&pin).copied())
    }

    pub fn armed_edge(&self, pin: Pin) -> Option<Edge> {
        self.with(|s| s.interrupts.get(&pin).map(|(edge, _)| *edge))
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for SimPlatform {
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode) {
        self.with(|s| {
            if s.modes.insert(pin, mode).is_err() {
                warn!("sim: pin table full, pin {} ignored", pin);
            }
        });
    }

    fn digital_read(&self, pin: Pin) -> PinState {
        self.level(pin)
    }

    fn digital_write(&mut self, pin: Pin, level: PinState) {
        self.with(|s| {
            let _ = s.levels.insert(pin, level);
        });
    }

    fn analog_read(&self, pin: Pin) -> u16 {
        self.with(|s| s.analog.get(&pin).copied().unwrap_or(0))
    }

    fn attach_pin_interrupt(&mut self, pin: Pin, edge: Edge, handler: IsrHandler) {
        self.with(|s| {
            if s.interrupts.insert(pin, (edge, handler)).is_err() {
                warn!("sim: interrupt table full, pin {} not armed", pin);
            }
        });
    }

    fn detach_pin_interrupt(&mut self, pin: Pin) {
        self.with(|s| {
            s.interrupts.remove(&pin);
        });
    }
}

impl PwmPort for SimPlatform {
    fn attach_pwm(&mut self, pin: Pin, freq_hz: u32, resolution_bits: u8) {
        self.with(|s| {
            let pwm = SimPwm { freq_hz, resolution_bits, duty: 0 };
            if s.pwm.insert(pin, pwm).is_err() {
                warn!("sim: PWM table full, pin {} ignored", pin);
            }
        });
    }

    fn detach_pwm(&mut self, pin: Pin) {
        self.with(|s| {
            s.pwm.remove(&pin);
        });
    }

    fn write_duty_cycle(&mut self, pin: Pin, value: u16) {
        self.with(|s| match s.pwm.get_mut(&pin) {
            Some(p) => p.duty = value,
            // analogWrite on AVR needs no prior attach.
            None => {
                let pwm = SimPwm { freq_hz: 0, resolution_bits: 8, duty: value };
                let _ = s.pwm.insert(pin, pwm);
            }
        });
    }

    fn write_tone(&mut self, pin: Pin, frequency_hz: u32, duration_ms: u32) {
        self.with(|s| {
            let tone = SimTone { frequency_hz, duration_ms };
            if s.tones.insert(pin, tone).is_err() {
                warn!("sim: tone table full, pin {} ignored", pin);
            }
        });
    }

    fn stop_tone(&mut self, pin: Pin) {
        self.with(|s| {
            s.tones.remove(&pin);
        });
    }
}

// ── Timer ─────────────────────────────────────────────────────

struct SimTimerState {
    basis_hz: Option<u32>,
    handler: Option<IsrHandler>,
    period_ticks: u64,
    repeat: bool,
    running: bool,
    fired: u64,
}

/// Simulated periodic timer.  Clones share the same counter, so a test
/// can keep one handle while the alarm owns the other.
#[derive(Clone)]
pub struct SimTimer {
    state: Arc<Mutex<RefCell<SimTimerState>>>,
}

impl SimTimer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RefCell::new(SimTimerState {
                basis_hz: None,
                handler: None,
                period_ticks: 0,
                repeat: false,
                running: false,
                fired: 0,
            }))),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimTimerState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    /// Expire one period.  Invokes the attached handler if the timer is
    /// running; returns `true` if it did.
    pub fn fire(&self) -> bool {
        critical_section::with(|cs| {
            let handler = {
                let mut s = self.state.borrow_ref_mut(cs);
                if !s.running {
                    return false;
                }
                let Some(handler) = s.handler.as_ref().map(Arc::clone) else {
                    return false;
                };
                if !s.repeat {
                    s.running = false;
                }
                s.fired += 1;
                handler
            };
            handler();
            true
        })
    }

    pub fn is_running(&self) -> bool {
        self.with(|s| s.running)
    }

    pub fn has_handler(&self) -> bool {
        self.with(|s| s.handler.is_some())
    }

    pub fn basis_hz(&self) -> Option<u32> {
        self.with(|s| s.basis_hz)
    }

    pub fn period_ticks(&self) -> u64 {
        self.with(|s| s.period_ticks)
    }

    pub fn fired(&self) -> u64 {
        self.with(|s| s.fired)
    }
}

impl Default for SimTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerPort for SimTimer {
    fn begin(&mut self, basis_hz: u32) {
        self.with(|s| {
            s.basis_hz = Some(basis_hz);
            s.running = false;
        });
    }

    fn attach_interrupt(&mut self, handler: IsrHandler) {
        self.with(|s| s.handler = Some(handler));
    }

    fn set_alarm(&mut self, period_ticks: u64, repeat: bool) {
        self.with(|s| {
            s.period_ticks = period_ticks;
            s.repeat = repeat;
            s.running = s.basis_hz.is_some() && period_ticks > 0;
        });
    }

    fn detach_interrupt(&mut self) {
        self.with(|s| s.handler = None);
    }

    fn stop(&mut self) {
        self.with(|s| {
            s.running = false;
            s.basis_hz = None;
        });
    }
}
