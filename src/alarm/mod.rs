//! Alarm arbiter.
//!
//! Two alarm modes share one periodic timer and one actuator bundle, so
//! at most one of them runs at a time.
//!
//! ```text
//!            activate_flame                    activate_motion
//!   ┌──────┐ ─────────────▶ ┌───────┐   ┌──────┐ ──────────────▶ ┌────────┐
//!   │ Idle │                │ Flame │   │ Idle │                 │ Motion │
//!   └──────┘ ◀───────────── └───────┘   └──────┘ ◀────────────── └────────┘
//!            deactivate_flame                  deactivate_motion
//!
//!   Motion ──activate_flame──▶ Flame     (flame preempts motion)
//!   Flame  ──activate_motion──▶ Flame    (ignored)
//!   Flame  ──deactivate_motion──▶ Flame  (ignored)
//! ```
//!
//! The mode lives in an atomic next to the actuator, which sits in a
//! `critical_section::Mutex` because the tick handler mutates it from
//! interrupt context.

mod handlers;

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::app::ports::{GpioPort, PwmPort, TimerPort};
use crate::config::AlarmConfig;
use crate::drivers::actuator::{Actuator, ActuatorState};
use crate::drivers::hw_timer::AlarmTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlarmMode {
    Idle = 0,
    Flame = 1,
    Motion = 2,
}

impl AlarmMode {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Flame,
            2 => Self::Motion,
            _ => Self::Idle,
        }
    }
}

/// State reachable from both the foreground and the timer handler.
pub(crate) struct AlarmShared<P: GpioPort + PwmPort> {
    mode: AtomicU8,
    /// Toggle flag for the period-2 pattern.
    phase: AtomicBool,
    actuator: critical_section::Mutex<RefCell<Actuator<P>>>,
    config: AlarmConfig,
}

impl<P: GpioPort + PwmPort> AlarmShared<P> {
    fn new(actuator: Actuator<P>, config: AlarmConfig) -> Self {
        Self {
            mode: AtomicU8::new(AlarmMode::Idle as u8),
            phase: AtomicBool::new(false),
            actuator: critical_section::Mutex::new(RefCell::new(actuator)),
            config,
        }
    }

    fn mode(&self) -> AlarmMode {
        AlarmMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    fn state(&self) -> ActuatorState {
        critical_section::with(|cs| self.actuator.borrow_ref(cs).state())
    }

    /// Drop to `Idle` and silence the outputs in one critical section.
    fn go_idle(&self, rgb_off: bool) {
        critical_section::with(|cs| {
            self.mode.store(AlarmMode::Idle as u8, Ordering::Release);
            let mut act = self.actuator.borrow_ref_mut(cs);
            if rgb_off {
                act.turn_off_rgb();
            }
            act.turn_off_buzzer();
        });
    }
}

pub struct Alarm<T, P>
where
    T: TimerPort,
    P: GpioPort + PwmPort + Send + 'static,
{
    timer: AlarmTimer<T>,
    shared: Arc<AlarmShared<P>>,
}

impl<T, P> Alarm<T, P>
where
    T: TimerPort,
    P: GpioPort + PwmPort + Send + 'static,
{
    /// Constructed idle; the timer is not started until a mode is activated.
    pub fn new(timer: T, actuator: Actuator<P>, config: &AlarmConfig) -> Self {
        Self {
            timer: AlarmTimer::new(timer, config.timer_basis_hz),
            shared: Arc::new(AlarmShared::new(actuator, *config)),
        }
    }

    // ── Flame ─────────────────────────────────────────────────

    /// Start the flame pattern, tearing down a running motion alarm first.
    ///
    /// Returns `false` if flame was already active.
    pub fn activate_flame_alarm(&mut self) -> bool {
        match self.mode() {
            AlarmMode::Flame => return false,
            AlarmMode::Motion => {
                self.deactivate_motion_alarm();
            }
            AlarmMode::Idle => {}
        }

        let cfg = self.shared.config;
        critical_section::with(|cs| {
            let mut act = self.shared.actuator.borrow_ref_mut(cs);
            act.set_rgb(cfg.flame_primary);
            act.set_buzzer_duration(cfg.tone_duration_ms);
            act.set_buzzer_frequency(cfg.flame_high_hz);
            act.turn_on_rgb();
            act.turn_on_buzzer();
            self.shared.phase.store(false, Ordering::Relaxed);
            self.shared.mode.store(AlarmMode::Flame as u8, Ordering::Release);
        });
        self.timer
            .start_periodic(cfg.period_ticks, handlers::flame_tick(Arc::clone(&self.shared)));

        info!("alarm: FLAME alarm active");
        true
    }

    pub fn deactivate_flame_alarm(&mut self) -> bool {
        if self.mode() != AlarmMode::Flame {
            return false;
        }
        self.timer.cancel();
        self.shared.go_idle(true);
        info!("alarm: flame alarm cleared");
        true
    }

    // ── Motion ────────────────────────────────────────────────

    /// Start the motion tone.  Ignored while the flame alarm runs.
    pub fn activate_motion_alarm(&mut self) -> bool {
        match self.mode() {
            AlarmMode::Motion => return false,
            AlarmMode::Flame => {
                warn!("alarm: motion activation ignored, flame alarm active");
                return false;
            }
            AlarmMode::Idle => {}
        }

        let cfg = self.shared.config;
        critical_section::with(|cs| {
            let mut act = self.shared.actuator.borrow_ref_mut(cs);
            act.set_buzzer_duration(cfg.tone_duration_ms);
            act.set_buzzer_frequency(cfg.motion_high_hz);
            act.turn_on_buzzer();
            self.shared.phase.store(false, Ordering::Relaxed);
            self.shared.mode.store(AlarmMode::Motion as u8, Ordering::Release);
        });
        self.timer
            .start_periodic(cfg.period_ticks, handlers::motion_tick(Arc::clone(&self.shared)));

        info!("alarm: MOTION alarm active");
        true
    }

    /// Stop the motion tone.  Ignored while the flame alarm runs.
    pub fn deactivate_motion_alarm(&mut self) -> bool {
        match self.mode() {
            AlarmMode::Idle => return false,
            AlarmMode::Flame => {
                warn!("alarm: motion deactivation ignored, flame alarm active");
                return false;
            }
            AlarmMode::Motion => {}
        }
        self.timer.cancel();
        // Motion never lit the LED; leave it as the caller set it.
        self.shared.go_idle(false);
        info!("alarm: motion alarm cleared");
        true
    }

    // ── Introspection / reconfiguration ───────────────────────

    pub fn is_flame_active(&self) -> bool {
        self.mode() == AlarmMode::Flame
    }

    pub fn is_motion_active(&self) -> bool {
        self.mode() == AlarmMode::Motion
    }

    pub fn mode(&self) -> AlarmMode {
        self.shared.mode()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn actuator_state(&self) -> ActuatorState {
        self.shared.state()
    }

    /// Swap in a new actuator bundle and hand back the old one.
    ///
    /// Whatever mode is running is torn down first, so the returned
    /// actuator is off and no tick can reach it.
    pub fn configure_actuator(&mut self, actuator: Actuator<P>) -> Actuator<P> {
        self.deactivate_flame_alarm();
        self.deactivate_motion_alarm();
        let old = critical_section::with(|cs| self.shared.actuator.replace(cs, actuator));
        info!("alarm: actuator reconfigured");
        old
    }
}

impl<T, P> Drop for Alarm<T, P>
where
    T: TimerPort,
    P: GpioPort + PwmPort + Send + 'static,
{
    fn drop(&mut self) {
        self.timer.cancel();
        self.shared.go_idle(true);
    }
}
