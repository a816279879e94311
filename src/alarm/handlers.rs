//! Timer tick callbacks.
//!
//! Both run in interrupt context: no logging, no allocation, one short
//! critical section.  Each re-checks the mode it was armed for inside
//! that critical section, so a tick racing a deactivation is a no-op.

use std::sync::Arc;
use core::sync::atomic::Ordering;

use crate::app::ports::{GpioPort, IsrHandler, PwmPort};

use super::{AlarmMode, AlarmShared};

pub(super) fn flame_tick<P>(shared: Arc<AlarmShared<P>>) -> IsrHandler
where
    P: GpioPort + PwmPort + Send + 'static,
{
    Arc::new(move || shared.on_flame_tick())
}

pub(super) fn motion_tick<P>(shared: Arc<AlarmShared<P>>) -> IsrHandler
where
    P: GpioPort + PwmPort + Send + 'static,
{
    Arc::new(move || shared.on_motion_tick())
}

impl<P: GpioPort + PwmPort> AlarmShared<P> {
    /// Alternate primary/high and secondary/low, period 2.
    pub(super) fn on_flame_tick(&self) {
        critical_section::with(|cs| {
            if self.mode() != AlarmMode::Flame {
                return;
            }
            let cfg = &self.config;
            let mut act = self.actuator.borrow_ref_mut(cs);
            if self.phase.load(Ordering::Relaxed) {
                act.set_buzzer_frequency(cfg.flame_high_hz);
                act.set_rgb(cfg.flame_primary);
                self.phase.store(false, Ordering::Relaxed);
            } else {
                act.set_buzzer_frequency(cfg.flame_low_hz);
                act.set_rgb(cfg.flame_secondary);
                self.phase.store(true, Ordering::Relaxed);
            }
        });
    }

    /// Tone-only alternation; the LED is left alone.
    pub(super) fn on_motion_tick(&self) {
        critical_section::with(|cs| {
            if self.mode() != AlarmMode::Motion {
                return;
            }
            let cfg = &self.config;
            let mut act = self.actuator.borrow_ref_mut(cs);
            act.turn_on_buzzer();
            if self.phase.load(Ordering::Relaxed) {
                act.set_buzzer_frequency(cfg.motion_high_hz);
                self.phase.store(false, Ordering::Relaxed);
            } else {
                act.set_buzzer_frequency(cfg.motion_low_hz);
                self.phase.store(true, Ordering::Relaxed);
            }
        });
    }
}
