//! The alarm's periodic hardware timer.
//!
//! Both boards have very few independent periodic-interrupt timers, so
//! one [`TimerPort`] instance is shared by every alarm mode.  This wrapper
//! owns it and serialises access: arming a new callback always tears the
//! previous one down first, and cancelling is synchronous.

use log::debug;

use crate::app::ports::{IsrHandler, TimerPort};

pub struct AlarmTimer<T: TimerPort> {
    timer: T,
    basis_hz: u32,
    armed: bool,
}

impl<T: TimerPort> AlarmTimer<T> {
    pub fn new(timer: T, basis_hz: u32) -> Self {
        Self {
            timer,
            basis_hz,
            armed: false,
        }
    }

    /// Invoke `handler` every `period_ticks` until [`cancel`](Self::cancel).
    pub fn start_periodic(&mut self, period_ticks: u64, handler: IsrHandler) {
        self.cancel();
        self.timer.begin(self.basis_hz);
        self.timer.attach_interrupt(handler);
        self.timer.set_alarm(period_ticks, true);
        self.armed = true;
        debug!("hw_timer: armed, period={} ticks @ {}Hz", period_ticks, self.basis_hz);
    }

    /// Detach and stop.  No callback fires after this returns.
    pub fn cancel(&mut self) {
        if !self.armed {
            return;
        }
        self.timer.detach_interrupt();
        self.timer.stop();
        self.armed = false;
        debug!("hw_timer: cancelled");
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl<T: TimerPort> Drop for AlarmTimer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
