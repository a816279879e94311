//! `critical-section` implementation for ESP-IDF builds.
//!
//! Backed by one process-wide mutex with a per-task nesting depth, so
//! nested `critical_section::with` calls on the same task do not
//! deadlock.  Only task-context code (foreground and the esp_timer task)
//! enters critical sections; GPIO ISRs touch atomics only.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

use critical_section::RawRestoreState;

static CRITICAL_SECTION_MUTEX: Mutex<()> = Mutex::new(());

thread_local! {
    static CRITICAL_SECTION_DEPTH: Cell<u8> = const { Cell::new(0) };
    static CRITICAL_SECTION_GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

struct TaskCriticalSection;
critical_section::set_impl!(TaskCriticalSection);

unsafe impl critical_section::Impl for TaskCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        CRITICAL_SECTION_DEPTH.with(|depth| {
            let d = depth.get();
            if d == 0 {
                // A panic inside a section leaves no broken invariant behind.
                let lock = CRITICAL_SECTION_MUTEX
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                CRITICAL_SECTION_GUARD.with(|guard| *guard.borrow_mut() = Some(lock));
            }
            depth.set(d.saturating_add(1));
        });
    }

    unsafe fn release(_token: RawRestoreState) {
        CRITICAL_SECTION_DEPTH.with(|depth| {
            let d = depth.get();
            if d == 0 {
                return;
            }
            depth.set(d - 1);
            if d == 1 {
                CRITICAL_SECTION_GUARD.with(|guard| *guard.borrow_mut() = None);
            }
        });
    }
}
