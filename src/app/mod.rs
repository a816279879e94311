//! Application boundary.
//!
//! Everything the firmware needs from a board is expressed as a **port
//! trait** in [`ports`], keeping drivers, sensors and the alarm arbiter
//! testable without real peripherals.

pub mod ports;
