//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the recording mock platform.  All tests run on the host with
//! no real hardware required.

#![cfg(not(target_os = "espidf"))]

mod alarm_tests;
mod mock_hw;
mod sensor_tests;
