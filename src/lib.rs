//! Firewatch firmware library.
//!
//! Flame/motion alarm with buzzer and RGB feedback plus ambient light
//! sensing.  Domain logic is platform-agnostic over the port traits in
//! [`app::ports`]; ESP-IDF code is guarded by
//! `#[cfg(target_os = "espidf")]` and the host build ships a simulation
//! adapter for tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod alarm;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod sensors;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
