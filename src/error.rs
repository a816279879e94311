//! Unified error types for the Firewatch firmware.
//!
//! Alarm, sensor and actuator operations are infallible by contract, so
//! errors only come out of configuration loading and board bring-up.
//! All variants are `Copy` so they can be passed around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// A vendor peripheral call returned an error code.
    Platform { op: &'static str, code: i32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Platform { op, code } => write!(f, "platform: {op} failed (rc={code})"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The blob is not valid JSON for [`SystemConfig`](crate::config::SystemConfig).
    Malformed,
    /// Timer counter frequency of zero.
    ZeroTimerBasis,
    /// Alarm period of zero ticks.
    ZeroAlarmPeriod,
    /// Alarm period longer than `u32::MAX` microseconds.
    AlarmPeriodTooLong,
    /// A tone frequency of zero would silence the alarm.
    ZeroToneFrequency,
    /// Light thresholds must be strictly ascending.
    ThresholdsNotAscending,
    /// PWM resolution outside 1..=16 bits.
    PwmResolution,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed config blob"),
            Self::ZeroTimerBasis => write!(f, "timer basis must be non-zero"),
            Self::ZeroAlarmPeriod => write!(f, "alarm period must be non-zero"),
            Self::AlarmPeriodTooLong => write!(f, "alarm period exceeds u32::MAX us"),
            Self::ZeroToneFrequency => write!(f, "tone frequencies must be non-zero"),
            Self::ThresholdsNotAscending => write!(f, "light thresholds not ascending"),
            Self::PwmResolution => write!(f, "PWM resolution must be 1..=16 bits"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
