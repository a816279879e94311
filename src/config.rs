//! System configuration parameters
//!
//! Timing, tone and threshold constants for both supported boards.
//! The two board profiles differ only in values, never in behaviour.

use serde::{Deserialize, Serialize};

use crate::drivers::rgb_led::{BlueChannel, Rgb, COLOUR_BLUE, COLOUR_RED};
use crate::error::{ConfigError, Result};

/// Which board variant the firmware is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardProfile {
    /// ESP32: esp_timer + LEDC, 12-bit ADC.
    Esp32,
    /// AVR (Uno-class): Timer1 + analogWrite, 10-bit ADC, digital-only blue.
    AvrUno,
}

/// Alarm timer and actuator pattern parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Timer counter frequency (ticks per second).
    pub timer_basis_hz: u32,
    /// Ticks between alarm callbacks.
    pub period_ticks: u64,
    /// Flame alarm: tone paired with the primary colour.
    pub flame_high_hz: u32,
    /// Flame alarm: tone paired with the secondary colour.
    pub flame_low_hz: u32,
    pub flame_primary: Rgb,
    pub flame_secondary: Rgb,
    pub motion_high_hz: u32,
    pub motion_low_hz: u32,
    /// Tone duration handed to the buzzer (0 = continuous).
    pub tone_duration_ms: u32,
}

/// Upper bounds (inclusive) of the three lower light bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightThresholds {
    pub dark_max: u16,
    pub low_max: u16,
    pub normal_max: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwmConfig {
    /// LEDC carrier for the RGB channels.
    pub rgb_freq_hz: u32,
    /// Fan H-bridge carrier.
    pub fan_freq_hz: u32,
    pub resolution_bits: u8,
    pub blue_channel: BlueChannel,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub board: BoardProfile,
    pub alarm: AlarmConfig,
    pub light: LightThresholds,
    pub pwm: PwmConfig,
}

impl SystemConfig {
    /// Constants for the given board variant.
    pub fn for_board(board: BoardProfile) -> Self {
        match board {
            BoardProfile::Esp32 => Self {
                board,
                alarm: AlarmConfig {
                    timer_basis_hz: 1_000_000,
                    period_ticks: 250_000, // 250ms
                    flame_high_hz: 1000,
                    flame_low_hz: 500,
                    flame_primary: COLOUR_RED,
                    flame_secondary: COLOUR_BLUE,
                    motion_high_hz: 1000,
                    motion_low_hz: 500,
                    tone_duration_ms: 0,
                },
                light: LightThresholds {
                    dark_max: 1000,
                    low_max: 2000,
                    normal_max: 4000,
                },
                pwm: PwmConfig {
                    rgb_freq_hz: 12_000,
                    fan_freq_hz: 25_000,
                    resolution_bits: 8,
                    blue_channel: BlueChannel::Pwm,
                },
            },
            BoardProfile::AvrUno => Self {
                board,
                alarm: AlarmConfig {
                    timer_basis_hz: 1_000_000,
                    period_ticks: 100_000, // Timer1 period in µs
                    flame_high_hz: 1000,
                    flame_low_hz: 700,
                    flame_primary: COLOUR_RED,
                    flame_secondary: COLOUR_BLUE,
                    motion_high_hz: 1000,
                    motion_low_hz: 500,
                    tone_duration_ms: 0,
                },
                light: LightThresholds {
                    dark_max: 100,
                    low_max: 400,
                    normal_max: 600,
                },
                pwm: PwmConfig {
                    rgb_freq_hz: 490, // analogWrite default
                    fan_freq_hz: 490,
                    resolution_bits: 8,
                    blue_channel: BlueChannel::Digital,
                },
            },
        }
    }

    /// Reject values that would silence the alarm or break level mapping.
    pub fn validate(&self) -> Result<()> {
        let a = &self.alarm;
        if a.timer_basis_hz == 0 {
            return Err(ConfigError::ZeroTimerBasis.into());
        }
        if a.period_ticks == 0 {
            return Err(ConfigError::ZeroAlarmPeriod.into());
        }
        let period_us = a
            .period_ticks
            .checked_mul(1_000_000)
            .map(|t| t / u64::from(a.timer_basis_hz));
        if !period_us.is_some_and(|us| us <= u64::from(u32::MAX)) {
            return Err(ConfigError::AlarmPeriodTooLong.into());
        }
        if [a.flame_high_hz, a.flame_low_hz, a.motion_high_hz, a.motion_low_hz].contains(&0) {
            return Err(ConfigError::ZeroToneFrequency.into());
        }
        let l = &self.light;
        if !(l.dark_max < l.low_max && l.low_max < l.normal_max) {
            return Err(ConfigError::ThresholdsNotAscending.into());
        }
        if !(1..=16).contains(&self.pwm.resolution_bits) {
            return Err(ConfigError::PwmResolution.into());
        }
        Ok(())
    }

    /// Parse a JSON blob (e.g. from a provisioning channel) and validate it.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Alarm period in microseconds, whatever the timer basis.  Saturates
    /// on configs that skipped [`validate`](Self::validate).
    pub fn alarm_period_us(&self) -> u64 {
        let basis = u64::from(self.alarm.timer_basis_hz.max(1));
        self.alarm.period_ticks.saturating_mul(1_000_000) / basis
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self::for_board(BoardProfile::Esp32)
    }
}
