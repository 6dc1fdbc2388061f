// src/errors.rs

// error handling for configuration strings

// dependencies
use std::error::Error;
use std::fmt;

/// Error returned when a `RateLimiterConfig` cannot be parsed from a string.
///
/// The limiter itself never fails: numeric settings that are out of range are
/// clamped, so this type only describes malformed text.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingSeparator,        // no '/' between burst and interval
    InvalidBurst(String),    // burst is not an unsigned integer
    InvalidInterval(String), // interval magnitude is not an unsigned integer
    UnknownUnit(String),     // interval suffix is not one of ns, us, ms, s, m, h
}

// implement the Display trait for the ConfigError type
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MissingSeparator => {
                write!(f, "expected '<burst>/<interval>', e.g. '6/1m'")
            }
            ConfigError::InvalidBurst(raw) => write!(f, "invalid burst capacity: {raw:?}"),
            ConfigError::InvalidInterval(raw) => write!(f, "invalid interval: {raw:?}"),
            ConfigError::UnknownUnit(unit) => {
                write!(f, "unknown interval unit {unit:?} (use ns, us, ms, s, m or h)")
            }
        }
    }
}

// implement the Error trait for the ConfigError type
impl Error for ConfigError {}
