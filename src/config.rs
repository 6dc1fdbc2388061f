// src/config.rs

//! Configuration types for the burst gate

// dependencies
use crate::errors::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// Burst capacity used by the unbounded preset. No realistic process issues
/// this many calls against a single limiter.
pub(crate) const UNBOUNDED_BURST: u64 = 1 << 56;

/// Shortest window a limiter accepts.
pub(crate) const MIN_INTERVAL: Duration = Duration::from_nanos(1);

/// How budget comes back once a window has been exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Replenish {
    /// The whole budget is restored once a full interval has elapsed since the
    /// window started. Nothing is restored before that.
    #[default]
    FullWindow,
    /// Budget is restored in proportion to elapsed time: `burst / interval`
    /// events per unit of time, truncated. Decisions near a window boundary
    /// differ from `FullWindow`.
    Proportional,
}

/// Configuration for rate limiter behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    pub(crate) burst_capacity: u64,
    pub(crate) interval: Duration,
    pub(crate) replenish: Replenish,
}

impl RateLimiterConfig {
    /// Create a new configuration admitting `burst_capacity` events per `interval`
    pub fn new(burst_capacity: u64, interval: Duration) -> Self {
        Self {
            burst_capacity,
            interval,
            replenish: Replenish::FullWindow,
        }
    }

    /// Configuration that effectively never limits.
    pub fn unbounded() -> Self {
        Self::new(UNBOUNDED_BURST, MIN_INTERVAL)
    }

    /// Builder-style: set burst capacity
    pub fn burst(mut self, burst_capacity: u64) -> Self {
        self.burst_capacity = burst_capacity;
        self
    }

    /// Builder-style: set the replenish interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Builder-style: set the replenish mode
    pub fn replenish(mut self, replenish: Replenish) -> Self {
        self.replenish = replenish;
        self
    }

    pub fn burst_capacity(&self) -> u64 {
        self.burst_capacity
    }

    pub fn replenish_interval(&self) -> Duration {
        self.interval
    }

    pub fn replenish_mode(&self) -> Replenish {
        self.replenish
    }

    /// Clamp out-of-range settings to the nearest valid value.
    ///
    /// A capacity of zero becomes one and an interval shorter than one
    /// nanosecond becomes one nanosecond. Limiters always run on a normalized
    /// configuration.
    pub fn normalized(self) -> Self {
        Self {
            burst_capacity: self.burst_capacity.max(1),
            interval: self.interval.max(MIN_INTERVAL),
            replenish: self.replenish,
        }
    }
}

/// Parses `"<burst>/<interval>"`, e.g. `"6/1m"`, `"100/250ms"` or `"10/s"`.
///
/// A leading `proportional:` selects [`Replenish::Proportional`]. Values are
/// not clamped here; that happens when a limiter is built from the config.
impl FromStr for RateLimiterConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (replenish, rest) = match s.strip_prefix("proportional:") {
            Some(rest) => (Replenish::Proportional, rest),
            None => (Replenish::FullWindow, s),
        };

        let (burst, interval) = rest.split_once('/').ok_or(ConfigError::MissingSeparator)?;
        let burst = burst.trim();
        let burst_capacity = burst
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidBurst(burst.to_string()))?;
        let interval = parse_interval(interval.trim())?;

        Ok(Self::new(burst_capacity, interval).replenish(replenish))
    }
}

fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (magnitude, unit) = raw.split_at(split);

    // "10/s" reads as ten per second
    let magnitude = if magnitude.is_empty() {
        if unit.is_empty() {
            return Err(ConfigError::InvalidInterval(raw.to_string()));
        }
        1
    } else {
        magnitude
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidInterval(raw.to_string()))?
    };

    let overflow = || ConfigError::InvalidInterval(raw.to_string());
    match unit.trim() {
        "ns" => Ok(Duration::from_nanos(magnitude)),
        "us" => Ok(Duration::from_micros(magnitude)),
        "ms" => Ok(Duration::from_millis(magnitude)),
        "s" => Ok(Duration::from_secs(magnitude)),
        "m" => magnitude
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(overflow),
        "h" => magnitude
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(overflow),
        other => Err(ConfigError::UnknownUnit(other.to_string())),
    }
}
