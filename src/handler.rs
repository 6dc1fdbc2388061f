// src/handler.rs

// reporting of suppressed events

// dependencies
use std::borrow::Cow;
use tracing::Level;

/// Receives the number of events a limiter denied during a window that has
/// just ended.
///
/// `on_missed` is only called with a positive count, at most once per window
/// transition, and never while the limiter holds its internal lock, so an
/// implementation may log, allocate or call back into the limiter.
/// Implementations must not assume any particular cadence.
pub trait MissedHandler: Send + Sync {
    fn on_missed(&self, missed: u64);
}

impl<F> MissedHandler for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_missed(&self, missed: u64) {
        self(missed)
    }
}

/// Handler that turns each report into a single `tracing` event.
///
/// Events are emitted with target `burst_gate`, a `limiter` field carrying the
/// label and a `suppressed` field carrying the count. The default level is
/// `WARN`.
///
/// ```rust
/// use burst_gate::{RateLimiter, TracingReporter};
/// use std::time::Duration;
///
/// let limiter = RateLimiter::new(
///     Duration::from_secs(1),
///     100,
///     TracingReporter::new("http_access_log"),
/// );
/// if limiter.allowed() {
///     tracing::info!("GET /health 200");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TracingReporter {
    label: Cow<'static, str>,
    level: Level,
}

impl TracingReporter {
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            level: Level::WARN,
        }
    }

    /// Builder-style: set the level of the emitted events
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl MissedHandler for TracingReporter {
    fn on_missed(&self, missed: u64) {
        let limiter = self.label.as_ref();
        if self.level == Level::ERROR {
            tracing::error!(target: "burst_gate", limiter, suppressed = missed, "suppressed {missed} events");
        } else if self.level == Level::WARN {
            tracing::warn!(target: "burst_gate", limiter, suppressed = missed, "suppressed {missed} events");
        } else if self.level == Level::INFO {
            tracing::info!(target: "burst_gate", limiter, suppressed = missed, "suppressed {missed} events");
        } else if self.level == Level::DEBUG {
            tracing::debug!(target: "burst_gate", limiter, suppressed = missed, "suppressed {missed} events");
        } else {
            tracing::trace!(target: "burst_gate", limiter, suppressed = missed, "suppressed {missed} events");
        }
    }
}
