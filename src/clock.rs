// src/clock.rs

// clock module definition and implementations

// dependencies
use std::sync::Arc;
use std::time::Instant;

/// Clock trait to abstract time retrieval.
/// Implementors must be thread-safe (Send + Sync).
/// The `now` method returns the current monotonic instant.
/// The RateLimiter only reads the clock on its slow path, so a test clock can
/// hold time still or step it forward without touching limiter logic.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// SystemClock implementation using `Instant::now()`.
/// This is the default clock used by the RateLimiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
