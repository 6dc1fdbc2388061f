// src/rate_limiter.rs

// burst-gate: a burst rate limiter with exact accounting of suppressed events.

// dependencies
use crate::clock::{Clock, SystemClock};
use crate::config::{RateLimiterConfig, Replenish};
use crate::handler::MissedHandler;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// State that only changes under the window lock.
#[derive(Debug)]
struct Window {
    start: Instant,
    missed: u64,
}

/// The main RateLimiter model.
///
/// Admits at most `burst_capacity` calls to [`allowed`](Self::allowed) per
/// window. Calls that are denied are counted, and the count is handed to the
/// [`MissedHandler`] once, when the next window opens.
///
/// Callers within budget pay for a single atomic increment (a compare-and-swap
/// in proportional mode). Only callers that are already over budget take the
/// window lock and read the clock.
///
/// C is the clock type, defaulting to SystemClock.
pub struct RateLimiter<C = SystemClock>
where
    C: Clock,
{
    admitted: AtomicU64,
    burst_capacity: u64,
    interval: Duration,
    replenish: Replenish,
    window: Mutex<Window>,
    handler: Box<dyn MissedHandler>,
    clock: C,
}

impl RateLimiter<SystemClock> {
    /// Create a limiter on the system clock admitting `burst_capacity` events
    /// per `interval`. A zero capacity is treated as one and a zero interval as
    /// one nanosecond.
    pub fn new<H>(interval: Duration, burst_capacity: u64, handler: H) -> Self
    where
        H: MissedHandler + 'static,
    {
        Self::with_clock(interval, burst_capacity, handler, SystemClock)
    }

    /// Create a limiter that never denies, for when throttling is switched off
    /// but callers still go through a limiter.
    pub fn unbounded<H>(handler: H) -> Self
    where
        H: MissedHandler + 'static,
    {
        Self::unbounded_with_clock(handler, SystemClock)
    }
}

// methods for the RateLimiter type
impl<C> RateLimiter<C>
where
    C: Clock,
{
    // method to create a new rate limiter on an injected clock
    pub fn with_clock<H>(interval: Duration, burst_capacity: u64, handler: H, clock: C) -> Self
    where
        H: MissedHandler + 'static,
    {
        Self::with_config(RateLimiterConfig::new(burst_capacity, interval), handler, clock)
    }

    // method to create a new rate limiter from a config object
    pub fn with_config<H>(config: RateLimiterConfig, handler: H, clock: C) -> Self
    where
        H: MissedHandler + 'static,
    {
        Self::from_boxed(config, Box::new(handler), clock)
    }

    pub fn unbounded_with_clock<H>(handler: H, clock: C) -> Self
    where
        H: MissedHandler + 'static,
    {
        Self::with_config(RateLimiterConfig::unbounded(), handler, clock)
    }

    pub(crate) fn from_boxed(
        config: RateLimiterConfig,
        handler: Box<dyn MissedHandler>,
        clock: C,
    ) -> Self {
        let config = config.normalized();
        let start = clock.now();

        Self {
            admitted: AtomicU64::new(0),
            burst_capacity: config.burst_capacity,
            interval: config.interval,
            replenish: config.replenish,
            window: Mutex::new(Window { start, missed: 0 }),
            handler,
            clock,
        }
    }

    // accessor method to return the burst capacity after clamping
    pub fn burst_capacity(&self) -> u64 {
        self.burst_capacity
    }

    // accessor method to return the replenish interval after clamping
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn replenish(&self) -> Replenish {
        self.replenish
    }

    /// Decide whether one event may proceed now.
    ///
    /// Returns `false` when the event must be dropped. When this call opens a
    /// new window and the previous one denied events, the handler receives the
    /// denied count before this method returns.
    pub fn allowed(&self) -> bool {
        match self.replenish {
            Replenish::FullWindow => {
                let count = self.admitted.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
                if count <= self.burst_capacity {
                    return true;
                }
                self.allowed_slow()
            }
            Replenish::Proportional => self.take_slot() || self.allowed_slow(),
        }
    }

    // Claims one admission only if the budget has room, so an over-budget
    // caller leaves the count untouched.
    fn take_slot(&self) -> bool {
        self.admitted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < self.burst_capacity).then_some(count + 1)
            })
            .is_ok()
    }

    #[cold]
    fn allowed_slow(&self) -> bool {
        let reported = {
            let mut window = self.lock_window();

            if self.admitted_while_waiting() {
                return true;
            }

            let now = self.clock.now();
            let elapsed = now.saturating_duration_since(window.start);

            let opened = match self.replenish {
                Replenish::FullWindow => self.open_full_window(&mut window, now, elapsed),
                Replenish::Proportional => self.credit_proportional(&mut window, now, elapsed),
            };
            if !opened {
                window.missed += 1;
                return false;
            }
            std::mem::take(&mut window.missed)
        };

        tracing::trace!(
            target: "burst_gate",
            burst_capacity = self.burst_capacity,
            missed = reported,
            "rate limiter window replenished"
        );
        if reported > 0 {
            self.handler.on_missed(reported);
        }
        true
    }

    // The budget may have changed between this caller's first attempt and
    // the lock.
    fn admitted_while_waiting(&self) -> bool {
        match self.replenish {
            // Only a reset lowers the count, and it overwrote our increment,
            // so count this call again.
            Replenish::FullWindow => {
                self.admitted.load(Ordering::Acquire) <= self.burst_capacity
                    && self.admitted.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
                        <= self.burst_capacity
            }
            // credit granted by another caller
            Replenish::Proportional => self.take_slot(),
        }
    }

    // Full reset once a whole interval has passed. The triggering call is the
    // first admission of the new window.
    fn open_full_window(&self, window: &mut Window, now: Instant, elapsed: Duration) -> bool {
        if elapsed < self.interval {
            return false;
        }
        self.admitted.store(1, Ordering::Release);
        window.start = now;
        true
    }

    // Credit `burst / interval` admissions per unit of elapsed time, truncated,
    // then claim one of them for this call.
    fn credit_proportional(&self, window: &mut Window, now: Instant, elapsed: Duration) -> bool {
        let interval_nanos = self.interval.as_nanos();
        let credits = elapsed.as_nanos().saturating_mul(u128::from(self.burst_capacity))
            / interval_nanos;
        let credits = u64::try_from(credits).unwrap_or(u64::MAX);

        if credits == 0 {
            return false;
        }

        // relative update: fast-path claims racing with the credit are kept
        let (Ok(used) | Err(used)) = self.admitted.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |used| Some(used.saturating_sub(credits)),
        );
        if credits >= used {
            window.start = now;
        } else {
            let advance = interval_nanos * u128::from(credits) / u128::from(self.burst_capacity);
            let advance = Duration::from_nanos(u64::try_from(advance).unwrap_or(u64::MAX));
            window.start = (window.start + advance).min(now);
        }

        // fast-path callers may already have taken every credited slot
        self.take_slot()
    }

    // Takes the missed count of a window that has been open for at least
    // `max_age` (never less than the interval). None while the window is younger.
    pub(crate) fn drain_expired(&self, now: Instant, max_age: Duration) -> Option<u64> {
        let mut window = self.lock_window();
        if now.saturating_duration_since(window.start) < max_age.max(self.interval) {
            return None;
        }
        Some(std::mem::take(&mut window.missed))
    }

    // The guarded state is fully written before any code that could panic
    // runs outside the lock, so a poisoned lock still holds consistent data.
    fn lock_window(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> fmt::Debug for RateLimiter<C>
where
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("burst_capacity", &self.burst_capacity)
            .field("interval", &self.interval)
            .field("replenish", &self.replenish)
            .field("admitted", &self.admitted.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
