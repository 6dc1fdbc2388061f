// src/keyed.rs

// independent rate limiters per throttling point, sharing one configuration

// dependencies
use crate::clock::{Clock, SystemClock};
use crate::config::RateLimiterConfig;
use crate::rate_limiter::RateLimiter;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Callback receiving the key whose window closed and its denied count.
pub type KeyReporter<K> = Arc<dyn Fn(&K, u64) + Send + Sync>;

/// A set of [`RateLimiter`]s keyed by throttling point.
///
/// Each key (a call site, a message template, a client id) gets its own
/// budget, created on first use from the shared configuration. Suppression
/// reports for every key go to one reporter along with the key.
///
/// K is the key type. C is the clock type, defaulting to SystemClock; every
/// per-key limiter gets a clone of it.
pub struct KeyedRateLimiter<K, C = SystemClock>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    C: Clock + Clone,
{
    config: RateLimiterConfig,
    clock: C,
    reporter: KeyReporter<K>,
    limiters: DashMap<K, Arc<RateLimiter<C>>>,
}

impl<K> KeyedRateLimiter<K, SystemClock>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
{
    pub fn new<R>(config: RateLimiterConfig, reporter: R) -> Self
    where
        R: Fn(&K, u64) + Send + Sync + 'static,
    {
        Self::with_clock(config, SystemClock, reporter)
    }
}

impl<K, C> KeyedRateLimiter<K, C>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    C: Clock + Clone,
{
    pub fn with_clock<R>(config: RateLimiterConfig, clock: C, reporter: R) -> Self
    where
        R: Fn(&K, u64) + Send + Sync + 'static,
    {
        Self {
            config: config.normalized(),
            clock,
            reporter: Arc::new(reporter),
            limiters: DashMap::new(),
        }
    }

    /// Decide whether one event for `key` may proceed now.
    ///
    /// The map guard is released before the key's limiter runs, so the
    /// reporter may call back into this set.
    pub fn allowed<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let limiter = self.limiter_for(key);
        limiter.allowed()
    }

    fn limiter_for<Q>(&self, key: &Q) -> Arc<RateLimiter<C>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(existing) = self.limiters.get(key) {
            return Arc::clone(existing.value());
        }

        let limiter = match self.limiters.entry(key.to_owned()) {
            Entry::Occupied(entry) => return Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let limiter = Arc::new(self.build(entry.key().clone()));
                entry.insert(Arc::clone(&limiter));
                limiter
            }
        };
        tracing::debug!(
            target: "burst_gate",
            burst_capacity = self.config.burst_capacity,
            "tracking rate limiter for new key"
        );
        limiter
    }

    fn build(&self, key: K) -> RateLimiter<C> {
        let reporter = Arc::clone(&self.reporter);
        RateLimiter::from_boxed(
            self.config.clone(),
            Box::new(move |missed: u64| reporter(&key, missed)),
            self.clock.clone(),
        )
    }

    /// Drop every key whose window opened at least `max_idle` ago, reporting
    /// any missed count it still holds. Returns the number of keys dropped.
    ///
    /// `max_idle` is raised to the configured interval, so a dropped key was
    /// already due a full refill and a later call simply starts it afresh.
    /// A call racing with the sweep on the same key may land on the dropped
    /// limiter.
    pub fn cleanup_stale_keys(&self, max_idle: Duration) -> usize {
        let now = self.clock.now();
        let mut dropped = Vec::new();
        self.limiters
            .retain(|key, limiter| match limiter.drain_expired(now, max_idle) {
                Some(missed) => {
                    dropped.push((key.clone(), missed));
                    false
                }
                None => true,
            });

        // the shard locks are released by now
        for (key, missed) in &dropped {
            if *missed > 0 {
                (self.reporter)(key, *missed);
            }
        }
        if !dropped.is_empty() {
            tracing::debug!(
                target: "burst_gate",
                dropped = dropped.len(),
                remaining = self.limiters.len(),
                "dropped stale rate limiter keys"
            );
        }
        dropped.len()
    }

    /// Forget a key. Events it denied since its last window are not reported.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.limiters.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

impl<K, C> fmt::Debug for KeyedRateLimiter<K, C>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    C: Clock + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedRateLimiter")
            .field("config", &self.config)
            .field("keys", &self.limiters.len())
            .finish_non_exhaustive()
    }
}
