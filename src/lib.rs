// src/lib.rs

//! # Burst Gate
//!
//! A burst rate limiter for noisy event streams such as log lines. It admits a
//! fixed number of events per window, counts every event it turns away, and
//! hands that count to a callback exactly once when the next window opens, so
//! the caller can write a single "N events suppressed" notice.
//!
//! ## Quick Example
//!
//! ```rust
//! use burst_gate::RateLimiter;
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::new(Duration::from_secs(60), 6, |missed: u64| {
//!     eprintln!("suppressed {missed} log lines");
//! });
//!
//! for line in 0..10 {
//!     if limiter.allowed() {
//!         println!("log line {line}");
//!     }
//! }
//! ```
//!
//! Calls within budget cost one atomic increment. Over-budget calls take a
//! short lock to decide whether a new window has started.
//!
//! ## Turning throttling off
//!
//! ```rust
//! use burst_gate::RateLimiter;
//!
//! let limiter = RateLimiter::unbounded(|_: u64| {});
//! assert!(limiter.allowed());
//! ```
//!
//! ## Configuration strings
//!
//! ```rust
//! use burst_gate::{RateLimiter, RateLimiterConfig, SystemClock, TracingReporter};
//!
//! let config: RateLimiterConfig = "100/1s".parse().unwrap();
//! let limiter = RateLimiter::with_config(config, TracingReporter::new("access_log"), SystemClock);
//! assert_eq!(limiter.burst_capacity(), 100);
//! ```

// private modules
mod clock;
mod config;
mod errors;
mod handler;
mod keyed;
mod rate_limiter;

// public API exports
pub use clock::{Clock, SystemClock};
pub use config::{RateLimiterConfig, Replenish};
pub use errors::ConfigError;
pub use handler::{MissedHandler, TracingReporter};
pub use keyed::{KeyReporter, KeyedRateLimiter};
pub use rate_limiter::RateLimiter;
