// tests/ratelimiter/concurrency_tests.rs

#[cfg(test)]
mod tests {

    use crate::fixtures::recorder::Recorder;
    use crate::fixtures::test_clock::TestClock;
    use burst_gate::RateLimiter;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::thread;
    use std::time::Duration;

    const THREADS: usize = 16;

    fn count_denied<C: burst_gate::Clock>(limiter: &RateLimiter<C>, calls: usize) -> u64 {
        (0..calls).filter(|_| !limiter.allowed()).count() as u64
    }

    #[test]
    fn unbounded_limiter_never_denies() {
        let missed = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&missed);
        let limiter = Arc::new(RateLimiter::unbounded(move |n: u64| {
            sink.fetch_add(n, Ordering::Relaxed);
        }));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || count_denied(&limiter, 500_000))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0);
        }
        assert_eq!(missed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn frozen_clock_admits_exactly_one_burst() {
        let clock = TestClock::new();
        let recorder = Recorder::new();
        let limiter = Arc::new(RateLimiter::with_clock(
            Duration::from_secs(1),
            1_000,
            recorder.handler(),
            clock.clone(),
        ));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || count_denied(&limiter, 10_000))
            })
            .collect();
        let denied: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(denied, (THREADS as u64 * 10_000) - 1_000);
        assert!(recorder.reports().is_empty());

        clock.advance(Duration::from_secs(1));
        assert!(limiter.allowed());
        assert_eq!(recorder.reports(), vec![denied]);
    }

    #[test]
    fn reports_stay_exact_while_windows_turn_over() {
        let clock = TestClock::new();
        let recorder = Recorder::new();
        let interval = Duration::from_millis(1);
        let limiter = Arc::new(RateLimiter::with_clock(
            interval,
            50,
            recorder.handler(),
            clock.clone(),
        ));

        let done = Arc::new(AtomicBool::new(false));
        let ticker = {
            let clock = clock.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    clock.advance(interval);
                    thread::yield_now();
                }
            })
        };

        let handles: Vec<_> = (0..THREADS / 2)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || count_denied(&limiter, 100_000))
            })
            .collect();
        let denied: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        done.store(true, Ordering::Relaxed);
        ticker.join().unwrap();

        // force one more window so the last denials are reported
        clock.advance(interval);
        assert!(limiter.allowed());

        assert_eq!(recorder.total(), denied);
        assert!(recorder.reports().iter().all(|&missed| missed > 0));
    }

    // Five per nanosecond is only "never limited" on a clock that advances
    // between any two reads. `Instant::now` can return the same value to
    // calls landing in one tick (and ticks are coarser on some virtualised
    // clock sources), so a sixth call in that tick is denied. Zero denials
    // is therefore not asserted. What must hold is that every denial is
    // reported exactly once.
    #[test]
    fn system_clock_reports_stay_exact() {
        let missed = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&missed);
        let limiter = Arc::new(RateLimiter::new(
            Duration::from_nanos(1),
            5,
            move |n: u64| {
                sink.fetch_add(n, Ordering::Relaxed);
            },
        ));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || count_denied(&limiter, 50_000))
            })
            .collect();
        let denied: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        thread::sleep(Duration::from_millis(1));
        assert!(limiter.allowed());
        assert_eq!(missed.load(Ordering::Relaxed), denied);
    }
}
