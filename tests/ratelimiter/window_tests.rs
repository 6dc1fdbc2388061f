// tests/ratelimiter/window_tests.rs

#[cfg(test)]
mod tests {

    use crate::fixtures::recorder::Recorder;
    use crate::fixtures::test_clock::TestClock;
    use burst_gate::RateLimiter;
    use std::time::Duration;

    const BURST: u64 = 6;
    const INTERVAL: Duration = Duration::from_secs(60);

    #[test]
    fn first_burst_is_admitted_then_denied() {
        let clock = TestClock::new();
        let limiter = RateLimiter::with_clock(INTERVAL, BURST, |_: u64| {}, clock);

        for i in 0..BURST {
            assert!(limiter.allowed(), "call {} should be admitted", i + 1);
        }
        assert!(!limiter.allowed());
    }

    #[test]
    fn full_minute_cycle() {
        let clock = TestClock::new();
        let recorder = Recorder::new();
        let limiter = RateLimiter::with_clock(INTERVAL, BURST, recorder.handler(), clock.clone());

        for i in 0..BURST {
            assert!(limiter.allowed(), "call {} should be admitted", i + 1);
        }
        assert!(!limiter.allowed());

        // half an interval earns nothing
        clock.advance(INTERVAL / 2);
        assert!(!limiter.allowed());
        assert!(recorder.reports().is_empty());

        clock.advance(INTERVAL / 2);
        assert_eq!(clock.elapsed(), INTERVAL);
        for i in 0..BURST {
            assert!(limiter.allowed(), "call {} of new window should be admitted", i + 1);
        }
        assert_eq!(recorder.reports(), vec![2]);

        for i in 0..BURST {
            assert!(!limiter.allowed(), "call {} past budget should be denied", i + 1);
        }
        assert_eq!(recorder.reports(), vec![2]);
    }

    #[test]
    fn window_restarts_from_the_reset_instant() {
        let clock = TestClock::new();
        let limiter = RateLimiter::with_clock(INTERVAL, 1, |_: u64| {}, clock.clone());

        assert!(limiter.allowed());

        // a late reset starts the next window at the late instant
        clock.advance(INTERVAL * 3 / 2);
        assert!(limiter.allowed());
        assert!(!limiter.allowed());

        clock.advance(INTERVAL / 2);
        assert!(!limiter.allowed());

        clock.advance(INTERVAL / 2);
        assert!(limiter.allowed());
    }

    #[test]
    fn long_idle_period_opens_one_window() {
        let clock = TestClock::new();
        let recorder = Recorder::new();
        let limiter = RateLimiter::with_clock(INTERVAL, 2, recorder.handler(), clock.clone());

        assert!(limiter.allowed());
        assert!(limiter.allowed());
        assert!(!limiter.allowed());

        clock.advance(INTERVAL * 100);
        assert!(limiter.allowed());
        assert!(limiter.allowed());
        assert!(!limiter.allowed());
        assert_eq!(recorder.reports(), vec![1]);
    }

    #[test]
    fn time_passing_within_budget_changes_nothing() {
        let clock = TestClock::new();
        let limiter = RateLimiter::with_clock(INTERVAL, BURST, |_: u64| {}, clock.clone());

        // time passing does not matter while the budget holds
        for _ in 0..BURST {
            clock.advance(INTERVAL * 10);
            assert!(limiter.allowed());
        }
    }
}
