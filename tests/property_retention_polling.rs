use std::cell::Cell;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use feedrunner::domain::models::{is_expired, PollOutcome};
use feedrunner::services::{ConvergencePoller, PollerConfig};
use proptest::prelude::*;

fn poller(abort_threshold: u32) -> ConvergencePoller {
    ConvergencePoller::new(PollerConfig {
        interval: Duration::ZERO,
        abort_threshold,
    })
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    /// Property: a longer retention period never expires something a
    /// shorter one kept.
    #[test]
    fn prop_is_expired_monotonic_in_retention_days(
        age_secs in 0i64..(400 * 86_400),
        days in 0u32..365,
        extra in 0u32..365,
    ) {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let created = now - chrono::Duration::seconds(age_secs);

        if is_expired(created, days + extra, now) {
            prop_assert!(is_expired(created, days, now));
        }
    }

    /// Property: a count that never moves aborts after exactly
    /// `abort_threshold` checks, with that count reported.
    #[test]
    fn prop_constant_count_aborts_at_threshold(
        threshold in 1u32..12,
        count in 0u64..1_000,
        gap in 1u64..1_000,
    ) {
        let expected = count + gap;
        let report = block_on(poller(threshold).poll_until_settled(expected, || async move {
            Ok::<u64, String>(count)
        }));

        prop_assert_eq!(report.outcome, PollOutcome::Aborted);
        prop_assert_eq!(report.iterations, threshold);
        prop_assert_eq!(report.completed, Some(count));
    }

    /// Property: checks that always fail abort after exactly
    /// `abort_threshold` checks.
    #[test]
    fn prop_failing_checks_abort_at_threshold(threshold in 1u32..12) {
        let report = block_on(poller(threshold).poll_until_settled(10, || async {
            Err::<u64, &str>("connection reset")
        }));

        prop_assert_eq!(report.outcome, PollOutcome::Aborted);
        prop_assert_eq!(report.iterations, threshold);
        prop_assert_eq!(report.completed, None);
    }

    /// Property: a strictly increasing count converges on the first check
    /// that reaches the expected total.
    #[test]
    fn prop_steady_progress_converges_when_target_reached(
        steps in 1u64..30,
        step in 1u64..50,
        threshold in 2u32..10,
    ) {
        let expected = steps * step;
        let calls = Cell::new(0u64);
        let report = block_on(poller(threshold).poll_until_settled(expected, || {
            calls.set(calls.get() + 1);
            let value = calls.get() * step;
            async move { Ok::<u64, String>(value) }
        }));

        prop_assert_eq!(report.outcome, PollOutcome::Converged);
        prop_assert_eq!(u64::from(report.iterations), steps);
        prop_assert_eq!(report.completed, Some(expected));
    }

    /// Property: any count change resets the stall counter, even after
    /// several stalls.
    #[test]
    fn prop_count_change_resets_stalls(threshold in 3u32..10) {
        // threshold - 1 identical readings, one change, then flat again.
        let stalled_checks = u64::from(threshold) - 1;
        let calls = Cell::new(0u64);
        let report = block_on(poller(threshold).poll_until_settled(1_000, || {
            calls.set(calls.get() + 1);
            let value = if calls.get() <= stalled_checks { 5 } else { 6 };
            async move { Ok::<u64, String>(value) }
        }));

        // Change at check `threshold` resets to 0; `threshold` more flat
        // checks are needed after it (the change itself does not count).
        prop_assert_eq!(report.outcome, PollOutcome::Aborted);
        prop_assert_eq!(report.iterations, 2 * threshold);
        prop_assert_eq!(report.completed, Some(6));
    }
}
