//! Convergence polling for submitted feed jobs.
//!
//! Polls a status check until the remote job's completed count reaches the
//! expected total, or until too many consecutive checks show no progress.
//! A failed check counts the same as a check that returned an unchanged count.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::models::{PollOutcome, PollingConfig};

/// Configuration for the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Wait before each status check.
    pub interval: Duration,
    /// Consecutive non-progressing checks before giving up (at least 1).
    pub abort_threshold: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollerConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            abort_threshold: config.abort_threshold,
        }
    }
}

/// How a polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    /// Last completed count read, if any check succeeded.
    pub completed: Option<u64>,
    /// Consecutive non-progressing checks at the end of the loop.
    pub consecutive_stalls: u32,
    /// Number of status checks made.
    pub iterations: u32,
}

/// Drives status checks until a job converges or stalls out.
#[derive(Debug, Clone)]
pub struct ConvergencePoller {
    config: PollerConfig,
}

impl ConvergencePoller {
    pub fn new(config: PollerConfig) -> Self {
        Self {
            config: PollerConfig {
                abort_threshold: config.abort_threshold.max(1),
                ..config
            },
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll `check` until the completed count reaches `expected` or the
    /// abort threshold is hit.
    ///
    /// Each iteration sleeps for the poll interval, then checks. A count that
    /// differs from the previous iteration's count resets the stall counter;
    /// an unchanged count, a failed check, or the very first reading (there is
    /// nothing before it to move from) increments it. The loop therefore ends
    /// after exactly `abort_threshold` checks when nothing ever moves.
    ///
    /// The abort threshold is checked before convergence, and only an exact
    /// match with `expected` converges; a count that overshoots it stalls out.
    ///
    /// `expected` must be non-zero; empty feeds are never submitted.
    pub async fn poll_until_settled<F, Fut, E>(&self, expected: u64, mut check: F) -> PollReport
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<u64, E>>,
        E: Display,
    {
        let threshold = self.config.abort_threshold;
        let mut completed: Option<u64> = None;
        let mut stalls: u32 = 0;
        let mut iterations: u32 = 0;

        loop {
            tokio::time::sleep(self.config.interval).await;
            iterations += 1;

            match check().await {
                Ok(count) => {
                    if completed.is_some_and(|previous| previous != count) {
                        stalls = 0;
                    } else {
                        stalls += 1;
                    }
                    completed = Some(count);

                    debug!(
                        iteration = iterations,
                        completed = count,
                        expected = expected,
                        consecutive_stalls = stalls,
                        "status check"
                    );
                }
                Err(e) => {
                    stalls += 1;
                    warn!(
                        iteration = iterations,
                        consecutive_stalls = stalls,
                        error = %e,
                        "status check failed"
                    );
                }
            }

            if stalls >= threshold {
                warn!(
                    iterations = iterations,
                    completed = ?completed,
                    expected = expected,
                    consecutive_stalls = stalls,
                    "job stopped making progress, giving up"
                );
                return PollReport {
                    outcome: PollOutcome::Aborted,
                    completed,
                    consecutive_stalls: stalls,
                    iterations,
                };
            }

            if completed == Some(expected) {
                info!(iterations = iterations, expected = expected, "job converged");
                return PollReport {
                    outcome: PollOutcome::Converged,
                    completed,
                    consecutive_stalls: stalls,
                    iterations,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn poller(abort_threshold: u32) -> ConvergencePoller {
        ConvergencePoller::new(PollerConfig {
            interval: Duration::ZERO,
            abort_threshold,
        })
    }

    /// Status check that replays `script`, failing once it runs dry.
    fn scripted(
        script: Vec<Result<u64, &'static str>>,
    ) -> impl FnMut() -> std::future::Ready<Result<u64, &'static str>> {
        let mut script: VecDeque<_> = script.into();
        move || std::future::ready(script.pop_front().unwrap_or(Err("script exhausted")))
    }

    #[tokio::test]
    async fn test_unchanged_count_aborts_at_threshold() {
        let report = poller(3)
            .poll_until_settled(100, scripted(vec![Ok(50), Ok(50), Ok(50), Ok(50)]))
            .await;

        assert_eq!(report.outcome, PollOutcome::Aborted);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.completed, Some(50));
        assert_eq!(report.consecutive_stalls, 3);
    }

    #[tokio::test]
    async fn test_progress_converges_at_expected_count() {
        let report = poller(3)
            .poll_until_settled(100, scripted(vec![Ok(50), Ok(75), Ok(100)]))
            .await;

        assert_eq!(report.outcome, PollOutcome::Converged);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.completed, Some(100));
        assert_eq!(report.consecutive_stalls, 0);
    }

    #[tokio::test]
    async fn test_failures_count_as_stalls() {
        let report = poller(2)
            .poll_until_settled(10, scripted(vec![Err("timeout"), Err("timeout")]))
            .await;

        assert_eq!(report.outcome, PollOutcome::Aborted);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.completed, None);
    }

    #[tokio::test]
    async fn test_failure_does_not_overwrite_last_count() {
        let report = poller(3)
            .poll_until_settled(10, scripted(vec![Ok(4), Err("503"), Ok(4), Ok(4)]))
            .await;

        assert_eq!(report.outcome, PollOutcome::Aborted);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.completed, Some(4));
    }

    #[tokio::test]
    async fn test_counter_resets_after_several_stalls() {
        // Two stalls, then movement, then two more stalls: never reaches 3.
        let report = poller(3)
            .poll_until_settled(
                100,
                scripted(vec![Ok(10), Ok(10), Ok(20), Ok(20), Ok(20), Ok(100)]),
            )
            .await;

        assert_eq!(report.outcome, PollOutcome::Converged);
        assert_eq!(report.iterations, 6);
    }

    #[tokio::test]
    async fn test_converges_on_first_check() {
        let report = poller(2).poll_until_settled(7, scripted(vec![Ok(7)])).await;

        assert_eq!(report.outcome, PollOutcome::Converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.consecutive_stalls, 1);
    }

    #[tokio::test]
    async fn test_threshold_reached_before_convergence_aborts() {
        // The first reading is a stall, so a threshold of 1 gives up even
        // though the count matches.
        let report = poller(1).poll_until_settled(100, scripted(vec![Ok(100)])).await;

        assert_eq!(report.outcome, PollOutcome::Aborted);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.completed, Some(100));
        assert_eq!(report.consecutive_stalls, 1);
    }

    #[tokio::test]
    async fn test_count_above_expected_stalls_out() {
        let report = poller(3)
            .poll_until_settled(100, scripted(vec![Ok(120), Ok(120), Ok(120)]))
            .await;

        assert_eq!(report.outcome, PollOutcome::Aborted);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.completed, Some(120));
    }

    #[tokio::test]
    async fn test_zero_threshold_is_treated_as_one() {
        let p = poller(0);
        assert_eq!(p.config().abort_threshold, 1);

        let report = p.poll_until_settled(5, scripted(vec![Ok(1)])).await;
        assert_eq!(report.outcome, PollOutcome::Aborted);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn test_config_from_polling_config() {
        let config = PollerConfig::from(&PollingConfig {
            interval_secs: 15,
            abort_threshold: 4,
            concurrent: false,
        });
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.abort_threshold, 4);
    }
}
