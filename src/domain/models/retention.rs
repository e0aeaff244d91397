//! Retention windows for timestamped artifacts (log files, archives).

use chrono::{DateTime, Duration, Utc};

/// Cutoff instant computed as `now - retention_days`.
///
/// Artifacts created at or before the cutoff are eligible for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    cutoff: DateTime<Utc>,
}

impl RetentionWindow {
    pub fn new(now: DateTime<Utc>, retention_days: u32) -> Self {
        Self {
            cutoff: now - Duration::days(i64::from(retention_days)),
        }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn is_expired(&self, created_at: DateTime<Utc>) -> bool {
        created_at <= self.cutoff
    }
}

/// Whether an artifact created at `created_at` has outlived `retention_days`.
pub fn is_expired(created_at: DateTime<Utc>, retention_days: u32, now: DateTime<Utc>) -> bool {
    RetentionWindow::new(now, retention_days).is_expired(created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_old_artifact_expires() {
        let created = now() - Duration::days(20);
        assert!(is_expired(created, 14, now()));
    }

    #[test]
    fn test_recent_artifact_is_retained() {
        let created = now() - Duration::days(5);
        assert!(!is_expired(created, 14, now()));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let created = now() - Duration::days(14);
        assert!(is_expired(created, 14, now()));
        assert!(!is_expired(created + Duration::seconds(1), 14, now()));
    }

    #[test]
    fn test_zero_retention_expires_everything_up_to_now() {
        assert!(is_expired(now() - Duration::seconds(1), 0, now()));
        assert!(is_expired(now(), 0, now()));
    }

    #[test]
    fn test_future_timestamp_never_expires() {
        let created = now() + Duration::hours(1);
        assert!(!is_expired(created, 0, now()));
        assert!(!is_expired(created, 30, now()));
    }

    #[test]
    fn test_window_cutoff() {
        let window = RetentionWindow::new(now(), 7);
        assert_eq!(window.cutoff(), now() - Duration::days(7));
    }
}
