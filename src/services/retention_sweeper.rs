//! Retention cleanup for run logs and archive bundles.
//!
//! Both artifact kinds go through the same `RetentionWindow` comparison; only
//! the directory, file extension and day count differ.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::domain::models::RetentionWindow;

/// Timestamp format embedded in log and archive file names.
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Date-only variant used by daily archives.
pub const ARTIFACT_DATE_FORMAT: &str = "%Y%m%d";

/// Deletes expired artifacts of one kind from a directory.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    /// File extension identifying the artifact kind (without the dot)
    extension: String,
    /// Number of days to retain artifacts
    retention_days: u32,
}

impl RetentionSweeper {
    /// Create a sweeper for artifacts ending in `.<extension>`.
    pub fn new(extension: impl Into<String>, retention_days: u32) -> Self {
        Self {
            extension: extension.into(),
            retention_days,
        }
    }

    /// Sweeper for run log files.
    pub fn logs(retention_days: u32) -> Self {
        Self::new("log", retention_days)
    }

    /// Sweeper for archive bundles.
    pub fn archives(retention_days: u32) -> Self {
        Self::new("zip", retention_days)
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Delete expired artifacts in `dir`, never touching anything in `keep`.
    ///
    /// # Returns
    /// Paths of the deleted files
    pub async fn sweep(
        &self,
        dir: impl AsRef<Path>,
        now: DateTime<Utc>,
        keep: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();

        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            debug!(path = %dir.display(), "retention directory does not exist");
            return Ok(vec![]);
        }

        let window = RetentionWindow::new(now, self.retention_days);
        let mut deleted = Vec::new();

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .context("failed to read retention directory")?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("failed to read directory entry")?
        {
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if keep.iter().any(|k| k == &path) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read artifact metadata");
                    continue;
                }
            };

            let Some(created_at) = artifact_timestamp(&path, &metadata) else {
                warn!(path = %path.display(), "artifact has no usable timestamp, keeping it");
                continue;
            };

            if !window.is_expired(created_at) {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    info!(
                        path = %path.display(),
                        age_days = (now - created_at).num_days(),
                        "deleted expired artifact"
                    );
                    deleted.push(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete expired artifact");
                }
            }
        }

        if !deleted.is_empty() {
            info!(
                count = deleted.len(),
                extension = %self.extension,
                retention_days = self.retention_days,
                "retention sweep completed"
            );
        }

        Ok(deleted)
    }
}

/// Creation time of an artifact.
///
/// The timestamp embedded in the file name wins; filesystem creation time and
/// then modification time are fallbacks.
pub fn artifact_timestamp(path: &Path, metadata: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    timestamp_from_name(path)
        .or_else(|| metadata.created().ok().map(DateTime::<Utc>::from))
        .or_else(|| metadata.modified().ok().map(DateTime::<Utc>::from))
}

/// Parse `<prefix>_YYYYmmdd_HHMMSS.<ext>` or `<prefix>_YYYYmmdd.<ext>` (UTC).
pub fn timestamp_from_name(path: &Path) -> Option<DateTime<Utc>> {
    let stem = path.file_stem()?.to_str()?;
    let mut parts = stem.rsplitn(3, '_');
    let last = parts.next()?;
    let second = parts.next();

    if let Some(date) = second {
        let joined = format!("{date}_{last}");
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&joined, ARTIFACT_TIMESTAMP_FORMAT) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(last, ARTIFACT_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
