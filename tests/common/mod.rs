//! Common test utilities for integration tests
//!
//! Provides feed-file fixtures and a controller wired to the mock adapters.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use feedrunner::adapters::mock::{MockIntegrationClient, RecordingArchiver, RecordingNotifier};
use feedrunner::domain::models::{Config, FeedSource};
use feedrunner::RunController;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write a flat-file feed with a header and `rows` records.
pub fn write_flat_feed(dir: &Path, name: &str, rows: usize) -> PathBuf {
    let path = dir.join(name);
    let mut contents = String::from("external_person_key|user_id|firstname|lastname\n");
    for i in 0..rows {
        contents.push_str(&format!("P{i:04}|user{i}|First{i}|Last{i}\n"));
    }
    std::fs::write(&path, contents).expect("Failed to write feed");
    path
}

pub fn feed(path: PathBuf, record_type: &str, operation: &str) -> FeedSource {
    FeedSource {
        path,
        record_type: record_type.to_string(),
        operation: operation.to_string(),
    }
}

/// Config for fast runs: no poll delay, everything under `root`.
pub fn test_config(root: &Path, feeds: Vec<FeedSource>) -> Config {
    let mut config = Config {
        feeds,
        ..Default::default()
    };
    config.server.host = "lms.example.edu".to_string();
    config.polling.interval_secs = 0;
    config.polling.abort_threshold = 3;
    config.logging.dir = root.join("logs");
    config.archive.dir = root.join("archive");
    config.notification.enabled = true;
    config.notification.recipients = vec!["sis-admin@example.edu".to_string()];
    config
}

/// Mock collaborators shared between a controller and the test's assertions.
#[derive(Default)]
pub struct Harness {
    pub client: Arc<MockIntegrationClient>,
    pub archiver: Arc<RecordingArchiver>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(&self, config: Config) -> RunController {
        RunController::new(
            config,
            self.client.clone(),
            self.archiver.clone(),
            self.notifier.clone(),
        )
    }
}

/// Touch an artifact named with `prefix_<timestamp>.ext` for `at`.
pub fn stamped_artifact(dir: &Path, prefix: &str, at: DateTime<Utc>, ext: &str) -> PathBuf {
    std::fs::create_dir_all(dir).expect("Failed to create artifact dir");
    let path = dir.join(format!("{prefix}_{}.{ext}", at.format("%Y%m%d_%H%M%S")));
    std::fs::write(&path, b"artifact").expect("Failed to write artifact");
    path
}
