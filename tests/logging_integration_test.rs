// Integration test for run logging
// Installs the global subscriber, so everything lives in one test function.

use chrono::{TimeZone, Utc};
use feedrunner::domain::models::LoggingConfig;
use feedrunner::infrastructure::logging::LoggerImpl;
use std::fs;
use tempfile::TempDir;
use tracing::{info, instrument, warn};

#[instrument]
fn instrumented_count(feed: &str) -> usize {
    info!(records = 3, "counted records");
    3
}

#[test]
fn test_run_log_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = temp_dir.path().join("logs");
    let config = LoggingConfig {
        level: "info".to_string(),
        format: "json".to_string(),
        dir: log_dir.clone(),
        retention_days: 14,
        enable_stdout: false,
    };
    let started = Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap();

    let logger = LoggerImpl::init(&config, started).unwrap();
    assert_eq!(logger.log_path(), log_dir.join("feedrunner_20261018_020000.log"));

    info!(feed = "person.txt", "feed submitted");
    warn!(job_id = "job-1", "status check failed");
    assert_eq!(instrumented_count("person.txt"), 3);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let handles: Vec<_> = (0..4)
            .map(|i| tokio::spawn(async move { info!(job = i, "concurrent job line") }))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
    });

    // Flush the non-blocking writer.
    let log_path = logger.log_path().to_path_buf();
    drop(logger);

    let contents = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is JSON"))
        .collect();

    let messages: Vec<&str> = lines
        .iter()
        .filter_map(|l| l["fields"]["message"].as_str())
        .collect();
    assert!(messages.contains(&"logger initialized"));
    assert!(messages.contains(&"feed submitted"));
    assert!(messages.contains(&"status check failed"));
    assert!(messages.contains(&"counted records"));
    assert_eq!(
        messages.iter().filter(|m| **m == "concurrent job line").count(),
        4
    );

    let warning = lines
        .iter()
        .find(|l| l["fields"]["message"] == "status check failed")
        .unwrap();
    assert_eq!(warning["level"], "WARN");

    // A second subscriber cannot be installed in the same process.
    assert!(LoggerImpl::init(&config, Utc::now()).is_err());
}
