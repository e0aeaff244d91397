//! Implementation of the `feedrunner check` command.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub config_path: String,
    pub integration_format: String,
    pub feeds: usize,
    pub issues: Vec<String>,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Configuration {} ({} feed(s), format {})",
            self.config_path, self.feeds, self.integration_format
        )];
        if self.issues.is_empty() {
            lines.push("No problems found.".to_string());
        } else {
            lines.push(format!("\n{} problem(s):", self.issues.len()));
            for issue in &self.issues {
                lines.push(format!("  - {issue}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config_path: &Path, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let issues = ConfigLoader::preflight(&config);

    let output_data = CheckOutput {
        config_path: config_path.display().to_string(),
        integration_format: config.integration_format.clone(),
        feeds: config.feeds.len(),
        issues,
    };
    output(&output_data, json_mode);

    if output_data.issues.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} configuration problem(s) found", output_data.issues.len())
    }
}
