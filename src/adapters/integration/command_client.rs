//! Integration client backed by an external command-line program.
//!
//! Every call spawns the configured program once:
//!
//! ```text
//! <program> [args] submit --host H --user U --format F --record-type R --operation O --file P
//! <program> [args] completed|errors|warnings|summary --host H --user U --job ID
//! ```
//!
//! The password is passed through the child's environment only, never on the
//! command line. Stdout carries the answer; a non-zero exit rejects the call.

use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::models::{ClientConfig, JobId, ServerOptions};
use crate::domain::ports::{FeedSubmission, IntegrationClient, IntegrationError};

/// Environment variable holding the integration password for the child.
pub const PASSWORD_ENV: &str = "FEEDRUNNER_SERVER_PASSWORD";

/// Runs the configured client program for each remote call.
#[derive(Debug, Clone)]
pub struct CommandIntegrationClient {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandIntegrationClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run one subcommand and return its trimmed stdout.
    async fn invoke(
        &self,
        server: &ServerOptions,
        subcommand: &str,
        extra: Vec<OsString>,
    ) -> Result<String, IntegrationError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(subcommand)
            .arg("--host")
            .arg(&server.host)
            .arg("--user")
            .arg(&server.username)
            .args(extra)
            .env(PASSWORD_ENV, &server.password)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program, subcommand, "invoking integration client");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(IntegrationError::Transport(format!(
                    "failed to run {}: {e}",
                    self.program
                )))
            }
            Err(_) => {
                warn!(subcommand, timeout_secs = self.timeout.as_secs(), "integration client timed out");
                return Err(IntegrationError::Transport(format!(
                    "{subcommand} timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{subcommand} exited with {}", output.status)
            } else {
                stderr
            };
            return Err(IntegrationError::Rejected(reason));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn query_count(
        &self,
        server: &ServerOptions,
        subcommand: &str,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError> {
        let stdout = self.invoke(server, subcommand, job_args(job_id)).await?;
        parse_count(&stdout)
    }
}

fn job_args(job_id: &JobId) -> Vec<OsString> {
    vec!["--job".into(), job_id.as_str().into()]
}

/// Parse a count answer; the first line must be a non-negative integer.
fn parse_count(stdout: &str) -> Result<u64, IntegrationError> {
    let first = stdout.lines().next().unwrap_or("").trim();
    first
        .parse::<u64>()
        .map_err(|_| IntegrationError::MalformedResponse(format!("expected a count, got {first:?}")))
}

#[async_trait]
impl IntegrationClient for CommandIntegrationClient {
    async fn submit(
        &self,
        server: &ServerOptions,
        feed: &FeedSubmission,
    ) -> Result<JobId, IntegrationError> {
        let extra: Vec<OsString> = vec![
            "--format".into(),
            feed.format.as_str().into(),
            "--record-type".into(),
            feed.record_type.as_str().into(),
            "--operation".into(),
            feed.operation.as_str().into(),
            "--file".into(),
            feed.path.clone().into_os_string(),
        ];
        let stdout = self.invoke(server, "submit", extra).await?;
        let first = stdout.lines().next().unwrap_or("");
        JobId::new(first.trim())
            .ok_or_else(|| IntegrationError::MalformedResponse("empty job id".to_string()))
    }

    async fn poll_completed(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError> {
        self.query_count(server, "completed", job_id).await
    }

    async fn poll_errors(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError> {
        self.query_count(server, "errors", job_id).await
    }

    async fn poll_warnings(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError> {
        self.query_count(server, "warnings", job_id).await
    }

    async fn poll_summary(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<String, IntegrationError> {
        self.invoke(server, "summary", job_args(job_id)).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::models::{IntegrationFormat, Operation, RecordType};
    use std::path::PathBuf;

    /// A client running `script` through `sh -c`; the subcommand and its
    /// flags arrive as `$1`, `$2`, ...
    fn shell_client(script: &str, timeout_secs: u64) -> CommandIntegrationClient {
        CommandIntegrationClient::new(&ClientConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "feed-client".to_string()],
            timeout_secs,
        })
    }

    fn server() -> ServerOptions {
        ServerOptions {
            host: "lms.example.edu".to_string(),
            username: "sis".to_string(),
            password: "s3cret".to_string(),
        }
    }

    fn submission() -> FeedSubmission {
        FeedSubmission {
            path: PathBuf::from("/feeds/person.txt"),
            format: IntegrationFormat::FlatFile,
            record_type: RecordType::Person,
            operation: Operation::Store,
        }
    }

    #[tokio::test]
    async fn test_submit_returns_job_id_from_stdout() {
        let client = shell_client(r#"echo "job-$1-$3""#, 10);
        let job_id = client.submit(&server(), &submission()).await.unwrap();
        assert_eq!(job_id.as_str(), "job-submit-lms.example.edu");
    }

    #[tokio::test]
    async fn test_submit_passes_feed_flags() {
        let client = shell_client(r#"echo "$7 $9 ${11} ${13}""#, 10);
        let job_id = client.submit(&server(), &submission()).await.unwrap();
        assert_eq!(job_id.as_str(), "flat_file person store /feeds/person.txt");
    }

    #[tokio::test]
    async fn test_password_only_in_environment() {
        let client = shell_client(
            r#"case "$*" in *s3cret*) exit 9;; esac; test "$FEEDRUNNER_SERVER_PASSWORD" = s3cret && echo 42"#,
            10,
        );
        let job = JobId::new("j1").unwrap();
        assert_eq!(client.poll_completed(&server(), &job).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_rejected_with_stderr() {
        let client = shell_client("echo 'invalid credentials' >&2; exit 3", 10);
        let err = client.submit(&server(), &submission()).await.unwrap_err();
        match err {
            IntegrationError::Rejected(reason) => assert_eq!(reason, "invalid credentials"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_numeric_count_is_malformed() {
        let client = shell_client("echo pending", 10);
        let job = JobId::new("j1").unwrap();
        let err = client.poll_warnings(&server(), &job).await.unwrap_err();
        assert!(matches!(err, IntegrationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_job_id_is_malformed() {
        let client = shell_client("true", 10);
        let err = client.submit(&server(), &submission()).await.unwrap_err();
        assert!(matches!(err, IntegrationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_client_times_out() {
        let client = shell_client("sleep 5; echo 1", 1);
        let job = JobId::new("j1").unwrap();
        let err = client.poll_completed(&server(), &job).await.unwrap_err();
        assert!(matches!(err, IntegrationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_transport_error() {
        let client = CommandIntegrationClient::new(&ClientConfig {
            program: "/nonexistent/feed-client".to_string(),
            args: vec![],
            timeout_secs: 5,
        });
        let err = client
            .poll_summary(&server(), &JobId::new("j1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::Transport(_)));
    }

    #[test]
    fn test_parse_count_uses_first_line() {
        assert_eq!(parse_count("17\nextra").unwrap(), 17);
        assert!(parse_count("-1").is_err());
        assert!(parse_count("").is_err());
    }
}
