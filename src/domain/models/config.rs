use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Main configuration structure for a feed run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Integration format shared by all feeds: flat_file or xml.
    /// Checked when a run starts, not at load time.
    #[serde(default = "default_integration_format")]
    pub integration_format: String,

    /// Remote integration endpoint options
    #[serde(default)]
    pub server: ServerOptions,

    /// Feed files, in the order they are processed and reported
    #[serde(default)]
    pub feeds: Vec<FeedSource>,

    /// Status polling configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Archive configuration
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Notification configuration
    #[serde(default)]
    pub notification: NotificationConfig,

    /// External integration client configuration
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_integration_format() -> String {
    "flat_file".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            integration_format: default_integration_format(),
            server: ServerOptions::default(),
            feeds: vec![],
            polling: PollingConfig::default(),
            logging: LoggingConfig::default(),
            archive: ArchiveConfig::default(),
            notification: NotificationConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Connection options handed to the integration client
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerOptions {
    /// Base URL or host name of the integration endpoint
    #[serde(default)]
    pub host: String,

    /// Integration account user name
    #[serde(default)]
    pub username: String,

    /// Integration account password
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One configured feed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedSource {
    /// Path to the feed file
    pub path: PathBuf,

    /// Record type, checked against the integration format's allow-list
    pub record_type: String,

    /// Operation, checked against the integration format's allow-list
    pub operation: String,
}

/// Status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollingConfig {
    /// Seconds to wait before each status check
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Consecutive non-progressing checks before giving up on a job
    #[serde(default = "default_abort_threshold")]
    pub abort_threshold: u32,

    /// Poll all jobs at once instead of one after another
    #[serde(default = "default_true")]
    pub concurrent: bool,
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_abort_threshold() -> u32 {
    10
}

const fn default_true() -> bool {
    true
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            abort_threshold: default_abort_threshold(),
            concurrent: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Stdout format: json or pretty (the run log file is always json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory holding one log file per run
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Number of days to retain run logs
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,

    /// Mirror log lines to stdout
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

const fn default_log_retention_days() -> u32 {
    14
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            enable_stdout: true,
        }
    }
}

/// Archive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArchiveConfig {
    /// Bundle the run log and feed files after every run
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding archive bundles
    #[serde(default = "default_archive_dir")]
    pub dir: PathBuf,

    /// Number of days to retain archives
    #[serde(default = "default_archive_retention_days")]
    pub retention_days: u32,

    /// Append to one archive per day instead of one per run
    #[serde(default)]
    pub append: bool,
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("archive")
}

const fn default_archive_retention_days() -> u32 {
    30
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_archive_dir(),
            retention_days: default_archive_retention_days(),
            append: false,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationConfig {
    /// Send the run report when the run ends
    #[serde(default)]
    pub enabled: bool,

    /// Report recipients
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Sender address
    #[serde(default = "default_from")]
    pub from: String,

    /// Prefix for every report subject
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// sendmail-compatible program used for delivery
    #[serde(default = "default_sendmail_path")]
    pub sendmail_path: String,
}

fn default_from() -> String {
    "feedrunner@localhost".to_string()
}

fn default_subject_prefix() -> String {
    "[feedrunner]".to_string()
}

fn default_sendmail_path() -> String {
    "sendmail".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            recipients: vec![],
            from: default_from(),
            subject_prefix: default_subject_prefix(),
            sendmail_path: default_sendmail_path(),
        }
    }
}

/// External integration client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Client program invoked for submit and status calls
    #[serde(default = "default_client_program")]
    pub program: String,

    /// Extra arguments placed before the client subcommand
    #[serde(default)]
    pub args: Vec<String>,

    /// Seconds before a client call is abandoned
    #[serde(default = "default_client_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_client_program() -> String {
    "feed-client".to_string()
}

const fn default_client_timeout_secs() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program: default_client_program(),
            args: vec![],
            timeout_secs: default_client_timeout_secs(),
        }
    }
}
