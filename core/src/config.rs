use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, UpdateError};

/// Label selecting the workloads that take part in a sweep.
pub const DEFAULT_LABEL_SELECTOR: &str = "autoupdate/scheduled=true";

/// Annotation carrying the per-container update policy.
pub const DEFAULT_CONFIG_ANNOTATION: &str = "autoupdate/config";

/// Minutes between two passes when nothing else is configured.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 60;

/// Number of tags requested per registry page.
pub const DEFAULT_TAG_PAGE_SIZE: usize = 100;

/// Updater configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Label selector used to list eligible workloads
    pub label_selector: String,

    /// Annotation holding the update policy document
    pub config_annotation: String,

    /// Workload kinds visited on every pass
    pub kinds: Vec<WorkloadKind>,

    /// Scheduling of repeated passes
    pub schedule: ScheduleConfig,

    /// Registry access
    pub registry: RegistryConfig,

    /// Log level
    pub log_level: LogLevel,

    /// Log output format
    pub log_format: LogFormat,

    /// Compute patches without applying them
    pub dry_run: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            config_annotation: DEFAULT_CONFIG_ANNOTATION.to_string(),
            kinds: vec![WorkloadKind::Deployment],
            schedule: ScheduleConfig::default(),
            registry: RegistryConfig::default(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            dry_run: false,
        }
    }
}

impl UpdaterConfig {
    /// Load a configuration file in YAML format.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            UpdateError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&data).map_err(|e| {
            UpdateError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Reject configurations that cannot drive a sweep.
    pub fn validate(&self) -> Result<()> {
        if self.label_selector.trim().is_empty() {
            return Err(UpdateError::ConfigError(
                "label selector must not be empty".to_string(),
            ));
        }
        if self.config_annotation.trim().is_empty() {
            return Err(UpdateError::ConfigError(
                "config annotation must not be empty".to_string(),
            ));
        }
        if self.kinds.is_empty() {
            return Err(UpdateError::ConfigError(
                "at least one workload kind is required".to_string(),
            ));
        }
        if self.schedule.interval_minutes == 0 {
            return Err(UpdateError::ConfigError(
                "schedule interval must be at least one minute".to_string(),
            ));
        }
        if self.registry.page_size == 0 {
            return Err(UpdateError::ConfigError(
                "registry page size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Schedule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes to wait after each pass
    pub interval_minutes: u64,

    /// Minutes to wait before the first pass (defaults to the interval)
    pub initial_delay_minutes: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            initial_delay_minutes: None,
        }
    }
}

impl ScheduleConfig {
    /// Wait between the end of one pass and the start of the next.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    /// Wait before the first pass.
    pub fn initial_delay(&self) -> Duration {
        let minutes = self.initial_delay_minutes.unwrap_or(self.interval_minutes);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

/// Registry access configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON file with per-registry credentials
    pub credentials_file: Option<PathBuf>,

    /// Tags requested per page when enumerating a repository
    pub page_size: usize,

    /// Registries reached over plain HTTP
    pub insecure_hosts: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            credentials_file: None,
            page_size: DEFAULT_TAG_PAGE_SIZE,
            insecure_hosts: Vec::new(),
        }
    }
}

/// Kind of pod-template workload handled by the updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deployment => write!(f, "deployment"),
            Self::StatefulSet => write!(f, "statefulset"),
            Self::DaemonSet => write!(f, "daemonset"),
        }
    }
}

impl std::str::FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deployment" => Ok(Self::Deployment),
            "statefulset" => Ok(Self::StatefulSet),
            "daemonset" => Ok(Self::DaemonSet),
            _ => Err(format!(
                "unknown workload kind: '{}' (supported: deployment, statefulset, daemonset)",
                s
            )),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "unknown log level: '{}' (supported: debug, info, warn, error)",
                s
            )),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: '{}' (supported: text, json)", s)),
        }
    }
}
