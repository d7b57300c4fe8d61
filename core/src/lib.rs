//! kube-autoupdate Core - Foundational Types
//!
//! Error taxonomy, configuration and log level types shared by the
//! reconciliation runtime and the command-line binary.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{LogFormat, LogLevel, RegistryConfig, ScheduleConfig, UpdaterConfig, WorkloadKind};
pub use error::{Result, UpdateError};

/// kube-autoupdate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
