use thiserror::Error;

/// kube-autoupdate error types
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Process configuration error (config file, flags, environment)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Update policy of a single workload is unusable
    #[error("Policy error: {workload} - {message}")]
    PolicyError { workload: String, message: String },

    /// Container registry error (authentication or transport)
    #[error("Registry error: {registry} - {message}")]
    RegistryError { registry: String, message: String },

    /// Image reference outside the supported grammar
    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    /// Cluster API error while listing or patching workloads
    #[error("Orchestrator error: {0}")]
    OrchestratorError(String),

    /// Cluster credentials could not be loaded
    #[error("Startup error: {0}")]
    StartupError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl UpdateError {
    /// Build a policy error for the given workload.
    pub fn policy(workload: impl Into<String>, message: impl Into<String>) -> Self {
        UpdateError::PolicyError {
            workload: workload.into(),
            message: message.into(),
        }
    }

    /// Build a registry error for the given registry host.
    pub fn registry(registry: impl Into<String>, message: impl Into<String>) -> Self {
        UpdateError::RegistryError {
            registry: registry.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for UpdateError {
    fn from(err: serde_json::Error) -> Self {
        UpdateError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for UpdateError {
    fn from(err: serde_yaml::Error) -> Self {
        UpdateError::SerializationError(err.to_string())
    }
}

/// Result type alias for kube-autoupdate operations
pub type Result<T> = std::result::Result<T, UpdateError>;
