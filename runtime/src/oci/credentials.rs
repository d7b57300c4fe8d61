//! Read-only credential store for container registries.
//!
//! Credentials live in a JSON file of the form
//! `{"registries": {"<host>": {"username": "...", "password": "..."}}}`,
//! by default at `~/.kube-autoupdate/credentials.json`. In a cluster the file
//! is usually mounted from a Secret.

use std::collections::HashMap;
use std::path::PathBuf;

use autoupdate_core::error::{Result, UpdateError};
use serde::Deserialize;

use super::reference::{is_docker_hub_alias, DEFAULT_REGISTRY_HOST};

/// Per-registry credential entry.
#[derive(Debug, Clone, Deserialize)]
struct CredentialEntry {
    username: String,
    password: String,
}

/// Credential file format.
#[derive(Debug, Default, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    registries: HashMap<String, CredentialEntry>,
}

/// Credential lookup for container registries.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Credential store at the default path (`~/.kube-autoupdate/credentials.json`).
    pub fn default_path() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            UpdateError::ConfigError(
                "Cannot determine home directory for credential store".to_string(),
            )
        })?;
        Ok(Self {
            path: home.join(".kube-autoupdate").join("credentials.json"),
        })
    }

    /// Credential store at a custom path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get credentials for a registry. Returns `(username, password)`.
    pub fn get(&self, registry: &str) -> Result<Option<(String, String)>> {
        let file = self.load()?;
        let wanted = normalize_registry(registry);
        Ok(file
            .registries
            .iter()
            .find(|(host, _)| normalize_registry(host) == wanted)
            .map(|(_, e)| (e.username.clone(), e.password.clone())))
    }

    /// Load the credential file from disk. Returns empty if not found.
    fn load(&self) -> Result<CredentialFile> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            UpdateError::ConfigError(format!(
                "Failed to read credential store {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            UpdateError::ConfigError(format!(
                "Failed to parse credential store {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Normalize registry names so every Docker Hub alias maps to one key.
fn normalize_registry(registry: &str) -> String {
    let r = registry.trim().to_lowercase();
    if is_docker_hub_alias(&r) {
        DEFAULT_REGISTRY_HOST.to_string()
    } else {
        r
    }
}
