//! Per-container update policy.
//!
//! A workload declares its policy in an annotation holding a YAML mapping
//! from container name to either a bare tag pattern or a map with a `tag` key:
//!
//! ```yaml
//! app: '^1\.\d+\.\d+$'
//! sidecar:
//!   tag: '^2\..*'
//! ```

use std::collections::BTreeMap;

use autoupdate_core::error::{Result, UpdateError};
use serde_yaml::Value;

/// Policy entry of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPolicy {
    tag: Option<String>,
}

impl ContainerPolicy {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
        }
    }

    /// Tag pattern, `None` when the entry does not declare one.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Read an entry. Unquoted numbers and booleans are rejected because
    /// YAML would not keep them as written (`1.10` loads as `1.1`).
    fn from_value(container: &str, value: &Value) -> Result<Self> {
        let pattern = match value {
            Value::Mapping(map) => map.get("tag"),
            other => Some(other),
        };
        let tag = match pattern.map(untag) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Sequence(_)) | Some(Value::Mapping(_)) => None,
            Some(other) => {
                return Err(UpdateError::SerializationError(format!(
                    "pattern for container '{}' must be a quoted string, found {}",
                    container,
                    describe(other)
                )))
            }
        };
        Ok(Self { tag })
    }
}

/// Immutable update policy of a workload, keyed by container name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePolicy {
    containers: BTreeMap<String, ContainerPolicy>,
}

impl UpdatePolicy {
    /// Parse a policy document.
    ///
    /// The document must be a YAML mapping. Entries whose value is neither
    /// a string nor a map are kept without a pattern.
    pub fn parse(document: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(document)?;
        let Value::Mapping(map) = value else {
            return Err(UpdateError::SerializationError(format!(
                "expected a mapping of container names, found {}",
                describe(&value)
            )));
        };

        let mut containers = BTreeMap::new();
        for (name, entry) in &map {
            let Some(name) = scalar_to_string(name) else {
                return Err(UpdateError::SerializationError(format!(
                    "container names must be scalars, found {}",
                    describe(name)
                )));
            };
            let policy = ContainerPolicy::from_value(&name, entry)?;
            containers.insert(name, policy);
        }
        Ok(Self { containers })
    }

    /// Policy of the named container, if the workload declares one.
    pub fn get(&self, container: &str) -> Option<&ContainerPolicy> {
        self.containers.get(container)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl FromIterator<(String, ContainerPolicy)> for UpdatePolicy {
    fn from_iter<I: IntoIterator<Item = (String, ContainerPolicy)>>(iter: I) -> Self {
        Self {
            containers: iter.into_iter().collect(),
        }
    }
}

/// Container names may be written as plain scalars.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty document",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
