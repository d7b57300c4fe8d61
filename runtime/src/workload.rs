//! Workload descriptors and the cluster API seam.

use std::collections::BTreeMap;

use async_trait::async_trait;
use autoupdate_core::config::WorkloadKind;
use autoupdate_core::error::Result;

use crate::decision::PatchDocument;

/// A container of a workload's pod template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerImage {
    /// Container name, unique within the pod template
    pub name: String,
    /// Image reference as deployed
    pub image: String,
}

impl ContainerImage {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
        }
    }
}

/// Snapshot of a pod-template workload taken when it was listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
    pub annotations: BTreeMap<String, String>,
    pub containers: Vec<ContainerImage>,
}

impl Workload {
    /// Identifier used in logs and errors (`kind/namespace/name`).
    pub fn id(&self) -> String {
        format!("{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Cluster API operations needed by a sweep.
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// List workloads of `kind` in all namespaces matching `label_selector`.
    async fn list(&self, kind: WorkloadKind, label_selector: &str) -> Result<Vec<Workload>>;

    /// Merge `patch` into the workload's container list, keyed by container name.
    async fn apply(&self, workload: &Workload, patch: &PatchDocument) -> Result<()>;
}
