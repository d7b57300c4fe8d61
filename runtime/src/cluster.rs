//! Kubernetes-backed workload source.

use std::fmt::Debug;

use async_trait::async_trait;
use autoupdate_core::config::WorkloadKind;
use autoupdate_core::error::{Result, UpdateError};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;

use crate::decision::PatchDocument;
use crate::workload::{ContainerImage, Workload, WorkloadSource};

/// Namespaced workload resource that owns a pod template.
trait PodTemplated:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: WorkloadKind;

    fn pod_template(&self) -> Option<&PodTemplateSpec>;
}

impl PodTemplated for Deployment {
    const KIND: WorkloadKind = WorkloadKind::Deployment;

    fn pod_template(&self) -> Option<&PodTemplateSpec> {
        self.spec.as_ref().map(|spec| &spec.template)
    }
}

impl PodTemplated for StatefulSet {
    const KIND: WorkloadKind = WorkloadKind::StatefulSet;

    fn pod_template(&self) -> Option<&PodTemplateSpec> {
        self.spec.as_ref().map(|spec| &spec.template)
    }
}

impl PodTemplated for DaemonSet {
    const KIND: WorkloadKind = WorkloadKind::DaemonSet;

    fn pod_template(&self) -> Option<&PodTemplateSpec> {
        self.spec.as_ref().map(|spec| &spec.template)
    }
}

/// Lists and patches workloads through the Kubernetes API.
#[derive(Clone)]
pub struct KubeWorkloadSource {
    client: Client,
    field_manager: String,
}

impl KubeWorkloadSource {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    async fn list_kind<K: PodTemplated>(&self, label_selector: &str) -> Result<Vec<Workload>> {
        let api: Api<K> = Api::all(self.client.clone());
        let mut params = ListParams::default();
        if !label_selector.is_empty() {
            params = params.labels(label_selector);
        }

        let objects = api.list(&params).await.map_err(|e| {
            UpdateError::OrchestratorError(format!("Failed to list {}s: {}", K::KIND, e))
        })?;

        let workloads: Vec<Workload> = objects.items.iter().filter_map(to_workload).collect();
        tracing::debug!(
            kind = %K::KIND,
            selector = label_selector,
            count = workloads.len(),
            "Listed workloads"
        );
        Ok(workloads)
    }

    async fn patch_kind<K: PodTemplated>(
        &self,
        workload: &Workload,
        patch: &PatchDocument,
    ) -> Result<()> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &workload.namespace);
        let params = PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        };

        api.patch(
            &workload.name,
            &params,
            &Patch::Strategic(patch.to_merge_patch()),
        )
        .await
        .map_err(|e| {
            UpdateError::OrchestratorError(format!("Failed to patch {}: {}", workload.id(), e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl WorkloadSource for KubeWorkloadSource {
    async fn list(&self, kind: WorkloadKind, label_selector: &str) -> Result<Vec<Workload>> {
        match kind {
            WorkloadKind::Deployment => self.list_kind::<Deployment>(label_selector).await,
            WorkloadKind::StatefulSet => self.list_kind::<StatefulSet>(label_selector).await,
            WorkloadKind::DaemonSet => self.list_kind::<DaemonSet>(label_selector).await,
        }
    }

    async fn apply(&self, workload: &Workload, patch: &PatchDocument) -> Result<()> {
        match workload.kind {
            WorkloadKind::Deployment => self.patch_kind::<Deployment>(workload, patch).await,
            WorkloadKind::StatefulSet => self.patch_kind::<StatefulSet>(workload, patch).await,
            WorkloadKind::DaemonSet => self.patch_kind::<DaemonSet>(workload, patch).await,
        }
    }
}

/// Snapshot a listed object. Containers without an image are left out.
fn to_workload<K: PodTemplated>(object: &K) -> Option<Workload> {
    let namespace = object.namespace()?;
    let containers = object
        .pod_template()
        .and_then(|template| template.spec.as_ref())
        .map(|spec| {
            spec.containers
                .iter()
                .filter_map(|c| c.image.as_ref().map(|image| ContainerImage::new(&c.name, image)))
                .collect()
        })
        .unwrap_or_default();

    Some(Workload {
        kind: K::KIND,
        namespace,
        name: object.name_any(),
        annotations: object.annotations().clone(),
        containers,
    })
}
