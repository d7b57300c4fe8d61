//! Per-workload update decisions.
//!
//! For one workload, reads the update policy annotation, resolves the best
//! tag of every container that has a policy entry, and collects the
//! containers whose tag must change into a [`PatchDocument`].
//!
//! A workload is decided all-or-nothing: a configuration problem on any
//! referenced container discards the containers already evaluated.

use autoupdate_core::error::{Result, UpdateError};
use serde::Serialize;

use crate::oci::ImageReference;
use crate::policy::UpdatePolicy;
use crate::tags::{TagPattern, TagResolver};
use crate::workload::Workload;

/// New image for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerPatch {
    pub name: String,
    pub image: String,
}

/// Ordered container image changes for one workload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchDocument {
    containers: Vec<ContainerPatch>,
}

impl PatchDocument {
    pub fn containers(&self) -> &[ContainerPatch] {
        &self.containers
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn push(&mut self, name: impl Into<String>, image: impl Into<String>) {
        self.containers.push(ContainerPatch {
            name: name.into(),
            image: image.into(),
        });
    }

    /// Patch body for the pod template's container list.
    ///
    /// Applied as a strategic merge patch, list entries are matched by
    /// container name and only their `image` field changes.
    pub fn to_merge_patch(&self) -> serde_json::Value {
        serde_json::json!({
            "spec": {
                "template": {
                    "spec": {
                        "containers": self.containers,
                    }
                }
            }
        })
    }
}

/// Computes the patch of a single workload.
#[derive(Clone)]
pub struct UpdateDecider {
    resolver: TagResolver,
    annotation: String,
}

impl UpdateDecider {
    /// Create a decider reading the policy from `annotation`.
    pub fn new(resolver: TagResolver, annotation: impl Into<String>) -> Self {
        Self {
            resolver,
            annotation: annotation.into(),
        }
    }

    /// Decide which containers of `workload` need a new tag.
    ///
    /// Returns `Ok(None)` when nothing changes, including when the policy
    /// annotation is missing. Policy problems and registry failures abort
    /// the workload with an error.
    pub async fn decide(&self, workload: &Workload) -> Result<Option<PatchDocument>> {
        let id = workload.id();

        let Some(document) = workload.annotations.get(&self.annotation) else {
            tracing::warn!(
                workload = %id,
                annotation = %self.annotation,
                "Missing update policy annotation"
            );
            return Ok(None);
        };

        let policy = UpdatePolicy::parse(document)
            .map_err(|e| UpdateError::policy(&id, format!("unable to parse policy: {}", e)))?;

        tracing::info!(workload = %id, "Checking for containers to update");

        let mut patch = PatchDocument::default();
        for container in &workload.containers {
            let Some(entry) = policy.get(&container.name) else {
                continue;
            };
            let Some(raw_pattern) = entry.tag() else {
                return Err(UpdateError::policy(
                    &id,
                    format!("missing 'tag' for container '{}'", container.name),
                ));
            };
            let pattern = TagPattern::new(raw_pattern).map_err(|e| {
                UpdateError::policy(
                    &id,
                    format!("invalid tag pattern for container '{}': {}", container.name, e),
                )
            })?;

            let image = ImageReference::parse(&container.image);
            if let Err(e) = image.validate() {
                tracing::warn!(
                    workload = %id,
                    container = %container.name,
                    error = %e,
                    "Skipping container with unsupported image reference"
                );
                continue;
            }

            tracing::info!(workload = %id, container = %container.name, "Checking tag");
            let Some(tag) = self.resolver.resolve(&image, &pattern).await? else {
                tracing::warn!(
                    workload = %id,
                    container = %container.name,
                    pattern = %pattern,
                    "Found no tag matching the pattern"
                );
                continue;
            };

            if tag == image.full_tag() {
                tracing::info!(
                    workload = %id,
                    container = %container.name,
                    tag = %tag,
                    "Container is up-to-date"
                );
                continue;
            }

            tracing::info!(
                workload = %id,
                container = %container.name,
                from = %image.full_tag(),
                to = %tag,
                "Container needs update"
            );
            patch.push(&container.name, image.with_tag(tag).short_spec());
        }

        Ok(if patch.is_empty() { None } else { Some(patch) })
    }
}
