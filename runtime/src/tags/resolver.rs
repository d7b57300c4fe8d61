//! Registry-backed tag candidate resolution.

use std::sync::Arc;

use autoupdate_core::error::Result;
use futures::TryStreamExt;

use super::pattern::TagPattern;
use super::version::TagCandidateSet;
use crate::oci::{ImageReference, TagRegistry};

/// Selects the best tag of a repository for a floating tag pattern.
#[derive(Clone)]
pub struct TagResolver {
    registry: Arc<dyn TagRegistry>,
}

impl TagResolver {
    pub fn new(registry: Arc<dyn TagRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the highest semantic version tag matching `pattern`.
    ///
    /// Every tag of the repository is examined; `None` means no tag matched.
    /// Registry failures are returned as errors.
    pub async fn resolve(
        &self,
        reference: &ImageReference,
        pattern: &TagPattern,
    ) -> Result<Option<String>> {
        let host = reference.full_host();
        let repository = reference.full_repository();

        let credential = self.registry.authenticate(host, &repository).await?;
        let mut tags = self.registry.list_tags(host, &repository, &credential);

        let mut candidates = TagCandidateSet::new();
        let mut scanned = 0usize;
        while let Some(tag) = tags.try_next().await? {
            scanned += 1;
            if !pattern.is_match(&tag) {
                continue;
            }
            if let Err(e) = candidates.offer(&tag) {
                tracing::debug!(
                    repository = %repository,
                    tag = %tag,
                    error = %e,
                    "Skipping matching tag that is not a semantic version"
                );
            }
        }

        tracing::debug!(
            registry = host,
            repository = %repository,
            pattern = %pattern,
            scanned,
            candidates = candidates.len(),
            "Scanned repository tags"
        );

        Ok(candidates.best())
    }
}
