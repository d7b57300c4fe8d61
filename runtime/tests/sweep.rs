//! Integration test: full reconciliation sweeps against in-memory collaborators.
//!
//! The cluster and the registry are replaced by fakes so that a sweep runs
//! end to end (list, decide, resolve, patch) without network access.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p kube-autoupdate-runtime --test sweep
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use autoupdate_core::config::WorkloadKind;
use autoupdate_core::error::{Result, UpdateError};
use autoupdate_runtime::{
    ContainerImage, PatchDocument, Reconciler, RegistryAuth, SweepOptions, SweepReport,
    TagRegistry, TagResolver, UpdateDecider, Workload, WorkloadSource,
};
use futures::stream::{self, BoxStream, StreamExt};

const ANNOTATION: &str = "autoupdate/config";

/// Registry holding tags per `host/repository`; unknown repositories fail.
struct FakeRegistry {
    repositories: HashMap<String, Vec<String>>,
}

impl FakeRegistry {
    fn new(entries: &[(&str, &[&str])]) -> Arc<Self> {
        Arc::new(Self {
            repositories: entries
                .iter()
                .map(|(key, tags)| (key.to_string(), tags.iter().map(|t| t.to_string()).collect()))
                .collect(),
        })
    }
}

#[async_trait]
impl TagRegistry for FakeRegistry {
    async fn authenticate(&self, host: &str, repository: &str) -> Result<RegistryAuth> {
        if self.repositories.contains_key(&format!("{}/{}", host, repository)) {
            Ok(RegistryAuth::anonymous())
        } else {
            Err(UpdateError::registry(host, "401 Unauthorized"))
        }
    }

    fn list_tags<'a>(
        &'a self,
        host: &'a str,
        repository: &'a str,
        _credential: &'a RegistryAuth,
    ) -> BoxStream<'a, Result<String>> {
        let tags = self
            .repositories
            .get(&format!("{}/{}", host, repository))
            .cloned()
            .unwrap_or_default();
        stream::iter(tags.into_iter().map(Ok)).boxed()
    }
}

/// Cluster whose workloads are mutated by applied patches.
struct FakeCluster {
    workloads: Mutex<Vec<Workload>>,
    patches: Mutex<Vec<String>>,
    /// Names of workloads whose patch the API server rejects
    rejected: Vec<String>,
}

impl FakeCluster {
    fn new(workloads: Vec<Workload>) -> Arc<Self> {
        Self::rejecting(workloads, &[])
    }

    fn rejecting(workloads: Vec<Workload>, rejected: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            workloads: Mutex::new(workloads),
            patches: Mutex::new(Vec::new()),
            rejected: rejected.iter().map(|n| n.to_string()).collect(),
        })
    }

    fn image_of(&self, name: &str, container: &str) -> String {
        let workloads = self.workloads.lock().unwrap();
        let workload = workloads.iter().find(|w| w.name == name).unwrap();
        workload
            .containers
            .iter()
            .find(|c| c.name == container)
            .unwrap()
            .image
            .clone()
    }

    fn patched(&self) -> Vec<String> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkloadSource for FakeCluster {
    async fn list(&self, kind: WorkloadKind, _label_selector: &str) -> Result<Vec<Workload>> {
        Ok(self
            .workloads
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.kind == kind)
            .cloned()
            .collect())
    }

    async fn apply(&self, workload: &Workload, patch: &PatchDocument) -> Result<()> {
        if self.rejected.contains(&workload.name) {
            return Err(UpdateError::OrchestratorError(format!(
                "admission webhook denied patch of {}",
                workload.id()
            )));
        }
        let mut workloads = self.workloads.lock().unwrap();
        let target = workloads
            .iter_mut()
            .find(|w| w.kind == workload.kind && w.namespace == workload.namespace && w.name == workload.name)
            .ok_or_else(|| UpdateError::OrchestratorError(format!("{} not found", workload.id())))?;

        for change in patch.containers() {
            if let Some(container) = target.containers.iter_mut().find(|c| c.name == change.name) {
                container.image = change.image.clone();
            }
        }
        self.patches.lock().unwrap().push(workload.id());
        Ok(())
    }
}

fn workload(name: &str, policy: &str, containers: &[(&str, &str)]) -> Workload {
    Workload {
        kind: WorkloadKind::Deployment,
        namespace: "apps".to_string(),
        name: name.to_string(),
        annotations: BTreeMap::from([(ANNOTATION.to_string(), policy.to_string())]),
        containers: containers
            .iter()
            .map(|(name, image)| ContainerImage::new(*name, *image))
            .collect(),
    }
}

fn reconciler(cluster: Arc<FakeCluster>, registry: Arc<FakeRegistry>) -> Reconciler {
    Reconciler::new(
        cluster,
        UpdateDecider::new(TagResolver::new(registry), ANNOTATION),
        SweepOptions {
            label_selector: "autoupdate/scheduled=true".to_string(),
            kinds: vec![WorkloadKind::Deployment],
            dry_run: false,
        },
    )
}

fn hub(repository: &str) -> String {
    format!("registry.hub.docker.com/{}", repository)
}

#[tokio::test]
async fn test_second_sweep_is_a_no_op() {
    let nginx = hub("library/nginx");
    let registry = FakeRegistry::new(&[(nginx.as_str(), &["1.24.0", "1.25.3", "1.9.9"])]);
    let cluster = FakeCluster::new(vec![workload(
        "web",
        r"app: '1\.\d+\.\d+'",
        &[("app", "nginx:1.24.0")],
    )]);
    let reconciler = reconciler(cluster.clone(), registry);

    let first = reconciler.sweep().await;
    assert_eq!(first.patched, 1);
    assert_eq!(cluster.image_of("web", "app"), "nginx:1.25.3");

    let second = reconciler.sweep().await;
    assert_eq!(
        second,
        SweepReport {
            attempted: 1,
            unchanged: 1,
            ..Default::default()
        }
    );
    assert_eq!(cluster.patched(), vec!["deployment/apps/web".to_string()]);
}

#[tokio::test]
async fn test_registry_failure_isolated_to_its_workload() {
    let redis = hub("library/redis");
    let registry = FakeRegistry::new(&[(redis.as_str(), &["7.2.3", "7.2.4"])]);
    let cluster = FakeCluster::new(vec![
        workload("private", "app: '.*'", &[("app", "ghcr.io/acme/private:1.0.0")]),
        workload("cache", r"redis: '7\..*'", &[("redis", "redis:7.2.3")]),
    ]);
    let reconciler = reconciler(cluster.clone(), registry);

    let report = reconciler.sweep().await;
    assert_eq!(report.attempted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.patched, 1);
    assert_eq!(cluster.image_of("cache", "redis"), "redis:7.2.4");
    assert_eq!(cluster.image_of("private", "app"), "ghcr.io/acme/private:1.0.0");
}

#[tokio::test]
async fn test_apply_failure_isolated_to_its_workload() {
    let nginx = hub("library/nginx");
    let registry = FakeRegistry::new(&[(nginx.as_str(), &["1.24.0", "1.25.3"])]);
    let cluster = FakeCluster::rejecting(
        vec![
            workload("locked", r"app: '1\..*'", &[("app", "nginx:1.24.0")]),
            workload("open", r"app: '1\..*'", &[("app", "nginx:1.24.0")]),
        ],
        &["locked"],
    );
    let reconciler = reconciler(cluster.clone(), registry);

    let report = reconciler.sweep().await;
    assert_eq!(
        report,
        SweepReport {
            attempted: 2,
            patched: 1,
            failed: 1,
            ..Default::default()
        }
    );
    assert_eq!(cluster.image_of("locked", "app"), "nginx:1.24.0");
    assert_eq!(cluster.image_of("open", "app"), "nginx:1.25.3");
    assert_eq!(cluster.patched(), vec!["deployment/apps/open".to_string()]);
}

#[tokio::test]
async fn test_missing_pattern_blocks_whole_workload() {
    let nginx = hub("library/nginx");
    let redis = hub("library/redis");
    let registry = FakeRegistry::new(&[
        (nginx.as_str(), &["1.25.3"]),
        (redis.as_str(), &["7.2.4"]),
    ]);
    let cluster = FakeCluster::new(vec![workload(
        "mixed",
        "app: '.*'\nredis:\n  policy: latest\n",
        &[("app", "nginx:1.24.0"), ("redis", "redis:7.2.3")],
    )]);
    let reconciler = reconciler(cluster.clone(), registry);

    let report = reconciler.sweep().await;
    assert_eq!(report.failed, 1);
    assert!(cluster.patched().is_empty());
    assert_eq!(cluster.image_of("mixed", "app"), "nginx:1.24.0");
}

#[tokio::test]
async fn test_patch_leaves_other_containers_alone() {
    let registry = FakeRegistry::new(&[("quay.io/acme/api", &["2.0.0", "2.1.0", "3.0.0-rc.1"])]);
    let cluster = FakeCluster::new(vec![workload(
        "api",
        r"api: '2\..*'",
        &[("api", "quay.io/acme/api:2.0.0"), ("proxy", "envoyproxy/envoy:v1.29.0")],
    )]);
    let reconciler = reconciler(cluster.clone(), registry);

    reconciler.sweep().await;
    assert_eq!(cluster.image_of("api", "api"), "quay.io/acme/api:2.1.0");
    assert_eq!(cluster.image_of("api", "proxy"), "envoyproxy/envoy:v1.29.0");
}

#[tokio::test]
async fn test_workload_without_annotation_is_unchanged() {
    let registry = FakeRegistry::new(&[]);
    let mut bare = workload("bare", "", &[("app", "nginx:1.0.0")]);
    bare.annotations.clear();
    let cluster = FakeCluster::new(vec![bare]);

    let report = reconciler(cluster, registry).sweep().await;
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.failed, 0);
}
