//! Kube Autoupdate Runtime - floating tag reconciliation.
//!
//! This crate provides the reconciliation engine: image reference parsing,
//! registry tag resolution, per-workload update decisions, and the sweep
//! loop that applies them to the cluster.

#![allow(clippy::result_large_err)]

pub mod cluster;
pub mod decision;
pub mod oci;
pub mod policy;
pub mod reconcile;
pub mod tags;
pub mod workload;

// Re-export common types
pub use cluster::KubeWorkloadSource;
pub use decision::{ContainerPatch, PatchDocument, UpdateDecider};
pub use oci::{CredentialStore, ImageReference, OciTagRegistry, RegistryAuth, TagRegistry};
pub use policy::{ContainerPolicy, UpdatePolicy};
pub use reconcile::{Reconciler, SweepOptions, SweepReport};
pub use tags::{TagCandidateSet, TagPattern, TagResolver, TagVersion};
pub use workload::{ContainerImage, Workload, WorkloadSource};

/// Kube Autoupdate Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Field manager recorded on applied patches.
pub const FIELD_MANAGER: &str = "kube-autoupdate";
