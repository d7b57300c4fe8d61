//! kube-autoupdate CLI - floating tag updater for Kubernetes workloads.

pub mod commands;
pub mod logging;
