//! Kubernetes client for kubelist
//!
//! This crate resolves kubeconfig contexts, keeps one client per context,
//! and answers resource and usage-metrics queries for a named cluster.

mod backend;
mod client;
mod error;
mod metrics;
mod query;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use backend::{ClusterBackend, ClusterConnector, KubeBackend};
pub use client::{KubeClient, KubeconfigSource};
pub use error::{ClusterError, Result};
pub use metrics::{MetricsKey, attach_metrics};
pub use query::ResourceQueryService;

// Re-export types that are used in our public API
pub use kubelist_types::{
    ClusterList, ContextInfo, DeploymentList, DeploymentSummary, MetricsSummary, ReplicaSetList,
    ReplicaSetSummary, ResourceKind, ResourceList,
};
