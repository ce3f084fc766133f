//! Shared types for kubelist
//!
//! This crate contains the data structures exchanged between the Kubernetes
//! layer and the HTTP layer. Everything here serializes to the JSON bodies
//! returned by the server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Kubeconfig Contexts
// ============================================================================

/// Kubernetes context information
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: Option<String>,
    pub is_current: bool,
}

impl ContextInfo {
    pub fn new(
        name: String,
        cluster: String,
        user: String,
        namespace: Option<String>,
        is_current: bool,
    ) -> Self {
        Self {
            name,
            cluster,
            user,
            namespace,
            is_current,
        }
    }
}

/// Body of `GET /clusters`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterList {
    pub available_clusters: Vec<String>,
    pub current_context: Option<String>,
}

impl ClusterList {
    /// Build the listing from resolved contexts, keeping kubeconfig order
    pub fn from_contexts(contexts: &[ContextInfo]) -> Self {
        Self {
            available_clusters: contexts.iter().map(|c| c.name.clone()).collect(),
            current_context: contexts
                .iter()
                .find(|c| c.is_current)
                .map(|c| c.name.clone()),
        }
    }
}

// ============================================================================
// Resource Kinds
// ============================================================================

/// Resource kinds that can be queried through the facade
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Node,
    Deployment,
    ReplicaSet,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [Self::Pod, Self::Node, Self::Deployment, Self::ReplicaSet];

    /// Wire name used in URL paths
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => "pod",
            Self::Node => "node",
            Self::Deployment => "deployment",
            Self::ReplicaSet => "replicaset",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a resource kind outside [`ResourceKind::ALL`] is requested
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Unsupported resource type: {0}")]
pub struct UnsupportedResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnsupportedResourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pod" => Ok(Self::Pod),
            "node" => Ok(Self::Node),
            "deployment" => Ok(Self::Deployment),
            "replicaset" => Ok(Self::ReplicaSet),
            other => Err(UnsupportedResourceKind(other.to_string())),
        }
    }
}

// ============================================================================
// Response Bodies
// ============================================================================

/// Body of `GET /clusters/{cluster}/resources/{kind}`
///
/// Items are opaque JSON records. Pods and nodes carry an extra `metrics`
/// field which is `{}` when no usage sample matched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceList {
    pub items: Vec<Value>,
}

/// Body of `GET /clusters/{cluster}/metrics/summary`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub pods: Vec<Value>,
    pub nodes: Vec<Value>,
}

/// Replica overview of a single deployment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub name: String,
    pub namespace: String,
    pub replicas: Option<i32>,
    pub available_replicas: Option<i32>,
}

impl DeploymentSummary {
    pub fn new(name: String, namespace: String) -> Self {
        Self {
            name,
            namespace,
            replicas: None,
            available_replicas: None,
        }
    }
}

/// Replica overview of a single replicaset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSetSummary {
    pub name: String,
    pub namespace: String,
    pub replicas: Option<i32>,
    pub ready_replicas: Option<i32>,
}

impl ReplicaSetSummary {
    pub fn new(name: String, namespace: String) -> Self {
        Self {
            name,
            namespace,
            replicas: None,
            ready_replicas: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentList {
    pub deployments: Vec<DeploymentSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSetList {
    pub replicasets: Vec<ReplicaSetSummary>,
}
