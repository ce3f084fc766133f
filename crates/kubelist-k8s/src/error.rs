use std::time::Duration;

use kubelist_types::UnsupportedResourceKind;
use thiserror::Error;

/// Errors raised while resolving contexts or querying a cluster
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("No kubeconfig found or invalid config: {0}")]
    Configuration(String),
    #[error("Unknown cluster context: {0}")]
    UnknownCluster(String),
    #[error(transparent)]
    UnsupportedResource(#[from] UnsupportedResourceKind),
    #[error("Failed to get cluster metrics: {0}")]
    MetricsFetch(String),
    #[error("Cluster API call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Cluster API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClusterError {
    /// Stable machine-readable code, used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::UnknownCluster(_) => "UNKNOWN_CLUSTER",
            Self::UnsupportedResource(_) => "UNSUPPORTED_RESOURCE",
            Self::MetricsFetch(_) => "METRICS_FETCH_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Kube(_) => "CLUSTER_API_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

pub type Result<T, E = ClusterError> = std::result::Result<T, E>;
