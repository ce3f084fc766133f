//! Resource queries against a named cluster

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use kube::api::DynamicObject;
use kubelist_types::{
    DeploymentList, DeploymentSummary, MetricsSummary, ReplicaSetList, ReplicaSetSummary,
    ResourceKind, ResourceList,
};
use serde::Serialize;
use serde_json::Value;

use crate::backend::{ClusterBackend, ClusterConnector};
use crate::error::{ClusterError, Result};
use crate::metrics::{MetricsKey, attach_metrics, metrics_to_values};

/// Fetches live objects, and usage samples where available, from a cluster
///
/// Every cluster call is bounded by `timeout`.
#[derive(Clone)]
pub struct ResourceQueryService {
    connector: Arc<dyn ClusterConnector>,
    timeout: Duration,
}

impl ResourceQueryService {
    pub fn new(connector: Arc<dyn ClusterConnector>, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ClusterError::Timeout(self.timeout))?
    }

    async fn backend(&self, cluster: &str) -> Result<Arc<dyn ClusterBackend>> {
        self.bounded(self.connector.connect(cluster)).await
    }

    /// Metrics on the resource path are best effort
    async fn optional_metrics(
        &self,
        cluster: &str,
        kind: ResourceKind,
        call: impl Future<Output = Result<Vec<DynamicObject>>>,
    ) -> Vec<DynamicObject> {
        match self.bounded(call).await {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::warn!(cluster, %kind, error = %e, "metrics unavailable, serving objects without usage");
                Vec::new()
            }
        }
    }

    /// List objects of `kind`, all namespaces unless `namespace` is given
    ///
    /// Pods and nodes come back with a `metrics` field. The kind is checked
    /// before the cluster is contacted.
    pub async fn get_resource(
        &self,
        cluster: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<ResourceList> {
        let kind: ResourceKind = kind.parse()?;
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let backend = self.backend(cluster).await?;

        let items = match kind {
            ResourceKind::Pod => {
                let (pods, metrics) = futures::join!(
                    self.bounded(backend.list_pods(namespace)),
                    self.optional_metrics(cluster, kind, backend.pod_metrics(namespace)),
                );
                attach_metrics(pods?, metrics, MetricsKey::NamespacedName)?
            }
            ResourceKind::Node => {
                if let Some(ns) = namespace {
                    tracing::debug!(cluster, namespace = ns, "ignoring namespace for nodes");
                }
                let (nodes, metrics) = futures::join!(
                    self.bounded(backend.list_nodes()),
                    self.optional_metrics(cluster, kind, backend.node_metrics()),
                );
                attach_metrics(nodes?, metrics, MetricsKey::Name)?
            }
            ResourceKind::Deployment => {
                to_values(self.bounded(backend.list_deployments(namespace)).await?)?
            }
            ResourceKind::ReplicaSet => {
                to_values(self.bounded(backend.list_replica_sets(namespace)).await?)?
            }
        };

        Ok(ResourceList { items })
    }

    /// Cluster-wide pod and node usage; fails if either query fails
    pub async fn get_cluster_metrics_summary(&self, cluster: &str) -> Result<MetricsSummary> {
        let backend = self.backend(cluster).await?;

        let (pods, nodes) = futures::try_join!(
            self.bounded(backend.pod_metrics(None)),
            self.bounded(backend.node_metrics()),
        )
        .map_err(|e| ClusterError::MetricsFetch(e.to_string()))?;

        Ok(MetricsSummary {
            pods: metrics_to_values(pods)?,
            nodes: metrics_to_values(nodes)?,
        })
    }

    /// Replica overview of deployments
    pub async fn list_deployments(
        &self,
        cluster: &str,
        namespace: Option<&str>,
    ) -> Result<DeploymentList> {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let backend = self.backend(cluster).await?;
        let list = self.bounded(backend.list_deployments(namespace)).await?;

        Ok(DeploymentList {
            deployments: list.into_iter().map(deployment_to_summary).collect(),
        })
    }

    /// Replica overview of replicasets
    pub async fn list_replica_sets(
        &self,
        cluster: &str,
        namespace: Option<&str>,
    ) -> Result<ReplicaSetList> {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let backend = self.backend(cluster).await?;
        let list = self.bounded(backend.list_replica_sets(namespace)).await?;

        Ok(ReplicaSetList {
            replicasets: list.into_iter().map(replica_set_to_summary).collect(),
        })
    }
}

fn to_values<K: Serialize>(objects: Vec<K>) -> Result<Vec<Value>> {
    Ok(objects
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?)
}

/// Convert a k8s Deployment to its replica summary
fn deployment_to_summary(deploy: Deployment) -> DeploymentSummary {
    let mut summary = DeploymentSummary::new(
        deploy.metadata.name.unwrap_or_default(),
        deploy.metadata.namespace.unwrap_or_default(),
    );
    summary.replicas = deploy.spec.and_then(|s| s.replicas);
    summary.available_replicas = deploy.status.and_then(|s| s.available_replicas);
    summary
}

/// Convert a k8s ReplicaSet to its replica summary
fn replica_set_to_summary(rs: ReplicaSet) -> ReplicaSetSummary {
    let mut summary = ReplicaSetSummary::new(
        rs.metadata.name.unwrap_or_default(),
        rs.metadata.namespace.unwrap_or_default(),
    );
    summary.replicas = rs.spec.and_then(|s| s.replicas);
    summary.ready_replicas = rs.status.and_then(|s| s.ready_replicas);
    summary
}
