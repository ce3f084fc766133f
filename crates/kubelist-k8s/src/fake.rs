//! In-memory clusters for tests
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for downstream crates.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStatus, ReplicaSet, ReplicaSetSpec, ReplicaSetStatus,
};
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{DynamicObject, ObjectMeta};
use serde_json::json;

use crate::backend::{
    ClusterBackend, ClusterConnector, node_metrics_resource, pod_metrics_resource,
};
use crate::error::{ClusterError, Result};

fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    }
}

fn in_namespace(meta: &ObjectMeta, namespace: Option<&str>) -> bool {
    namespace.is_none_or(|ns| meta.namespace.as_deref() == Some(ns))
}

/// Error returned by a fake endpoint marked as down
pub fn endpoint_down() -> ClusterError {
    ClusterError::Kube(kube::Error::Service("connection refused".into()))
}

/// A cluster whose objects and metrics live in memory
#[derive(Clone, Debug, Default)]
pub struct FakeCluster {
    pub pods: Vec<Pod>,
    pub nodes: Vec<Node>,
    pub deployments: Vec<Deployment>,
    pub replica_sets: Vec<ReplicaSet>,
    pub pod_metrics: Vec<DynamicObject>,
    pub node_metrics: Vec<DynamicObject>,
    pub pod_metrics_down: bool,
    pub node_metrics_down: bool,
    pub listing_down: bool,
    pub delay: Option<Duration>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(mut self, namespace: &str, name: &str) -> Self {
        self.pods.push(Pod {
            metadata: meta(Some(namespace), name),
            ..Default::default()
        });
        self
    }

    pub fn with_node(mut self, name: &str) -> Self {
        self.nodes.push(Node {
            metadata: meta(None, name),
            ..Default::default()
        });
        self
    }

    pub fn with_deployment(
        mut self,
        namespace: &str,
        name: &str,
        replicas: i32,
        available: Option<i32>,
    ) -> Self {
        self.deployments.push(Deployment {
            metadata: meta(Some(namespace), name),
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                ..Default::default()
            }),
            status: available.map(|n| DeploymentStatus {
                available_replicas: Some(n),
                ..Default::default()
            }),
        });
        self
    }

    pub fn with_replica_set(
        mut self,
        namespace: &str,
        name: &str,
        replicas: i32,
        ready: Option<i32>,
    ) -> Self {
        self.replica_sets.push(ReplicaSet {
            metadata: meta(Some(namespace), name),
            spec: Some(ReplicaSetSpec {
                replicas: Some(replicas),
                ..Default::default()
            }),
            status: Some(ReplicaSetStatus {
                replicas,
                ready_replicas: ready,
                ..Default::default()
            }),
        });
        self
    }

    pub fn with_pod_metrics(mut self, namespace: &str, name: &str, cpu: &str) -> Self {
        self.pod_metrics.push(
            DynamicObject::new(name, &pod_metrics_resource())
                .within(namespace)
                .data(json!({
                    "window": "30s",
                    "containers": [{"name": name, "usage": {"cpu": cpu, "memory": "64Mi"}}],
                })),
        );
        self
    }

    pub fn with_node_metrics(mut self, name: &str, cpu: &str) -> Self {
        self.node_metrics.push(
            DynamicObject::new(name, &node_metrics_resource()).data(json!({
                "window": "30s",
                "usage": {"cpu": cpu, "memory": "2Gi"},
            })),
        );
        self
    }

    /// Take both metrics endpoints offline
    pub fn metrics_down(mut self) -> Self {
        self.pod_metrics_down = true;
        self.node_metrics_down = true;
        self
    }

    fn respond<T: Send + 'static>(
        &self,
        down: bool,
        items: Vec<T>,
    ) -> BoxFuture<'static, Result<Vec<T>>> {
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if down { Err(endpoint_down()) } else { Ok(items) }
        }
        .boxed()
    }
}

impl ClusterBackend for FakeCluster {
    fn list_pods(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<Pod>>> {
        let items = self
            .pods
            .iter()
            .filter(|p| in_namespace(&p.metadata, namespace))
            .cloned()
            .collect();
        self.respond(self.listing_down, items)
    }

    fn list_nodes(&self) -> BoxFuture<'_, Result<Vec<Node>>> {
        self.respond(self.listing_down, self.nodes.clone())
    }

    fn list_deployments(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<Deployment>>> {
        let items = self
            .deployments
            .iter()
            .filter(|d| in_namespace(&d.metadata, namespace))
            .cloned()
            .collect();
        self.respond(self.listing_down, items)
    }

    fn list_replica_sets(
        &self,
        namespace: Option<&str>,
    ) -> BoxFuture<'_, Result<Vec<ReplicaSet>>> {
        let items = self
            .replica_sets
            .iter()
            .filter(|r| in_namespace(&r.metadata, namespace))
            .cloned()
            .collect();
        self.respond(self.listing_down, items)
    }

    fn pod_metrics(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<DynamicObject>>> {
        let items = self
            .pod_metrics
            .iter()
            .filter(|m| in_namespace(&m.metadata, namespace))
            .cloned()
            .collect();
        self.respond(self.pod_metrics_down, items)
    }

    fn node_metrics(&self) -> BoxFuture<'_, Result<Vec<DynamicObject>>> {
        self.respond(self.node_metrics_down, self.node_metrics.clone())
    }
}

/// Connector over a fixed set of named fake clusters
#[derive(Default)]
pub struct FakeConnector {
    clusters: HashMap<String, Arc<FakeCluster>>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, name: &str, cluster: FakeCluster) -> Self {
        self.clusters.insert(name.to_string(), Arc::new(cluster));
        self
    }

    /// How many times a backend was requested
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ClusterConnector for FakeConnector {
    fn connect<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, Result<Arc<dyn ClusterBackend>>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let found = self
            .clusters
            .get(cluster)
            .cloned()
            .map(|c| c as Arc<dyn ClusterBackend>)
            .ok_or_else(|| ClusterError::UnknownCluster(cluster.to_string()));
        async move { found }.boxed()
    }
}
