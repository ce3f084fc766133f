//! Per-cluster API access
//!
//! [`ClusterBackend`] is the narrow surface the query service needs from a
//! single cluster. [`ClusterConnector`] hands out a backend per context name,
//! so no request ever depends on a shared "current context".

use std::fmt::Debug;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, ApiResource, DynamicObject, ListParams};
use serde::de::DeserializeOwned;

use crate::error::Result;

pub const METRICS_GROUP: &str = "metrics.k8s.io";
pub const METRICS_VERSION: &str = "v1beta1";

/// `metrics.k8s.io` is not part of k8s-openapi, so it is addressed dynamically
pub fn metrics_resource(kind: &str, plural: &str) -> ApiResource {
    ApiResource {
        group: METRICS_GROUP.to_string(),
        version: METRICS_VERSION.to_string(),
        api_version: format!("{}/{}", METRICS_GROUP, METRICS_VERSION),
        kind: kind.to_string(),
        plural: plural.to_string(),
    }
}

pub fn pod_metrics_resource() -> ApiResource {
    metrics_resource("PodMetrics", "pods")
}

pub fn node_metrics_resource() -> ApiResource {
    metrics_resource("NodeMetrics", "nodes")
}

/// Read-only operations against one cluster
///
/// A `None` namespace means all namespaces.
pub trait ClusterBackend: Send + Sync {
    fn list_pods(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<Pod>>>;

    fn list_nodes(&self) -> BoxFuture<'_, Result<Vec<Node>>>;

    fn list_deployments(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<Deployment>>>;

    fn list_replica_sets(&self, namespace: Option<&str>)
    -> BoxFuture<'_, Result<Vec<ReplicaSet>>>;

    fn pod_metrics(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<DynamicObject>>>;

    fn node_metrics(&self) -> BoxFuture<'_, Result<Vec<DynamicObject>>>;
}

/// Resolves a context name to a backend for that cluster
pub trait ClusterConnector: Send + Sync {
    fn connect<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, Result<Arc<dyn ClusterBackend>>>;
}

/// [`ClusterBackend`] over a context-scoped `kube::Client`
#[derive(Clone)]
pub struct KubeBackend {
    client: kube::Client,
}

impl KubeBackend {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn list_scoped<K>(&self, namespace: Option<&str>) -> BoxFuture<'static, Result<Vec<K>>>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + 'static,
        K::DynamicType: Default,
    {
        let api: Api<K> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        async move { Ok(api.list(&ListParams::default()).await?.items) }.boxed()
    }

    fn list_metrics(
        &self,
        resource: ApiResource,
        namespace: Option<&str>,
    ) -> BoxFuture<'static, Result<Vec<DynamicObject>>> {
        let api: Api<DynamicObject> = match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        };
        async move { Ok(api.list(&ListParams::default()).await?.items) }.boxed()
    }
}

impl ClusterBackend for KubeBackend {
    fn list_pods(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<Pod>>> {
        self.list_scoped(namespace)
    }

    fn list_nodes(&self) -> BoxFuture<'_, Result<Vec<Node>>> {
        let api: Api<Node> = Api::all(self.client.clone());
        async move { Ok(api.list(&ListParams::default()).await?.items) }.boxed()
    }

    fn list_deployments(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<Deployment>>> {
        self.list_scoped(namespace)
    }

    fn list_replica_sets(
        &self,
        namespace: Option<&str>,
    ) -> BoxFuture<'_, Result<Vec<ReplicaSet>>> {
        self.list_scoped(namespace)
    }

    fn pod_metrics(&self, namespace: Option<&str>) -> BoxFuture<'_, Result<Vec<DynamicObject>>> {
        self.list_metrics(pod_metrics_resource(), namespace)
    }

    fn node_metrics(&self) -> BoxFuture<'_, Result<Vec<DynamicObject>>> {
        self.list_metrics(node_metrics_resource(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_resource_paths() {
        let pods = pod_metrics_resource();
        assert_eq!(pods.api_version, "metrics.k8s.io/v1beta1");
        assert_eq!(pods.plural, "pods");
        assert_eq!(pods.kind, "PodMetrics");

        let nodes = node_metrics_resource();
        assert_eq!(nodes.group, "metrics.k8s.io");
        assert_eq!(nodes.version, "v1beta1");
        assert_eq!(nodes.plural, "nodes");
    }
}
