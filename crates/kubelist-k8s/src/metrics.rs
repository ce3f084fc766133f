//! Attaching usage samples to listed objects

use std::collections::HashMap;

use kube::Resource;
use kube::api::{DynamicObject, ObjectMeta};
use serde::Serialize;
use serde_json::{Map, Value};

/// How a metrics record is matched to its object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricsKey {
    /// Match on (namespace, name), for pods
    NamespacedName,
    /// Match on name only, for nodes
    Name,
}

impl MetricsKey {
    fn of(&self, meta: &ObjectMeta) -> (String, String) {
        let name = meta.name.clone().unwrap_or_default();
        match self {
            Self::NamespacedName => (meta.namespace.clone().unwrap_or_default(), name),
            Self::Name => (String::new(), name),
        }
    }
}

/// Index metrics records by the key used to match them to objects
///
/// Later records win on duplicate keys.
pub fn index_metrics(
    metrics: Vec<DynamicObject>,
    key: MetricsKey,
) -> Result<HashMap<(String, String), Value>, serde_json::Error> {
    metrics
        .into_iter()
        .map(|m| {
            let k = key.of(&m.metadata);
            serde_json::to_value(m).map(|v| (k, v))
        })
        .collect()
}

/// Serialize every object and attach its usage sample under `metrics`
///
/// Objects without a matching sample get `{}`. Order is preserved.
pub fn attach_metrics<K>(
    objects: Vec<K>,
    metrics: Vec<DynamicObject>,
    key: MetricsKey,
) -> Result<Vec<Value>, serde_json::Error>
where
    K: Resource + Serialize,
{
    let index = index_metrics(metrics, key)?;

    objects
        .into_iter()
        .map(|obj| {
            let sample = index
                .get(&key.of(obj.meta()))
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            let mut value = serde_json::to_value(&obj)?;
            if let Value::Object(fields) = &mut value {
                fields.insert("metrics".to_string(), sample);
            }
            Ok(value)
        })
        .collect()
}

/// Render metrics records as opaque JSON, in list order
pub fn metrics_to_values(metrics: Vec<DynamicObject>) -> Result<Vec<Value>, serde_json::Error> {
    metrics.into_iter().map(serde_json::to_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{node_metrics_resource, pod_metrics_resource};
    use k8s_openapi::api::core::v1::{Node, Pod};
    use serde_json::json;

    fn pod(namespace: &str, name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn node(name: &str) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn pod_sample(namespace: &str, name: &str, cpu: &str) -> DynamicObject {
        DynamicObject::new(name, &pod_metrics_resource())
            .within(namespace)
            .data(json!({"containers": [{"name": "app", "usage": {"cpu": cpu, "memory": "10Mi"}}]}))
    }

    fn node_sample(name: &str, cpu: &str) -> DynamicObject {
        DynamicObject::new(name, &node_metrics_resource())
            .data(json!({"usage": {"cpu": cpu, "memory": "1Gi"}}))
    }

    #[test]
    fn test_pod_metrics_match_on_namespace_and_name() {
        let pods = vec![pod("default", "web"), pod("kube-system", "web")];
        let metrics = vec![pod_sample("kube-system", "web", "5m")];

        let items = attach_metrics(pods, metrics, MetricsKey::NamespacedName).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["metrics"], json!({}));
        assert_eq!(items[1]["metrics"]["containers"][0]["usage"]["cpu"], "5m");
        assert_eq!(items[1]["metrics"]["metadata"]["namespace"], "kube-system");
    }

    #[test]
    fn test_node_metrics_match_on_name() {
        let nodes = vec![node("node-b"), node("node-a")];
        let metrics = vec![node_sample("node-a", "250m"), node_sample("node-c", "1")];

        let items = attach_metrics(nodes, metrics, MetricsKey::Name).unwrap();
        assert_eq!(items[0]["metadata"]["name"], "node-b");
        assert_eq!(items[0]["metrics"], json!({}));
        assert_eq!(items[1]["metadata"]["name"], "node-a");
        assert_eq!(items[1]["metrics"]["usage"]["cpu"], "250m");
    }

    #[test]
    fn test_no_metrics_yields_empty_objects() {
        let items = attach_metrics(vec![pod("default", "a")], Vec::new(), MetricsKey::NamespacedName)
            .unwrap();
        assert_eq!(items[0]["metrics"], json!({}));
        assert_eq!(items[0]["kind"], "Pod");
    }

    #[test]
    fn test_metrics_to_values_keeps_order() {
        let values =
            metrics_to_values(vec![node_sample("n2", "1"), node_sample("n1", "2")]).unwrap();
        assert_eq!(values[0]["metadata"]["name"], "n2");
        assert_eq!(values[1]["metadata"]["name"], "n1");
    }
}
