//! HTTP routes for kubelist
//!
//! Maps URL paths onto the context resolver and the resource query service,
//! and translates cluster errors into status codes.

use axum::Router;
use axum::routing::get;

pub mod clusters;
pub mod error;
mod state;

pub use error::{ApiError, ErrorDto};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/clusters", get(clusters::list_clusters_handler))
        .route(
            "/clusters/:cluster/resources/:resource_type",
            get(clusters::get_resource_handler),
        )
        .route(
            "/clusters/:cluster/metrics/summary",
            get(clusters::metrics_summary_handler),
        )
        .route(
            "/clusters/:cluster/deployments",
            get(clusters::deployments_handler),
        )
        .route(
            "/clusters/:cluster/replicasets",
            get(clusters::replica_sets_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use kubelist_k8s::fake::{FakeCluster, FakeConnector};
    use kubelist_k8s::{KubeClient, KubeconfigSource, ResourceQueryService};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let contexts = Arc::new(KubeClient::new(
            KubeconfigSource::Path("/nonexistent/kubeconfig".into()),
            Duration::from_secs(5),
        ));
        let cluster = FakeCluster::new()
            .with_pod("default", "api-0")
            .with_pod("kube-system", "coredns-0")
            .with_pod_metrics("default", "api-0", "20m");
        let connector = FakeConnector::new().with_cluster("dev", cluster);
        let queries = ResourceQueryService::new(Arc::new(connector), Duration::from_secs(5));
        router(AppState::new(contexts, queries))
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let response = test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_get_pods_over_http() {
        let (status, body) = get("/clusters/dev/resources/pod?namespace=default").await;

        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["metadata"]["name"], "api-0");
        assert_eq!(items[0]["metrics"]["containers"][0]["usage"]["cpu"], "20m");
    }

    #[tokio::test]
    async fn test_unsupported_resource_over_http() {
        let (status, body) = get("/clusters/dev/resources/service").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "UNSUPPORTED_RESOURCE");
        assert_eq!(body["detail"], "Unsupported resource type: service");
    }

    #[tokio::test]
    async fn test_unknown_cluster_over_http() {
        let (status, body) = get("/clusters/staging/resources/pod").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "UNKNOWN_CLUSTER");
    }

    #[tokio::test]
    async fn test_list_clusters_without_kubeconfig_over_http() {
        let (status, body) = get("/clusters").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "CONFIGURATION_ERROR");
    }
}
