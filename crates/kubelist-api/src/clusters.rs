use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use kubelist_k8s::{KubeClient, ResourceQueryService};
use kubelist_types::{ClusterList, DeploymentList, MetricsSummary, ReplicaSetList, ResourceList};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct NamespaceParams {
    pub namespace: Option<String>,
}

pub async fn list_clusters_handler(
    State(contexts): State<Arc<KubeClient>>,
) -> Result<Json<ClusterList>, ApiError> {
    Ok(Json(contexts.list_clusters().await?))
}

pub async fn get_resource_handler(
    Path((cluster, resource_type)): Path<(String, String)>,
    Query(params): Query<NamespaceParams>,
    State(svc): State<ResourceQueryService>,
) -> Result<Json<ResourceList>, ApiError> {
    let list = svc
        .get_resource(&cluster, &resource_type, params.namespace.as_deref())
        .await?;
    Ok(Json(list))
}

pub async fn metrics_summary_handler(
    Path(cluster): Path<String>,
    State(svc): State<ResourceQueryService>,
) -> Result<Json<MetricsSummary>, ApiError> {
    Ok(Json(svc.get_cluster_metrics_summary(&cluster).await?))
}

pub async fn deployments_handler(
    Path(cluster): Path<String>,
    Query(params): Query<NamespaceParams>,
    State(svc): State<ResourceQueryService>,
) -> Result<Json<DeploymentList>, ApiError> {
    let list = svc
        .list_deployments(&cluster, params.namespace.as_deref())
        .await?;
    Ok(Json(list))
}

pub async fn replica_sets_handler(
    Path(cluster): Path<String>,
    Query(params): Query<NamespaceParams>,
    State(svc): State<ResourceQueryService>,
) -> Result<Json<ReplicaSetList>, ApiError> {
    let list = svc
        .list_replica_sets(&cluster, params.namespace.as_deref())
        .await?;
    Ok(Json(list))
}
