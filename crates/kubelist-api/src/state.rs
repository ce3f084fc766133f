use std::sync::Arc;

use axum::extract::FromRef;
use kubelist_k8s::{KubeClient, ResourceQueryService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    contexts: Arc<KubeClient>,
    queries: ResourceQueryService,
}

impl AppState {
    pub fn new(contexts: Arc<KubeClient>, queries: ResourceQueryService) -> Self {
        Self { contexts, queries }
    }

    /// Serve queries through the same client arena that resolves contexts
    pub fn from_kube_client(client: Arc<KubeClient>, timeout: std::time::Duration) -> Self {
        let queries = ResourceQueryService::new(client.clone(), timeout);
        Self::new(client, queries)
    }
}

impl FromRef<AppState> for Arc<KubeClient> {
    fn from_ref(state: &AppState) -> Self {
        state.contexts.clone()
    }
}

impl FromRef<AppState> for ResourceQueryService {
    fn from_ref(state: &AppState) -> Self {
        state.queries.clone()
    }
}
