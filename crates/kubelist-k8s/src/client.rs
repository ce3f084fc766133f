//! Kubeconfig contexts and context-scoped clients

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kubelist_types::{ClusterList, ContextInfo};
use parking_lot::RwLock;

use crate::backend::{ClusterBackend, ClusterConnector, KubeBackend};
use crate::error::{ClusterError, Result};

/// Where the kubeconfig is read from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KubeconfigSource {
    /// `KUBECONFIG`, falling back to `~/.kube/config`
    #[default]
    Default,
    /// A single explicit file
    Path(PathBuf),
}

impl KubeconfigSource {
    fn load(&self) -> Result<Kubeconfig> {
        let loaded = match self {
            Self::Default => Kubeconfig::read(),
            Self::Path(path) => Kubeconfig::read_from(path),
        };
        loaded.map_err(|e| ClusterError::Configuration(e.to_string()))
    }
}

/// Kubernetes client wrapper
///
/// Reads the kubeconfig on demand and keeps one `kube::Client` per context
/// name. Selecting a cluster never touches the kubeconfig's current context.
pub struct KubeClient {
    source: KubeconfigSource,
    timeout: Duration,
    clients: RwLock<HashMap<String, kube::Client>>,
}

impl KubeClient {
    /// `timeout` bounds connect and read on every client built here
    pub fn new(source: KubeconfigSource, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Read and validate the kubeconfig off the async workers
    async fn kubeconfig(&self) -> Result<Kubeconfig> {
        let source = self.source.clone();
        let kubeconfig = tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| ClusterError::Configuration(format!("kubeconfig load aborted: {}", e)))??;
        if kubeconfig.contexts.is_empty() {
            return Err(ClusterError::Configuration(
                "no contexts defined in kubeconfig".to_string(),
            ));
        }
        Ok(kubeconfig)
    }

    /// Get all available contexts from kubeconfig
    pub async fn get_contexts(&self) -> Result<Vec<ContextInfo>> {
        let kubeconfig = self.kubeconfig().await?;
        let current_context = kubeconfig.current_context.as_ref();

        Ok(kubeconfig
            .contexts
            .iter()
            .map(|ctx| {
                let context = ctx.context.as_ref();
                ContextInfo::new(
                    ctx.name.clone(),
                    context.map(|c| c.cluster.clone()).unwrap_or_default(),
                    context.and_then(|c| c.user.clone()).unwrap_or_default(),
                    context.and_then(|c| c.namespace.clone()),
                    Some(&ctx.name) == current_context,
                )
            })
            .collect())
    }

    /// Context names plus the kubeconfig's current context
    pub async fn list_clusters(&self) -> Result<ClusterList> {
        Ok(ClusterList::from_contexts(&self.get_contexts().await?))
    }

    /// Get or create a kube::Client for a specific context
    pub async fn client_for_context(&self, context_name: &str) -> Result<kube::Client> {
        let cached = self.clients.read().get(context_name).cloned();
        if let Some(client) = cached {
            return Ok(client);
        }

        let kubeconfig = self.kubeconfig().await?;
        if !kubeconfig.contexts.iter().any(|c| c.name == context_name) {
            return Err(ClusterError::UnknownCluster(context_name.to_string()));
        }

        let mut config = kube::Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: Some(context_name.to_string()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            ClusterError::Configuration(format!(
                "failed to create config for context {}: {}",
                context_name, e
            ))
        })?;
        config.connect_timeout = Some(self.timeout);
        config.read_timeout = Some(self.timeout);

        let client = kube::Client::try_from(config)?;
        tracing::debug!(context = context_name, "created cluster client");

        // A concurrent request may have raced us here; either client is valid
        Ok(self
            .clients
            .write()
            .entry(context_name.to_string())
            .or_insert(client)
            .clone())
    }

    /// Number of contexts with a live client
    pub fn cached_clients(&self) -> usize {
        self.clients.read().len()
    }
}

impl ClusterConnector for KubeClient {
    fn connect<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, Result<Arc<dyn ClusterBackend>>> {
        async move {
            let client = self.client_for_context(cluster).await?;
            Ok(Arc::new(KubeBackend::new(client)) as Arc<dyn ClusterBackend>)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
- name: dev-cluster
  cluster:
    server: http://127.0.0.1:6443
- name: prod-cluster
  cluster:
    server: http://127.0.0.1:7443
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: dev-user
- name: prod
  context:
    cluster: prod-cluster
    user: prod-user
    namespace: apps
users:
- name: dev-user
  user:
    token: dev-token
- name: prod-user
  user:
    token: prod-token
"#;

    fn kubeconfig_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn client_for(file: &NamedTempFile) -> KubeClient {
        KubeClient::new(
            KubeconfigSource::Path(file.path().to_path_buf()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_get_contexts() {
        let file = kubeconfig_file(KUBECONFIG);
        let contexts = client_for(&file).get_contexts().await.unwrap();

        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].name, "dev");
        assert_eq!(contexts[0].cluster, "dev-cluster");
        assert_eq!(contexts[0].user, "dev-user");
        assert!(contexts[0].is_current);
        assert_eq!(contexts[1].namespace.as_deref(), Some("apps"));
        assert!(!contexts[1].is_current);
    }

    #[tokio::test]
    async fn test_list_clusters() {
        let file = kubeconfig_file(KUBECONFIG);
        let list = client_for(&file).list_clusters().await.unwrap();

        assert_eq!(list.available_clusters, vec!["dev", "prod"]);
        assert_eq!(list.current_context.as_deref(), Some("dev"));
    }

    #[tokio::test]
    async fn test_listing_leaves_current_context_alone() {
        let file = kubeconfig_file(KUBECONFIG);
        let client = client_for(&file);

        let first = client.list_clusters().await.unwrap();
        let second = client.list_clusters().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), KUBECONFIG);
    }

    #[tokio::test]
    async fn test_missing_kubeconfig() {
        let client = KubeClient::new(
            KubeconfigSource::Path(PathBuf::from("/nonexistent/kubeconfig")),
            Duration::from_secs(5),
        );
        let err = client.list_clusters().await.unwrap_err();
        assert!(matches!(err, ClusterError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_malformed_kubeconfig() {
        let file = kubeconfig_file("contexts: [this is not: valid");
        let err = client_for(&file).list_clusters().await.unwrap_err();
        assert!(matches!(err, ClusterError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_kubeconfig_without_contexts() {
        let file = kubeconfig_file("apiVersion: v1\nkind: Config\ncontexts: []\n");
        let err = client_for(&file).list_clusters().await.unwrap_err();
        assert!(matches!(err, ClusterError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_context() {
        let file = kubeconfig_file(KUBECONFIG);
        let client = client_for(&file);

        let Err(err) = client.client_for_context("staging").await else {
            panic!("expected an unknown cluster error");
        };
        assert!(matches!(err, ClusterError::UnknownCluster(name) if name == "staging"));
        assert_eq!(client.cached_clients(), 0);
    }

    #[tokio::test]
    async fn test_clients_are_cached_per_context() {
        let file = kubeconfig_file(KUBECONFIG);
        let client = client_for(&file);

        client.client_for_context("dev").await.unwrap();
        client.client_for_context("dev").await.unwrap();
        assert_eq!(client.cached_clients(), 1);

        client.client_for_context("prod").await.unwrap();
        assert_eq!(client.cached_clients(), 2);

        // Building clients does not change what the kubeconfig reports
        let list = client.list_clusters().await.unwrap();
        assert_eq!(list.current_context.as_deref(), Some("dev"));
    }
}
