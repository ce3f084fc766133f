//! Runtime settings: defaults, then an optional TOML file, then CLI flags

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use kubelist_k8s::KubeconfigSource;
use serde::Deserialize;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Contents of the config file; every key is optional
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub listen: Option<SocketAddr>,
    pub kubeconfig: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Values given on the command line
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub listen: Option<SocketAddr>,
    pub kubeconfig: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub listen: SocketAddr,
    pub kubeconfig: KubeconfigSource,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let file = match &overrides.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let listen = match overrides.listen.or(file.listen) {
            Some(addr) => addr,
            None => DEFAULT_LISTEN.parse().context("Invalid default listen address")?,
        };

        let timeout_secs = overrides
            .request_timeout_secs
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            anyhow::bail!("request timeout must be at least one second");
        }

        let kubeconfig = overrides
            .kubeconfig
            .or(file.kubeconfig)
            .map(KubeconfigSource::Path)
            .unwrap_or_default();

        Ok(Self {
            listen,
            kubeconfig,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
