use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use kubelist_api::AppState;
use kubelist_k8s::KubeClient;

use crate::config::{Overrides, Settings};

mod config;

/// Kubelist - An HTTP facade over Kubernetes contexts, resources and usage metrics
#[derive(Parser, Debug)]
#[command(name = "kubelist")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to serve HTTP on [default: 127.0.0.1:8000]
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long, value_name = "FILE")]
    kubeconfig: Option<PathBuf>,

    /// Timeout for each cluster API call, in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    request_timeout_secs: Option<u64>,
}

impl From<Args> for Overrides {
    fn from(args: Args) -> Self {
        Self {
            config: args.config,
            listen: args.listen,
            kubeconfig: args.kubeconfig,
            request_timeout_secs: args.request_timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(Settings::resolve(args.into())?).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(settings: Settings) -> Result<()> {
    let client = Arc::new(KubeClient::new(
        settings.kubeconfig.clone(),
        settings.request_timeout,
    ));
    let app = kubelist_api::router(AppState::from_kube_client(
        client,
        settings.request_timeout,
    ));

    let listener = TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("Failed to bind {}", settings.listen))?;
    tracing::info!(address = %settings.listen, "kubelist listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("kubelist stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
