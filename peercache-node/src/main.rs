//! Runnable peer node: loads a [`peercache::config::NodeConfig`], creates
//! the configured groups against a sample origin, wires an `HttpPool` peer
//! picker into each, and serves the peer wire protocol over `axum`.
//!
//! Process-level CLI and flag parsing, plus example origin data, live here
//! rather than in the library, so the crate has something you can
//! actually run as a cluster without those concerns leaking into it.

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use peercache::config::NodeConfig;
use peercache::group::GetterFn;
use peercache::server;
use peercache::transport::HttpPool;
use peercache::Group;

/// Run a peercache peer node.
#[derive(Parser, Debug)]
#[command(name = "peercache-node", about = "A peercache peer node")]
struct Args {
    /// Path to a TOML node config (see `peercache::config::NodeConfig`).
    #[arg(long)]
    config: String,

    /// Port to bind the HTTP listener to. Parsed out of `self_addr` in the
    /// config if omitted.
    #[arg(long)]
    port: Option<u16>,
}

/// The example origin this binary seeds every configured group with: a
/// small fixed map standing in for a real database or backing service.
fn sample_origin() -> HashMap<&'static str, &'static str> {
    HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config_text = std::fs::read_to_string(&args.config)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", args.config))?;
    let config = NodeConfig::from_toml(&config_text)?;

    let pool = Arc::new(HttpPool::new(
        config.self_addr.clone(),
        config.base_path.clone(),
        config.replicas,
    ));
    pool.set_peers(&config.peer_addrs);

    if config.groups.is_empty() {
        tracing::warn!("no groups configured; nothing will be servable");
    }
    for group_cfg in &config.groups {
        let origin = sample_origin();
        let group = Group::new(
            group_cfg.name.clone(),
            group_cfg.cache_bytes,
            GetterFn(move |key: &str| -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
                tracing::debug!(%key, "origin lookup");
                origin
                    .get(key)
                    .map(|v| v.as_bytes().to_vec())
                    .ok_or_else(|| format!("{key} not exist").into())
            }),
        );
        group.register_peers(pool.clone());
        tracing::info!(group = %group_cfg.name, cache_bytes = group_cfg.cache_bytes, "group ready");
    }

    let port = args.port.unwrap_or_else(|| {
        config
            .self_addr
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8001)
    });
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, self_addr = %config.self_addr, "starting peercache node");

    let app = server::router(&config.base_path);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves once an operator sends Ctrl-C, so `axum::serve` can finish any
/// in-flight peer requests before the listener drops.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler; shutting down immediately on next signal");
    }
    tracing::info!("shutdown signal received");
}
