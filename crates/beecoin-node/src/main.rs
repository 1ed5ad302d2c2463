use beecoin_node::{router, AppState, NodeConfig};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::parse();
    let state = AppState::from_config(&config)?;
    {
        let mut peers = state.peers.write().await;
        for peer in &config.peers {
            peers.register(peer)?;
        }
    }

    let addr: SocketAddr = config.listen.parse()?;
    info!(
        node_id = %state.node_id,
        difficulty = config.difficulty,
        peers = config.peers.len(),
        "beecoin-node listening on http://{addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
