use crate::{constants::NODE_ID_BYTES, peers::PeerClient, peers::PeerRegistry, NodeConfig};
use beecoin_core::{resolve_conflicts, ChainSnapshot, Ledger, LedgerConfig, Resolution};
use rand::RngCore;
use std::{sync::Arc, time::Duration};
use tokio::sync::{Mutex, RwLock};

/// Server context shared by every handler.
///
/// The ledger sits behind one mutex: mining holds it from reading the pool
/// until the pool is cleared, so no request observes a half-mined round.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<Ledger>>,
    pub peers: Arc<RwLock<PeerRegistry>>,
    pub client: PeerClient,
    pub node_id: Arc<str>,
}

impl AppState {
    pub fn new(
        ledger: LedgerConfig,
        peer_timeout: Duration,
        node_id: Option<String>,
    ) -> anyhow::Result<Self> {
        ledger.validate()?;
        let node_id = node_id.unwrap_or_else(random_node_id);
        Ok(Self {
            ledger: Arc::new(Mutex::new(Ledger::new(ledger))),
            peers: Arc::new(RwLock::new(PeerRegistry::new())),
            client: PeerClient::new(peer_timeout)?,
            node_id: node_id.into(),
        })
    }

    pub fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        Self::new(
            config.ledger_config(),
            config.peer_timeout(),
            config.node_id.clone(),
        )
    }

    /// Fetch every registered peer's chain, then apply the longest-valid-chain
    /// rule under the ledger lock on the blocking pool.
    pub async fn resolve(&self) -> anyhow::Result<(Resolution, ChainSnapshot)> {
        let peers = self.peers.read().await.to_vec();
        let responses = self.client.fetch_all(peers).await;
        let ledger = self.ledger.clone();
        let resolved = tokio::task::spawn_blocking(move || {
            let mut ledger = ledger.blocking_lock();
            let resolution = resolve_conflicts(&mut ledger, responses);
            (resolution, ledger.snapshot())
        })
        .await?;
        Ok(resolved)
    }
}

fn random_node_id() -> String {
    let mut bytes = [0u8; NODE_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
