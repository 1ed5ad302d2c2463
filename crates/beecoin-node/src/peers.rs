use crate::constants::CHAIN_PATH;
use beecoin_core::{ChainSnapshot, LedgerError, Result};
use reqwest::{Client, Url};
use std::{collections::BTreeSet, time::Duration};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Known peers, stored as `host[:port]`.
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    nodes: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer given as a URL (`http://10.0.0.2:5000`) or a bare
    /// `host:port`. Returns the stored address.
    pub fn register(&mut self, address: &str) -> Result<String> {
        let netloc = netloc(address)?;
        if self.nodes.insert(netloc.clone()) {
            debug!(peer = %netloc, "registered peer");
        }
        Ok(netloc)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }
}

fn netloc(address: &str) -> Result<String> {
    let address = address.trim();
    let url = Url::parse(address)
        .ok()
        .filter(Url::has_host)
        .or_else(|| Url::parse(&format!("http://{address}")).ok())
        .filter(Url::has_host)
        .ok_or_else(|| LedgerError::Validation(format!("invalid peer address {address:?}")))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LedgerError::Validation(format!("peer address {address:?} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Fetches peer chains over HTTP with a bounded per-peer timeout.
#[derive(Clone, Debug)]
pub struct PeerClient {
    http: Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    pub async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot> {
        let unreachable = |err: reqwest::Error| LedgerError::PeerUnreachable {
            peer: peer.to_string(),
            reason: err.to_string(),
        };
        let response = self
            .http
            .get(format!("http://{peer}{CHAIN_PATH}"))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unreachable)?;
        response.json::<ChainSnapshot>().await.map_err(|err| {
            if err.is_timeout() {
                unreachable(err)
            } else {
                LedgerError::InvalidChain(format!("undecodable chain from {peer}: {err}"))
            }
        })
    }

    /// Query every peer concurrently. Results come back in the order given.
    pub async fn fetch_all(&self, peers: Vec<String>) -> Vec<(String, Result<ChainSnapshot>)> {
        let mut tasks = JoinSet::new();
        for (order, peer) in peers.into_iter().enumerate() {
            let client = self.clone();
            tasks.spawn(async move {
                let response = client.fetch_chain(&peer).await;
                (order, peer, response)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => warn!(%err, "peer fetch task failed"),
            }
        }
        results.sort_by_key(|(order, _, _)| *order);
        results
            .into_iter()
            .map(|(_, peer, response)| (peer, response))
            .collect()
    }
}
