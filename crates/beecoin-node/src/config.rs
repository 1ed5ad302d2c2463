use crate::constants::{DEFAULT_LISTEN, DEFAULT_PEER_TIMEOUT_MS};
use beecoin_core::{
    constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, MAX_DIFFICULTY},
    LedgerConfig,
};
use clap::Parser;
use std::time::Duration;

/// Node settings, from flags or `BEECOIN_*` environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "beecoin-node", about = "BeeCoin ledger node")]
pub struct NodeConfig {
    /// Address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, env = "BEECOIN_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Leading zero hex characters required in a block hash
    #[arg(
        long,
        env = "BEECOIN_DIFFICULTY",
        default_value_t = DEFAULT_DIFFICULTY,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_DIFFICULTY))
    )]
    pub difficulty: u32,

    /// Base reward credited to the miner of each block
    #[arg(long, env = "BEECOIN_MINING_REWARD", default_value_t = DEFAULT_MINING_REWARD)]
    pub mining_reward: u64,

    /// Per-peer timeout when fetching chains during consensus, in milliseconds
    #[arg(long, env = "BEECOIN_PEER_TIMEOUT_MS", default_value_t = DEFAULT_PEER_TIMEOUT_MS)]
    pub peer_timeout_ms: u64,

    /// Peers to register at startup (repeatable or comma separated)
    #[arg(long = "peer", env = "BEECOIN_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Address credited when this node mines; random when unset
    #[arg(long, env = "BEECOIN_NODE_ID")]
    pub node_id: Option<String>,
}

impl NodeConfig {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
        }
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NodeConfig::try_parse_from(["beecoin-node"]).unwrap();
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.ledger_config(), LedgerConfig::default());
        assert_eq!(config.peer_timeout(), Duration::from_secs(3));
        assert!(config.peers.is_empty());
        assert!(config.node_id.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = NodeConfig::try_parse_from([
            "beecoin-node",
            "--listen",
            "0.0.0.0:6000",
            "--difficulty",
            "2",
            "--peer",
            "http://a:5000,b:5001",
            "--peer-timeout-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(config.listen, "0.0.0.0:6000");
        assert_eq!(config.ledger_config().difficulty, 2);
        assert_eq!(config.peers, vec!["http://a:5000", "b:5001"]);
        assert_eq!(config.peer_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn difficulty_is_bounded_by_hash_width() {
        let max = MAX_DIFFICULTY.to_string();
        let config = NodeConfig::try_parse_from(["beecoin-node", "--difficulty", &max]).unwrap();
        assert_eq!(config.difficulty, MAX_DIFFICULTY);
        assert!(config.ledger_config().validate().is_ok());

        let over = (MAX_DIFFICULTY + 1).to_string();
        assert!(NodeConfig::try_parse_from(["beecoin-node", "--difficulty", &over]).is_err());
    }
}
