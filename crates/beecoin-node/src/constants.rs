pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub(crate) const DEFAULT_PEER_TIMEOUT_MS: u64 = 3_000;
pub(crate) const NODE_ID_BYTES: usize = 16;
pub(crate) const CHAIN_PATH: &str = "/chain";
