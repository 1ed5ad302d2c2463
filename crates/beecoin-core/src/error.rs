use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed client input: a transaction missing required fields, a bad
    /// signature encoding or an unusable peer address.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    #[error("invalid chain: {0}")]
    InvalidChain(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
