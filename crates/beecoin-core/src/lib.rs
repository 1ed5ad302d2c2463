pub mod block;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod pow;
pub mod transaction;
pub mod wire;

pub use block::Block;
pub use consensus::{resolve_conflicts, Resolution};
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerConfig, SignatureVerifier, Unverified};
pub use transaction::Transaction;
pub use wire::{BlockRecord, ChainSnapshot, TransactionRecord, TransactionRequest};

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// SHA-256 of `data`, lowercase hex encoded.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// Current time as unix milliseconds, the resolution transactions are stamped with.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Current time as an RFC 3339 UTC string, the form block timestamps take.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
