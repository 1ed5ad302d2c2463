use crate::{pow::meets_difficulty, sha256_hex, Transaction};
use tracing::debug;

/// A block of transactions linked to its predecessor by hash.
///
/// `hash` always equals `calculate_hash()` for blocks built locally. Blocks
/// decoded from a peer carry the peer's stored nonce and hash verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    timestamp: String,
    transactions: Vec<Transaction>,
    previous_hash: String,
    nonce: u64,
    hash: String,
}

impl Block {
    pub fn new(
        timestamp: impl Into<String>,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut block = Self {
            timestamp: timestamp.into(),
            transactions,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Rebuild a block from stored parts without recomputing anything.
    pub(crate) fn from_parts(
        timestamp: String,
        transactions: Vec<Transaction>,
        previous_hash: String,
        nonce: u64,
        hash: String,
    ) -> Self {
        Self {
            timestamp,
            transactions,
            previous_hash,
            nonce,
            hash,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Hex digest over timestamp, the concatenated transaction hashes,
    /// previous hash and nonce.
    pub fn calculate_hash(&self) -> String {
        let tx_hashes: String = self
            .transactions
            .iter()
            .map(Transaction::calculate_hash)
            .collect();
        sha256_hex(format!(
            "{}{}{}{}",
            self.timestamp, tx_hashes, self.previous_hash, self.nonce
        ))
    }

    /// Proof of work: bump the nonce until the hash starts with `difficulty` zeros.
    /// Runs to completion on the calling thread.
    pub fn mine(&mut self, difficulty: u32) {
        while !meets_difficulty(&self.hash, difficulty) {
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.calculate_hash();
        }
        debug!(nonce = self.nonce, hash = %self.hash, "block mined");
    }
}
