use crate::{now_millis, sha256_hex};

/// A value transfer from `from` to `to`. Reward transactions have no sender.
///
/// Fields are private so a transaction cannot change once it has been handed
/// to the ledger; the content hash is always recomputed from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    from: Option<String>,
    to: String,
    amount: u64,
    fee: u64,
    timestamp: u64,
    signature: Option<Vec<u8>>,
}

impl Transaction {
    /// A transfer stamped with the current time.
    pub fn new(from: Option<String>, to: impl Into<String>, amount: u64, fee: u64) -> Self {
        Self::with_timestamp(from, to, amount, fee, now_millis())
    }

    pub fn with_timestamp(
        from: Option<String>,
        to: impl Into<String>,
        amount: u64,
        fee: u64,
        timestamp: u64,
    ) -> Self {
        Self {
            from,
            to: to.into(),
            amount,
            fee,
            timestamp,
            signature: None,
        }
    }

    /// The sender-less transaction crediting a miner.
    pub fn reward(to: impl Into<String>, amount: u64) -> Self {
        Self::new(None, to, amount, 0)
    }

    /// Attach an opaque signature. The signature is not part of the content hash.
    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    pub fn is_reward(&self) -> bool {
        self.from.is_none()
    }

    /// Hex digest over sender (or ""), recipient, amount, fee and timestamp, in that order.
    pub fn calculate_hash(&self) -> String {
        let data = format!(
            "{}{}{}{}{}",
            self.from.as_deref().unwrap_or(""),
            self.to,
            self.amount,
            self.fee,
            self.timestamp
        );
        sha256_hex(data)
    }
}
