//! Wire schema exchanged between nodes and clients.
//!
//! These records are the only serialized form of the ledger. They are kept
//! separate from [`Block`] and [`Transaction`] so the internal layout can change
//! without touching the JSON peers see. Field names and order are part of the
//! contract.

use crate::{constants::WIRE_VERSION, Block, LedgerError, Result, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub from_address: Option<String>,
    pub to_address: String,
    pub amount: u64,
    pub fee: u64,
    pub timestamp: u64,
    /// Hex encoded signature bytes.
    pub signature: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub timestamp: String,
    pub transactions: Vec<TransactionRecord>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

/// A node's full chain as served on `/chain`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<BlockRecord>,
    pub length: usize,
    #[serde(default = "wire_version")]
    pub version: u32,
}

fn wire_version() -> u32 {
    WIRE_VERSION
}

impl ChainSnapshot {
    pub fn from_blocks(blocks: &[Block]) -> Self {
        Self {
            chain: blocks.iter().map(BlockRecord::from).collect(),
            length: blocks.len(),
            version: WIRE_VERSION,
        }
    }
}

/// A client's request to enqueue a transaction. Every field is optional on the
/// wire so missing ones can be reported together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default, alias = "from_address")]
    pub sender: Option<String>,
    #[serde(default, alias = "to_address")]
    pub recipient: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl TransactionRequest {
    /// Build the transaction, failing with [`LedgerError::Validation`] when
    /// `recipient`, `amount` or `fee` is absent.
    pub fn into_transaction(self) -> Result<Transaction> {
        let mut missing = Vec::new();
        if self.recipient.is_none() {
            missing.push("recipient");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.fee.is_none() {
            missing.push("fee");
        }
        let (Some(recipient), Some(amount), Some(fee)) = (self.recipient, self.amount, self.fee)
        else {
            return Err(LedgerError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        };

        let tx = match self.timestamp {
            Some(ts) => Transaction::with_timestamp(self.sender, recipient, amount, fee, ts),
            None => Transaction::new(self.sender, recipient, amount, fee),
        };
        match self.signature {
            Some(sig) => Ok(tx.with_signature(decode_signature(&sig)?)),
            None => Ok(tx),
        }
    }
}

fn decode_signature(sig: &str) -> Result<Vec<u8>> {
    hex::decode(sig).map_err(|e| LedgerError::Validation(format!("signature is not hex: {e}")))
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        Self {
            from_address: tx.from().map(str::to_owned),
            to_address: tx.to().to_owned(),
            amount: tx.amount(),
            fee: tx.fee(),
            timestamp: tx.timestamp(),
            signature: tx.signature().map(hex::encode),
        }
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = LedgerError;

    fn try_from(record: TransactionRecord) -> Result<Self> {
        let tx = Transaction::with_timestamp(
            record.from_address,
            record.to_address,
            record.amount,
            record.fee,
            record.timestamp,
        );
        match record.signature {
            Some(sig) => Ok(tx.with_signature(decode_signature(&sig)?)),
            None => Ok(tx),
        }
    }
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        Self {
            timestamp: block.timestamp().to_owned(),
            transactions: block
                .transactions()
                .iter()
                .map(TransactionRecord::from)
                .collect(),
            previous_hash: block.previous_hash().to_owned(),
            nonce: block.nonce(),
            hash: block.hash().to_owned(),
        }
    }
}

impl TryFrom<BlockRecord> for Block {
    type Error = LedgerError;

    /// Nonce and hash are taken as stored, never recomputed.
    fn try_from(record: BlockRecord) -> Result<Self> {
        let transactions = record
            .transactions
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Block::from_parts(
            record.timestamp,
            transactions,
            record.previous_hash,
            record.nonce,
            record.hash,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TransactionRequest {
        TransactionRequest {
            sender: Some("alice".into()),
            recipient: Some("bob".into()),
            amount: Some(10),
            fee: Some(1),
            timestamp: Some(1_600_000_000_000),
            signature: None,
        }
    }

    #[test]
    fn transaction_record_json_example() {
        let tx = Transaction::with_timestamp(Some("alice".into()), "bob", 10, 1, 1_600_000_000_000)
            .with_signature(vec![0xab, 0xcd]);
        let json = serde_json::to_string(&TransactionRecord::from(&tx)).unwrap();
        let expected = concat!(
            r#"{"from_address":"alice","to_address":"bob","amount":10,"fee":1,"#,
            r#""timestamp":1600000000000,"signature":"abcd"}"#
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn reward_record_has_null_sender() {
        let tx = Transaction::with_timestamp(None, "miner", 100, 0, 1);
        let json = serde_json::to_value(TransactionRecord::from(&tx)).unwrap();
        assert!(json["from_address"].is_null());
        assert!(json["signature"].is_null());
    }

    #[test]
    fn block_record_field_order() {
        let block = Block::new("t", vec![], "0");
        let json = serde_json::to_string(&BlockRecord::from(&block)).unwrap();
        let expected = format!(
            r#"{{"timestamp":"t","transactions":[],"previous_hash":"0","nonce":0,"hash":"{}"}}"#,
            block.hash()
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn decoding_keeps_stored_nonce_and_hash() {
        let record = BlockRecord {
            timestamp: "t".into(),
            transactions: vec![],
            previous_hash: "0".into(),
            nonce: 42,
            hash: "not-a-real-hash".into(),
        };
        let block = Block::try_from(record).unwrap();
        assert_eq!(block.nonce(), 42);
        assert_eq!(block.hash(), "not-a-real-hash");
    }

    #[test]
    fn decoding_rejects_bad_signature() {
        let record = TransactionRecord {
            from_address: Some("alice".into()),
            to_address: "bob".into(),
            amount: 1,
            fee: 0,
            timestamp: 1,
            signature: Some("zz".into()),
        };
        assert!(matches!(
            Transaction::try_from(record),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn snapshot_version_defaults_when_absent() {
        let json = r#"{"chain":[],"length":0}"#;
        let snapshot: ChainSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.version, WIRE_VERSION);
    }

    #[test]
    fn snapshot_from_blocks_reports_length() {
        let blocks = vec![Block::new("a", vec![], "0"), Block::new("b", vec![], "x")];
        let snapshot = ChainSnapshot::from_blocks(&blocks);
        assert_eq!(snapshot.length, 2);
        assert_eq!(snapshot.chain[1].previous_hash, "x");
    }

    #[test]
    fn request_into_transaction() {
        let tx = request().into_transaction().unwrap();
        assert_eq!(tx.from(), Some("alice"));
        assert_eq!(tx.to(), "bob");
        assert_eq!(tx.amount(), 10);
        assert_eq!(tx.fee(), 1);
        assert_eq!(tx.timestamp(), 1_600_000_000_000);
    }

    #[test]
    fn request_without_sender_is_accepted() {
        let req = TransactionRequest {
            sender: None,
            ..request()
        };
        assert!(req.into_transaction().unwrap().is_reward());
    }

    #[test]
    fn request_reports_every_missing_field() {
        let err = TransactionRequest::default().into_transaction().unwrap_err();
        assert_eq!(
            err,
            LedgerError::Validation("missing required fields: recipient, amount, fee".into())
        );
    }

    #[test]
    fn request_missing_fee_is_rejected() {
        let req = TransactionRequest {
            fee: None,
            ..request()
        };
        assert!(matches!(req.into_transaction(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn request_accepts_wallet_field_names() {
        let json =
            r#"{"from_address":"alice","to_address":"bob","amount":3,"fee":0,"signature":"00ff"}"#;
        let req: TransactionRequest = serde_json::from_str(json).unwrap();
        let tx = req.into_transaction().unwrap();
        assert_eq!(tx.to(), "bob");
        assert_eq!(tx.signature(), Some(&[0x00, 0xff][..]));
    }
}
