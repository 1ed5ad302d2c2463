use crate::{
    constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, GENESIS_PREVIOUS_HASH, MAX_DIFFICULTY},
    now_rfc3339,
    pow::meets_difficulty,
    Block, BlockRecord, ChainSnapshot, LedgerError, Result, Transaction,
};
use rayon::prelude::*;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Leading zero hex characters a mined block hash must carry.
    pub difficulty: u32,
    /// Base amount credited to the miner of every block, before fees.
    pub mining_reward: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
        }
    }
}

impl LedgerConfig {
    /// Mining never terminates above [`MAX_DIFFICULTY`].
    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Validation(format!(
                "difficulty {} exceeds the maximum of {MAX_DIFFICULTY}",
                self.difficulty
            )));
        }
        Ok(())
    }
}

/// Hook for checking transaction signatures during chain validation.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, tx: &Transaction) -> bool;
}

/// Accepts every transaction. Signing belongs to the wallet layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unverified;

impl SignatureVerifier for Unverified {
    fn verify(&self, _tx: &Transaction) -> bool {
        true
    }
}

/// The chain of blocks plus the pool of transactions waiting to be mined.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    config: LedgerConfig,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            chain: vec![Self::genesis_block()],
            pending: Vec::new(),
            config,
        }
    }

    /// An unmined, transaction-free block pointing at the "0" sentinel.
    pub fn genesis_block() -> Block {
        Block::new(now_rfc3339(), Vec::new(), GENESIS_PREVIOUS_HASH)
    }

    pub fn latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.config.mining_reward
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::from_blocks(&self.chain)
    }

    /// Queue a transaction for the next block. Returns the current tip hash as
    /// an acknowledgment; the tip may have moved on by the time it is mined.
    pub fn add_transaction(&mut self, tx: Transaction) -> String {
        debug!(tx = %tx.calculate_hash(), pending = self.pending.len() + 1, "transaction queued");
        self.pending.push(tx);
        self.latest_block().hash().to_owned()
    }

    /// Mine every pending transaction plus a reward of `mining_reward + fees`
    /// for `miner` into a new block, append it and empty the pool.
    pub fn mine_pending_transactions(&mut self, miner: &str) -> &Block {
        let fees = self
            .pending
            .iter()
            .fold(0u64, |acc, tx| acc.saturating_add(tx.fee()));
        let reward = Transaction::reward(miner, self.config.mining_reward.saturating_add(fees));

        let mut transactions = std::mem::take(&mut self.pending);
        transactions.push(reward);

        let mut block = Block::new(now_rfc3339(), transactions, self.latest_block().hash());
        block.mine(self.config.difficulty);
        info!(
            height = self.chain.len(),
            nonce = block.nonce(),
            hash = %block.hash(),
            txs = block.transactions().len(),
            "mined block"
        );

        self.chain.push(block);
        self.latest_block()
    }

    pub fn is_chain_valid(&self, records: &[BlockRecord]) -> bool {
        self.validate_chain(records).is_ok()
    }

    /// Validate a serialized chain and decode it. See [`Ledger::validate_chain_with`].
    pub fn validate_chain(&self, records: &[BlockRecord]) -> Result<Vec<Block>> {
        self.validate_chain_with(records, &Unverified)
    }

    /// Structural validation of a serialized chain:
    ///
    /// - the first block points at the genesis sentinel;
    /// - every block's stored hash matches its recomputed content hash;
    /// - every later block links to the recomputed hash of its predecessor and
    ///   carries the difficulty prefix;
    /// - every transaction in a later block passes `verifier`.
    ///
    /// Rewards and fees inside the blocks are not checked.
    pub fn validate_chain_with<V>(
        &self,
        records: &[BlockRecord],
        verifier: &V,
    ) -> Result<Vec<Block>>
    where
        V: SignatureVerifier + ?Sized,
    {
        let Some(genesis) = records.first() else {
            return Err(LedgerError::InvalidChain("chain is empty".into()));
        };
        if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(LedgerError::InvalidChain(format!(
                "genesis previous hash is {:?}, expected {GENESIS_PREVIOUS_HASH:?}",
                genesis.previous_hash
            )));
        }

        let blocks = records
            .iter()
            .cloned()
            .map(Block::try_from)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| LedgerError::InvalidChain(format!("undecodable block: {e}")))?;

        if let Some(index) = blocks
            .par_iter()
            .position_first(|b| b.hash() != b.calculate_hash())
        {
            return Err(LedgerError::InvalidChain(format!(
                "block {index} hash does not match its contents"
            )));
        }

        let difficulty = self.config.difficulty;
        let fault = blocks
            .par_windows(2)
            .enumerate()
            .find_map_first(|(prev_index, pair)| {
                let (prev, current) = (&pair[0], &pair[1]);
                let index = prev_index + 1;
                if current.previous_hash() != prev.calculate_hash() {
                    return Some(format!("block {index} does not link to block {prev_index}"));
                }
                if !meets_difficulty(current.hash(), difficulty) {
                    return Some(format!(
                        "block {index} hash lacks {difficulty} leading zeros"
                    ));
                }
                current
                    .transactions()
                    .iter()
                    .find(|tx| !verifier.verify(tx))
                    .map(|tx| {
                        format!(
                            "block {index} holds unverified transaction {}",
                            tx.calculate_hash()
                        )
                    })
            });

        match fault {
            Some(reason) => Err(LedgerError::InvalidChain(reason)),
            None => Ok(blocks),
        }
    }

    /// Swap in a chain that already passed [`Ledger::validate_chain`]. The
    /// pending pool is left alone.
    pub(crate) fn replace_chain(&mut self, blocks: Vec<Block>) {
        debug_assert!(!blocks.is_empty());
        info!(old = self.chain.len(), new = blocks.len(), "replacing local chain");
        self.chain = blocks;
    }

    /// Balance of `address` from replaying the chain: everything received minus
    /// amounts and fees sent. May go negative since spends are never checked.
    pub fn balance_of(&self, address: &str) -> i128 {
        self.chain
            .iter()
            .flat_map(Block::transactions)
            .fold(0i128, |balance, tx| {
                let mut balance = balance;
                if tx.to() == address {
                    balance += i128::from(tx.amount());
                }
                if tx.from() == Some(address) {
                    balance -= i128::from(tx.amount()) + i128::from(tx.fee());
                }
                balance
            })
    }
}
