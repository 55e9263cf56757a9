use crate::block::Block;
use crate::config::LedgerConfig;
use crate::constants::{GENESIS_ADDRESS, GENESIS_ALLOTMENT};
use crate::crypto::{validate_address, verify_signature};
use crate::error::{LedgerError, Result};
use crate::store::BlockStore;
use crate::transaction::Transaction;
use crate::Hash;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

type MiningObserver = Box<dyn FnMut(&Hash) + Send>;

/// Outcome of a successful [`Ledger::add_transaction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The transaction now sits at the back of the pending queue.
    Queued,
    /// The queue was full: pending transactions were mined into
    /// `blocks_committed` blocks and the submitted transaction was discarded.
    Dropped { blocks_committed: usize },
}

/// Committed blocks plus the pending queue, persisted through a `BlockStore`.
///
/// Single writer: callers must serialize `add_transaction` and `flush`, and
/// must not read while either is running.
pub struct Ledger<S: BlockStore> {
    store: Arc<S>,
    config: LedgerConfig,
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    observer: Option<MiningObserver>,
}

impl<S: BlockStore> Ledger<S> {
    /// Rehydrate from `store`, or mine a genesis block crediting
    /// `main_address` when the store is empty.
    pub fn open(store: Arc<S>, main_address: &str, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        validate_address(main_address)?;

        let blocks = store.get_all_blocks()?;
        let mut ledger = Self {
            store,
            config,
            blocks,
            pending: Vec::new(),
            observer: None,
        };

        if ledger.blocks.is_empty() {
            let genesis = Transaction::new(GENESIS_ADDRESS, main_address, GENESIS_ALLOTMENT, vec![]);
            ledger.add_transaction(genesis)?;
            ledger.flush()?;
            info!(address = main_address, "genesis block committed");
        } else {
            info!(blocks = ledger.blocks.len(), "ledger rehydrated from store");
        }
        Ok(ledger)
    }

    pub fn set_mining_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&Hash) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_mining_observer(&mut self) {
        self.observer = None;
    }

    /// Validate and admit a transaction.
    ///
    /// Signature, balance and sender checks only apply once the chain holds a
    /// block, which is what lets the genesis transfer through. When the queue
    /// is already at `max_pending_before_flush` the pending transactions are
    /// mined and `tx` is not enqueued (see [`Admission::Dropped`]).
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<Admission> {
        validate_address(&tx.to)?;
        if !self.blocks.is_empty() {
            validate_address(&tx.from)?;
            self.check_signature(&tx)?;
            let balance = self.find_balance(&tx.from);
            if balance < i128::from(tx.amount) {
                return Err(LedgerError::InsufficientBalance {
                    address: tx.from,
                    balance,
                    required: tx.amount,
                });
            }
        }

        if self.pending.len() >= self.config.max_pending_before_flush {
            let blocks_committed = self.flush()?;
            warn!(
                tx = %hex::encode(tx.hash()),
                blocks_committed,
                "pending queue full; mined pending transactions and dropped the submitted one"
            );
            return Ok(Admission::Dropped { blocks_committed });
        }

        debug!(tx = %hex::encode(tx.hash()), amount = tx.amount, "transaction queued");
        self.pending.push(tx);
        Ok(Admission::Queued)
    }

    fn check_signature(&self, tx: &Transaction) -> Result<()> {
        let hash = tx.hash();
        let verified = tx
            .signature
            .as_deref()
            .is_some_and(|sig| verify_signature(&tx.sender_public_key, &hash, sig));
        if verified {
            Ok(())
        } else {
            Err(LedgerError::InvalidSignature(hex::encode(hash)))
        }
    }

    /// Mine the whole pending queue into blocks of at most
    /// `max_transactions_per_block`, in submission order. Returns the number
    /// of blocks committed.
    pub fn flush(&mut self) -> Result<usize> {
        let mut committed = 0;
        while !self.pending.is_empty() {
            self.commit_next_batch()?;
            committed += 1;
        }
        Ok(committed)
    }

    // The batch leaves the queue only after the block is persisted.
    fn commit_next_batch(&mut self) -> Result<()> {
        let take = self.config.max_transactions_per_block.min(self.pending.len());
        let difficulty = self.config.difficulty;
        let mut block = Block::new(self.pending[..take].to_vec(), self.tip_hash());

        let hash = match self.observer.as_mut() {
            Some(observer) => block.mine_with(difficulty, |h| observer(h)),
            None => block.mine(difficulty),
        };
        if !block.is_valid_hash(difficulty) {
            return Err(LedgerError::BlockInvalid {
                hash: hex::encode(hash),
                difficulty,
            });
        }

        let id = self.store.insert_block(&block)?;
        self.pending.drain(..take);
        info!(
            height = self.blocks.len(),
            store_id = id,
            nonce = block.nonce,
            txs = take,
            hash = %hex::encode(hash),
            "block mined"
        );
        self.blocks.push(block);
        Ok(())
    }

    /// Replay every committed transaction touching `address`.
    pub fn find_balance(&self, address: &str) -> i128 {
        self.blocks
            .par_iter()
            .map(|block| block.balance_delta(address))
            .sum()
    }

    /// Hash linkage only: each block's `prev_hash` must equal the recomputed
    /// hash of its predecessor. Proof-of-work is not re-checked here.
    pub fn verify(&self) -> bool {
        for i in (1..self.blocks.len()).rev() {
            let expected = self.blocks[i - 1].hash();
            if self.blocks[i].prev_hash != Some(expected) {
                return false;
            }
        }
        true
    }

    /// Every committed block meets the ledger's current difficulty.
    pub fn verify_work(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| block.is_valid_hash(self.config.difficulty))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn tip_hash(&self) -> Option<Hash> {
        self.blocks.last().map(Block::hash)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
