use anyhow::{anyhow, Context, Result};
use ledger_core::{Block, BlockStore, Hash, Transaction};
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionResult;
use sled::{Db, Transactional, Tree};
use std::path::Path;
use tracing::{debug, info};

const TREE_BLOCKS: &str = "blocks";
const TREE_TRANSACTIONS: &str = "transactions";

/// Block row: `{timestamp, nonce, prev_hash}` keyed by the store id.
#[derive(Serialize, Deserialize)]
struct BlockRecord {
    timestamp: u64,
    nonce: u64,
    prev_hash: Option<Hash>,
}

/// Transaction row keyed by `block_id ++ tx_index`.
#[derive(Serialize, Deserialize)]
struct TransactionRecord {
    from: String,
    to: String,
    amount: u64,
    timestamp: u64,
    sender_public_key: Vec<u8>,
    signature: Option<Vec<u8>>,
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        Self {
            from: tx.from.clone(),
            to: tx.to.clone(),
            amount: tx.amount,
            timestamp: tx.timestamp,
            sender_public_key: tx.sender_public_key.clone(),
            signature: tx.signature.clone(),
        }
    }
}

impl From<TransactionRecord> for Transaction {
    fn from(r: TransactionRecord) -> Self {
        Self {
            from: r.from,
            to: r.to,
            amount: r.amount,
            sender_public_key: r.sender_public_key,
            signature: r.signature,
            timestamp: r.timestamp,
        }
    }
}

fn tx_key(block_id: u64, index: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&block_id.to_be_bytes());
    key[8..].copy_from_slice(&index.to_be_bytes());
    key
}

fn block_id(key: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = key
        .try_into()
        .map_err(|_| anyhow!("block key has {} bytes, expected 8", key.len()))?;
    Ok(u64::from_be_bytes(arr))
}

#[derive(Clone)]
pub struct SledStore {
    db: Db,
    blocks: Tree,
    transactions: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).with_context(|| format!("opening sled at {}", path.display()))?;
        let blocks = db.open_tree(TREE_BLOCKS)?;
        let transactions = db.open_tree(TREE_TRANSACTIONS)?;
        info!(path = %path.display(), blocks = blocks.len(), "sled store opened");
        Ok(Self {
            db,
            blocks,
            transactions,
        })
    }

    /// Write any buffered data to disk.
    pub fn close(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.blocks.clear()?;
        self.transactions.clear()?;
        self.db.flush()?;
        Ok(())
    }

    fn load_transactions(&self, id: u64) -> Result<Vec<Transaction>> {
        self.transactions
            .scan_prefix(id.to_be_bytes())
            .map(|entry| -> Result<Transaction> {
                let (_, bytes) = entry?;
                let record: TransactionRecord = bincode::deserialize(&bytes)
                    .with_context(|| format!("corrupt transaction record in block {id}"))?;
                Ok(record.into())
            })
            .collect()
    }
}

impl BlockStore for SledStore {
    fn insert_block(&self, block: &Block) -> Result<u64> {
        let id = self.db.generate_id()?;
        let header = bincode::serialize(&BlockRecord {
            timestamp: block.timestamp,
            nonce: block.nonce,
            prev_hash: block.prev_hash,
        })?;
        let rows = block
            .transactions
            .iter()
            .enumerate()
            .map(|(i, tx)| -> Result<([u8; 16], Vec<u8>)> {
                let bytes = bincode::serialize(&TransactionRecord::from(tx))?;
                Ok((tx_key(id, i as u64), bytes))
            })
            .collect::<Result<Vec<_>>>()?;

        (&self.blocks, &self.transactions)
            .transaction(|(blocks, transactions)| -> ConflictableTransactionResult<(), sled::Error> {
                for (key, bytes) in &rows {
                    transactions.insert(&key[..], bytes.as_slice())?;
                }
                blocks.insert(&id.to_be_bytes()[..], header.as_slice())?;
                Ok(())
            })
            .map_err(|e| anyhow!("writing block {id}: {e}"))?;

        self.db.flush()?;
        debug!(id, txs = rows.len(), "block persisted");
        Ok(id)
    }

    fn get_all_blocks(&self) -> Result<Vec<Block>> {
        self.blocks
            .iter()
            .map(|entry| -> Result<Block> {
                let (key, bytes) = entry?;
                let id = block_id(&key)?;
                let record: BlockRecord = bincode::deserialize(&bytes)
                    .with_context(|| format!("corrupt block record {id}"))?;
                Ok(Block {
                    transactions: self.load_transactions(id)?,
                    timestamp: record.timestamp,
                    nonce: record.nonce,
                    prev_hash: record.prev_hash,
                })
            })
            .collect()
    }

    fn size(&self) -> Result<u64> {
        Ok(self.blocks.len() as u64)
    }
}
