use crate::block::Block;
use anyhow::{anyhow, Result};
use std::sync::RwLock;

/// Durable append-only log of committed blocks, consulted by a `Ledger` at
/// startup and after every commit.
/// This lives in `ledger-core` to avoid a circular dependency.
pub trait BlockStore: Send + Sync {
    /// Append one committed block with its transactions, returning the
    /// store-local sequence id. Ids strictly increase across calls.
    fn insert_block(&self, block: &Block) -> Result<u64>;
    /// Every persisted block, in commit order.
    fn get_all_blocks(&self) -> Result<Vec<Block>>;
    fn size(&self) -> Result<u64>;
}

/// Process-local store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: RwLock<Vec<Block>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MemoryStore {
    fn insert_block(&self, block: &Block) -> Result<u64> {
        let mut blocks = self
            .blocks
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        blocks.push(block.clone());
        Ok(blocks.len() as u64)
    }

    fn get_all_blocks(&self) -> Result<Vec<Block>> {
        let blocks = self
            .blocks
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(blocks.clone())
    }

    fn size(&self) -> Result<u64> {
        let blocks = self
            .blocks
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(blocks.len() as u64)
    }
}
