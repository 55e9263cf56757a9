use crate::constants::BLOCK_HASH_VERSION;
use crate::crypto::{leading_zero_nibbles, sha256};
use crate::transaction::Transaction;
use crate::{now_millis, Hash};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Inclusion order; never reordered.
    pub transactions: Vec<Transaction>,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
    pub nonce: u64,
    pub prev_hash: Option<Hash>,
}

impl Block {
    pub fn new(transactions: Vec<Transaction>, prev_hash: Option<Hash>) -> Self {
        Self {
            transactions,
            timestamp: now_millis(),
            nonce: 0,
            prev_hash,
        }
    }

    /// Canonical v1 encoding: timestamp, nonce, tagged prev-hash, then the
    /// count and hashes of the transactions in inclusion order.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + 8 + 8 + 33 + 8 + 32 * self.transactions.len());
        bytes.push(BLOCK_HASH_VERSION);
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        match &self.prev_hash {
            Some(prev) => {
                bytes.push(1);
                bytes.extend_from_slice(prev);
            }
            None => bytes.push(0),
        }
        bytes.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            bytes.extend_from_slice(&tx.hash());
        }
        bytes
    }

    pub fn hash(&self) -> Hash {
        sha256(&self.hash_bytes())
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    /// True when the first `difficulty` hex characters of the hash are `'0'`.
    pub fn is_valid_hash(&self, difficulty: usize) -> bool {
        leading_zero_nibbles(&self.hash()) >= difficulty
    }

    /// Search nonces upward from zero until the hash meets `difficulty`.
    pub fn mine(&mut self, difficulty: usize) -> Hash {
        self.mine_with(difficulty, |_| {})
    }

    /// Like [`Block::mine`], reporting every candidate hash to `observer`.
    pub fn mine_with<F>(&mut self, difficulty: usize, mut observer: F) -> Hash
    where
        F: FnMut(&Hash),
    {
        self.nonce = 0;
        loop {
            let hash = self.hash();
            observer(&hash);
            if leading_zero_nibbles(&hash) >= difficulty {
                return hash;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Net effect of every transaction in this block on `address`'s balance.
    pub fn balance_delta(&self, address: &str) -> i128 {
        self.transactions
            .iter()
            .map(|tx| tx.balance_delta(address))
            .sum()
    }
}
