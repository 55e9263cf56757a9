use crate::constants::TX_HASH_VERSION;
use crate::crypto::sha256;
use crate::{now_millis, Hash};
use serde::{Deserialize, Serialize};

/// A signed transfer intent. Immutable once submitted to a ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub sender_public_key: Vec<u8>,
    /// Absent only on the synthetic genesis transfer.
    pub signature: Option<Vec<u8>>,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.amount == other.amount
            && self.from == other.from
            && self.to == other.to
            && self.sender_public_key == other.sender_public_key
            && self.signature == other.signature
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// Unsigned transfer stamped with the current time.
    pub fn new(from: &str, to: &str, amount: u64, sender_public_key: Vec<u8>) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            sender_public_key,
            signature: None,
            timestamp: now_millis(),
        }
    }

    /// Canonical v1 encoding: every field except the signature, length-prefixed
    /// where variable, integers little-endian.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            1 + 8 * 5 + self.from.len() + self.to.len() + self.sender_public_key.len(),
        );
        bytes.push(TX_HASH_VERSION);
        put_bytes(&mut bytes, self.from.as_bytes());
        put_bytes(&mut bytes, self.to.as_bytes());
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        put_bytes(&mut bytes, &self.sender_public_key);
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes
    }

    pub fn hash(&self) -> Hash {
        sha256(&self.hash_bytes())
    }

    /// Net effect of this transfer on `address`'s balance.
    pub fn balance_delta(&self, address: &str) -> i128 {
        let mut delta = 0i128;
        if self.to == address {
            delta += i128::from(self.amount);
        }
        if self.from == address {
            delta -= i128::from(self.amount);
        }
        delta
    }
}

fn put_bytes(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(&(field.len() as u64).to_le_bytes());
    buf.extend_from_slice(field);
}
