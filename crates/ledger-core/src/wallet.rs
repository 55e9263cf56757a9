//! Ed25519 key holder that signs transactions on behalf of one address.

use crate::crypto::address_from_public_key;
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

#[derive(Clone, Debug)]
pub struct Wallet {
    signing_key: SigningKey,
    address: String,
}

impl Wallet {
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret: [u8; 32] = bytes.try_into().map_err(|_| {
            LedgerError::InvalidKey(format!(
                "wallet secret key must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&secret)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_from_public_key(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            address,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Build a transfer from this wallet, stamped now and signed over its hash.
    pub fn create_tx(&self, to: &str, amount: u64) -> Transaction {
        let mut tx = Transaction::new(&self.address, to, amount, self.public_key());
        let signature = self.sign(&tx.hash());
        tx.signature = Some(signature);
        tx
    }
}
