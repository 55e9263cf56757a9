//! Digest, signature and address primitives shared by the ledger and its wallets.

use crate::constants::ADDRESS_HEX_SIZE;
use crate::error::{LedgerError, Result};
use crate::Hash;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

pub fn sha256(bytes: &[u8]) -> Hash {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Verify `signature` over `message` with an ed25519 public key.
///
/// Malformed key or signature bytes verify as `false`.
pub fn verify_signature(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

/// Hex-encoded SHA-256 of the public key bytes.
pub fn address_from_public_key(public_key: &[u8]) -> String {
    hex::encode(sha256(public_key))
}

pub fn validate_address(address: &str) -> Result<()> {
    let well_formed = address.len() == ADDRESS_HEX_SIZE
        && address
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        Ok(())
    } else {
        Err(LedgerError::InvalidAddress(address.to_string()))
    }
}

/// Number of leading zero hex characters in the digest's hex rendering.
pub fn leading_zero_nibbles(hash: &Hash) -> usize {
    let mut total = 0;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}
