pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const ADDRESS_HEX_SIZE: usize = HASH_HEX_SIZE;

pub const GENESIS_ADDRESS: &str = "genesis";
pub const GENESIS_ALLOTMENT: u64 = 1_000_000;

pub const DEFAULT_DIFFICULTY: usize = 4;
pub const DEFAULT_MAX_PENDING_BEFORE_FLUSH: usize = 10;
pub const DEFAULT_MAX_TRANSACTIONS_PER_BLOCK: usize = 10;

/// Shared between signer and verifier; both sides must agree exactly.
pub const SIGNATURE_SCHEME: &str = "ed25519";

pub(crate) const TX_HASH_VERSION: u8 = 1;
pub(crate) const BLOCK_HASH_VERSION: u8 = 1;
