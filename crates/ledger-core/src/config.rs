use crate::constants::{
    DEFAULT_DIFFICULTY, DEFAULT_MAX_PENDING_BEFORE_FLUSH, DEFAULT_MAX_TRANSACTIONS_PER_BLOCK,
    HASH_HEX_SIZE,
};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Per-ledger tuning. Each `Ledger` owns its copy; nothing here is process-wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Number of leading `'0'` hex characters a block hash must carry.
    pub difficulty: usize,
    /// Queue length at which a submission triggers mining instead of enqueueing.
    pub max_pending_before_flush: usize,
    pub max_transactions_per_block: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_pending_before_flush: DEFAULT_MAX_PENDING_BEFORE_FLUSH,
            max_transactions_per_block: DEFAULT_MAX_TRANSACTIONS_PER_BLOCK,
        }
    }
}

impl LedgerConfig {
    pub fn new(
        difficulty: usize,
        max_pending_before_flush: usize,
        max_transactions_per_block: usize,
    ) -> Self {
        Self {
            difficulty,
            max_pending_before_flush,
            max_transactions_per_block,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty < 1 {
            return Err(LedgerError::InvalidConfiguration(
                "difficulty must be at least 1".into(),
            ));
        }
        // A 32-byte digest only has 64 hex characters to be zero.
        if self.difficulty > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidConfiguration(format!(
                "difficulty {} exceeds the {HASH_HEX_SIZE} hex characters of a block hash",
                self.difficulty
            )));
        }
        if self.max_pending_before_flush < 1 {
            return Err(LedgerError::InvalidConfiguration(
                "max_pending_before_flush must be at least 1".into(),
            ));
        }
        if self.max_transactions_per_block < 1 {
            return Err(LedgerError::InvalidConfiguration(
                "max_transactions_per_block must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(LedgerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        for cfg in [
            LedgerConfig::new(0, 5, 2),
            LedgerConfig::new(2, 0, 2),
            LedgerConfig::new(2, 5, 0),
        ] {
            assert!(matches!(
                cfg.validate(),
                Err(LedgerError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn unreachable_difficulty_is_rejected() {
        assert!(LedgerConfig::new(64, 1, 1).validate().is_ok());
        assert!(matches!(
            LedgerConfig::new(65, 1, 1).validate(),
            Err(LedgerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn config_deserializes_from_json() {
        let json = r#"{"difficulty":3,"max_pending_before_flush":5,"max_transactions_per_block":2}"#;
        let cfg: LedgerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg, LedgerConfig::new(3, 5, 2));
    }
}
