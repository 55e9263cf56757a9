//! Wallet file: a JSON array of hex-encoded ed25519 secret keys.

use anyhow::{bail, Context, Result};
use ledger_core::{BlockStore, Wallet};
use ledger_storage::SledStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Serialize, Deserialize)]
struct WalletRecord {
    secret_key: String,
}

pub fn generate(count: usize) -> Vec<Wallet> {
    (0..count).map(|_| Wallet::generate()).collect()
}

pub fn save(path: &Path, wallets: &[Wallet]) -> Result<()> {
    let records: Vec<WalletRecord> = wallets
        .iter()
        .map(|w| WalletRecord {
            secret_key: hex::encode(w.secret_bytes()),
        })
        .collect();
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(count = wallets.len(), path = %path.display(), "wallets saved");
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<Wallet>> {
    let json = fs::read_to_string(path).with_context(|| {
        format!(
            "reading {} (create it with `ledger-cli wallets generate`)",
            path.display()
        )
    })?;
    let records: Vec<WalletRecord> =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    if records.is_empty() {
        bail!("{} holds no wallets", path.display());
    }
    records
        .iter()
        .enumerate()
        .map(|(i, r)| -> Result<Wallet> {
            let secret = hex::decode(&r.secret_key).with_context(|| format!("wallet {i}"))?;
            Ok(Wallet::from_secret_bytes(&secret).with_context(|| format!("wallet {i}"))?)
        })
        .collect()
}

/// Replay the committed blocks under `data_dir` for each wallet, without
/// mining a genesis block. A missing data directory means an empty chain.
pub fn committed_balances(data_dir: &Path, wallets: &[Wallet]) -> Result<Vec<i128>> {
    if !data_dir.exists() {
        return Ok(vec![0; wallets.len()]);
    }
    let store = SledStore::open(data_dir)?;
    let blocks = store.get_all_blocks()?;
    store.close()?;
    Ok(wallets
        .iter()
        .map(|w| blocks.iter().map(|b| b.balance_delta(w.address())).sum::<i128>())
        .collect())
}
