#![allow(dead_code)]

use std::fs;

use ledger_core::{Block, Transaction, Wallet};
use ledger_storage::SledStore;
use tempfile::{tempdir, TempDir};

pub fn create_temp_dir() -> (TempDir, std::path::PathBuf) {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().to_path_buf();
    (temp_dir, db_path)
}

pub fn create_temp_store() -> (TempDir, SledStore) {
    let (temp_dir, db_path) = create_temp_dir();
    (
        temp_dir,
        SledStore::open(&db_path).expect("Failed to open SledStore"),
    )
}

pub fn teardown_store(temp_dir: TempDir, store: SledStore) {
    let db_path = temp_dir.path().to_path_buf();
    store.clear().expect("Failed to clear the store");
    drop(store);
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&db_path);
    assert!(!db_path.exists(), "Database directory should be removed");
}

/// `count` signed transfers from one fresh wallet to another.
pub fn signed_txs(count: u64) -> Vec<Transaction> {
    let from = Wallet::generate();
    let to = Wallet::generate();
    (0..count).map(|i| from.create_tx(to.address(), i + 1)).collect()
}

pub fn block_after(prev: Option<&Block>, txs: Vec<Transaction>) -> Block {
    let mut block = Block::new(txs, prev.map(Block::hash));
    block.mine(1);
    block
}
