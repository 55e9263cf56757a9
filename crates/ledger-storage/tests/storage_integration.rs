mod helpers;

use helpers::{block_after, create_temp_dir, create_temp_store, signed_txs, teardown_store};
use ledger_core::{Block, BlockStore, Ledger, LedgerConfig, Transaction, Wallet};
use ledger_storage::SledStore;
use std::sync::Arc;

#[tokio::test]
async fn test_storage_integration() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let mut blocks: Vec<Block> = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..20 {
        let block = block_after(blocks.last(), signed_txs(3));
        ids.push(store.insert_block(&block)?);
        blocks.push(block);
    }

    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids must increase");
    assert_eq!(store.size()?, 20);
    let loaded = store.get_all_blocks()?;
    assert_eq!(loaded, blocks);
    for (i, block) in loaded.iter().enumerate().skip(1) {
        assert_eq!(block.prev_hash, Some(loaded[i - 1].hash()));
    }
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_persistence() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    let block = block_after(None, signed_txs(2));
    {
        let store = SledStore::open(&db_path)?;
        store.insert_block(&block)?;
    }
    {
        let store = SledStore::open(&db_path)?;
        assert_eq!(store.size()?, 1);
        let loaded = store.get_all_blocks()?;
        assert_eq!(loaded, vec![block.clone()]);
        assert_eq!(loaded[0].hash(), block.hash());
    }
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_empty_database() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    assert_eq!(store.size()?, 0);
    assert!(store.get_all_blocks()?.is_empty());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_genesis_shape() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let genesis_tx = Transaction::new("genesis", &"a".repeat(64), 1_000_000, vec![]);
    let genesis = block_after(None, vec![genesis_tx]);
    store.insert_block(&genesis)?;

    let loaded = store.get_all_blocks()?;
    assert_eq!(loaded[0].prev_hash, None);
    assert_eq!(loaded[0].transactions[0].signature, None);
    assert!(loaded[0].transactions[0].sender_public_key.is_empty());
    assert!(loaded[0].is_valid_hash(1));
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_edge_cases() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let empty = block_after(None, vec![]);
    store.insert_block(&empty)?;

    let large_txs = signed_txs(1_000);
    let large = block_after(Some(&empty), large_txs.clone());
    store.insert_block(&large)?;

    let loaded = store.get_all_blocks()?;
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].transactions.is_empty());
    assert_eq!(loaded[1].transactions, large_txs);
    assert_eq!(loaded[1].hash(), large.hash());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_data_integrity() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    let id = {
        let store = SledStore::open(&db_path)?;
        let id = store.insert_block(&block_after(None, signed_txs(1)))?;
        store.close()?;
        id
    };

    // Overwrite the block row with bytes that are not a valid record.
    {
        let raw = sled::open(&db_path)?;
        let blocks = raw.open_tree("blocks")?;
        let previous = blocks.insert(&id.to_be_bytes()[..], vec![0xFFu8; 3])?;
        assert!(previous.is_some(), "Expected to overwrite the stored block");
        raw.flush()?;
    }

    let store = SledStore::open(&db_path)?;
    let err = store.get_all_blocks().expect_err("corrupt record must surface as an error");
    assert!(err.to_string().contains("corrupt block record"));
    drop(store);
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_concurrency() -> anyhow::Result<()> {
    use tokio::task;

    let (temp_dir, store) = create_temp_store();
    let store = Arc::new(store);
    let mut handles = Vec::new();
    for _ in 0..20 {
        let store_clone = Arc::clone(&store);
        handles.push(task::spawn(async move {
            store_clone.insert_block(&block_after(None, signed_txs(2)))
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20, "every insert gets its own id");
    assert_eq!(store.size()?, 20);
    assert!(store
        .get_all_blocks()?
        .iter()
        .all(|b| b.transactions.len() == 2));
    drop(store);
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_repeated_open_close() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    for round in 1..=5u64 {
        {
            let store = SledStore::open(&db_path)?;
            store.insert_block(&block_after(None, signed_txs(1)))?;
        }
        {
            let store = SledStore::open(&db_path)?;
            assert_eq!(store.size()?, round);
        }
    }
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_clear() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    store.insert_block(&block_after(None, signed_txs(4)))?;
    store.clear()?;
    assert_eq!(store.size()?, 0);
    assert!(store.get_all_blocks()?.is_empty());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_ledger_rehydrates_from_sled() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    let main = Wallet::generate();
    let wallets: Vec<Wallet> = (0..3).map(|_| Wallet::generate()).collect();
    let config = LedgerConfig::new(2, 5, 2);

    let (balances, tip) = {
        let store = Arc::new(SledStore::open(&db_path)?);
        let mut ledger = Ledger::open(store, main.address(), config)?;
        for (i, w) in wallets.iter().enumerate() {
            ledger.add_transaction(main.create_tx(w.address(), 100 * (i as u64 + 1)))?;
        }
        ledger.flush()?;
        ledger.add_transaction(wallets[2].create_tx(wallets[1].address(), 50))?;
        ledger.flush()?;
        assert_eq!(ledger.len(), 4);

        let balances: Vec<i128> = std::iter::once(main.address())
            .chain(wallets.iter().map(Wallet::address))
            .map(|a| ledger.find_balance(a))
            .collect();
        (balances, ledger.tip_hash())
    };
    assert_eq!(balances, vec![1_000_000 - 600, 100, 250, 250]);

    let store = Arc::new(SledStore::open(&db_path)?);
    let ledger = Ledger::open(store.clone(), main.address(), config)?;
    assert_eq!(ledger.len(), 4);
    assert_eq!(store.size()?, 4);
    assert_eq!(ledger.tip_hash(), tip);
    assert!(ledger.verify());
    assert!(ledger.verify_work());
    let after: Vec<i128> = std::iter::once(main.address())
        .chain(wallets.iter().map(Wallet::address))
        .map(|a| ledger.find_balance(a))
        .collect();
    assert_eq!(after, balances);
    assert_eq!(ledger.find_balance("genesis"), -1_000_000);

    drop(ledger);
    drop(store);
    temp_dir.close()?;
    Ok(())
}
