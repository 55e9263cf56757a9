mod api;
mod constants;
mod error;

use clap::Parser;
use ledger_core::{
    constants::{
        DEFAULT_DIFFICULTY, DEFAULT_MAX_PENDING_BEFORE_FLUSH, DEFAULT_MAX_TRANSACTIONS_PER_BLOCK,
    },
    Ledger, LedgerConfig,
};
use ledger_storage::SledStore;
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Data directory for sled
    #[arg(long, default_value = "./data")]
    data_dir: String,

    /// Address credited with the genesis allotment when the store is empty
    #[arg(long)]
    main_address: String,

    /// Leading zero hex characters required of a block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: usize,

    /// Pending queue length at which a submission triggers mining
    #[arg(long, default_value_t = DEFAULT_MAX_PENDING_BEFORE_FLUSH)]
    max_pending: usize,

    /// Most transactions mined into one block
    #[arg(long, default_value_t = DEFAULT_MAX_TRANSACTIONS_PER_BLOCK)]
    max_per_block: usize,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = LedgerConfig::new(args.difficulty, args.max_pending, args.max_per_block);
    let store = Arc::new(SledStore::open(&args.data_dir)?);
    // Genesis mining blocks; run it off the async workers.
    let ledger = {
        let store = store.clone();
        let main_address = args.main_address.clone();
        tokio::task::spawn_blocking(move || Ledger::open(store, &main_address, config)).await??
    };
    info!(blocks = ledger.len(), verified = ledger.verify(), "ledger ready");

    let app = api::router(api::AppState::new(ledger));

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    store.close()?;
    Ok(())
}
