mod repl;
mod wallets;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use ledger_core::{
    constants::{
        DEFAULT_DIFFICULTY, DEFAULT_MAX_PENDING_BEFORE_FLUSH, DEFAULT_MAX_TRANSACTIONS_PER_BLOCK,
    },
    Hash, Ledger, LedgerConfig,
};
use ledger_storage::SledStore;
use repl::{Outcome, Repl};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

/// Candidate hashes between two progress redraws while mining.
const PROGRESS_EVERY: u64 = 4096;

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Wallets, interactive prompt and submission client for the proof-of-work ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the wallet file
    Wallets {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Interactive prompt over a local ledger
    Repl {
        /// Data directory for sled
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
        /// Wallet file; the first wallet receives the genesis allotment
        #[arg(long, default_value = "wallets.json")]
        wallets: PathBuf,
        #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: usize,
        #[arg(long, default_value_t = DEFAULT_MAX_PENDING_BEFORE_FLUSH)]
        max_pending: usize,
        #[arg(long, default_value_t = DEFAULT_MAX_TRANSACTIONS_PER_BLOCK)]
        max_per_block: usize,
    },
    /// Sign a transfer locally and submit it to a running node
    Submit {
        /// Node base URL (e.g. http://127.0.0.1:8080)
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
        #[arg(long, default_value = "wallets.json")]
        wallets: PathBuf,
        /// Index of the sending wallet
        #[arg(long, default_value_t = 0)]
        from: usize,
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
}

#[derive(Subcommand, Debug)]
enum WalletAction {
    /// Create a new wallet file
    Generate {
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[arg(long, default_value = "wallets.json")]
        file: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print each wallet's address and committed balance
    List {
        #[arg(long, default_value = "wallets.json")]
        file: PathBuf,
        /// Data directory for sled
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[derive(Serialize)]
struct Tx {
    from: String,
    to: String,
    amount: u64,
    timestamp: u64,
    sender_public_key: String,
    signature: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .pretty()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Wallets { action } => match action {
            WalletAction::Generate { count, file, force } => {
                if file.exists() && !force {
                    bail!("{} already exists; pass --force to replace it", file.display());
                }
                let generated = wallets::generate(count);
                for (i, w) in generated.iter().enumerate() {
                    println!("Generated wallet ({i}): {}", w.address());
                }
                wallets::save(&file, &generated)?;
                println!("Generated {count} wallets");
            }
            WalletAction::List { file, data_dir } => {
                let loaded = wallets::load(&file)?;
                let balances = wallets::committed_balances(&data_dir, &loaded)?;
                for (i, (w, balance)) in loaded.iter().zip(balances).enumerate() {
                    println!("{i}. {} {balance}", w.address());
                }
            }
        },
        Command::Repl {
            data_dir,
            wallets,
            difficulty,
            max_pending,
            max_per_block,
        } => {
            let config = LedgerConfig::new(difficulty, max_pending, max_per_block);
            run_repl(data_dir, wallets, config).await?;
        }
        Command::Submit {
            node,
            wallets,
            from,
            to,
            amount,
        } => {
            let loaded = wallets::load(&wallets)?;
            let wallet = loaded
                .get(from)
                .ok_or_else(|| anyhow!("no wallet at index {from}"))?;
            let tx = wallet.create_tx(&to, amount);
            let body = Tx {
                sender_public_key: hex::encode(&tx.sender_public_key),
                signature: hex::encode(tx.signature.as_deref().unwrap_or_default()),
                from: tx.from,
                to: tx.to,
                amount: tx.amount,
                timestamp: tx.timestamp,
            };
            let client = reqwest::Client::new();
            let res = client.post(format!("{node}/tx")).json(&body).send().await?;
            let status = res.status();
            let body = res.text().await?;
            println!("status: {}", status);
            println!("{body}");
        }
    }
    Ok(())
}

fn progress_printer() -> impl FnMut(&Hash) + Send + 'static {
    let mut tried: u64 = 0;
    move |hash| {
        tried += 1;
        if tried % PROGRESS_EVERY == 0 {
            eprint!("\rmining: {tried} hashes, last {}", hex::encode(hash));
        }
    }
}

async fn run_repl(data_dir: PathBuf, wallet_file: PathBuf, config: LedgerConfig) -> Result<()> {
    let loaded = wallets::load(&wallet_file)?;
    let count = loaded.len();
    let store = Arc::new(SledStore::open(&data_dir)?);
    // Mining blocks the thread; let the runtime know.
    let ledger = tokio::task::block_in_place(|| {
        Ledger::open(store.clone(), loaded[0].address(), config)
    })?;
    let mut repl = Repl::new(ledger, loaded)?;
    repl.ledger_mut().set_mining_observer(progress_printer());

    println!("loaded {count} wallet(s)");
    println!("Use help command to show available commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("-> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match tokio::task::block_in_place(|| repl.execute(&line)) {
            Ok(Outcome::Output(out)) if out.is_empty() => {}
            Ok(Outcome::Output(out)) => println!("{out}"),
            Ok(Outcome::Exit) => break,
            Err(e) => println!("Error: {e:#}"),
        }
    }
    store.close()?;
    Ok(())
}
