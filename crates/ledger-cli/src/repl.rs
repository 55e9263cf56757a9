//! Line-oriented command interface over a local ledger.

use anyhow::{anyhow, bail, Context, Result};
use ledger_core::{crypto::validate_address, Admission, Block, BlockStore, Ledger, Wallet};
use std::fmt::Write as _;

struct CommandSpec {
    name: &'static str,
    aliases: &'static [&'static str],
    usage: &'static str,
    description: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "transfer",
        aliases: &["tf"],
        usage: "<amount> <address|wallet-index>",
        description: "transfer coin from the current wallet",
    },
    CommandSpec {
        name: "length",
        aliases: &["len"],
        usage: "",
        description: "blockchain length",
    },
    CommandSpec {
        name: "wallets",
        aliases: &["ls"],
        usage: "",
        description: "list of loaded wallets",
    },
    CommandSpec {
        name: "balance",
        aliases: &["bal"],
        usage: "[address]",
        description: "show balance of a wallet",
    },
    CommandSpec {
        name: "blocks",
        aliases: &[],
        usage: "",
        description: "show all blocks",
    },
    CommandSpec {
        name: "block",
        aliases: &[],
        usage: "<index> [hash|nonce|timestamp|prev|txs]",
        description: "show a block",
    },
    CommandSpec {
        name: "pending",
        aliases: &[],
        usage: "",
        description: "show pending transactions",
    },
    CommandSpec {
        name: "flush",
        aliases: &[],
        usage: "",
        description: "force mine pending transactions",
    },
    CommandSpec {
        name: "verify",
        aliases: &[],
        usage: "",
        description: "verify blockchain",
    },
    CommandSpec {
        name: "help",
        aliases: &["h"],
        usage: "",
        description: "show help",
    },
    CommandSpec {
        name: "exit",
        aliases: &["quit"],
        usage: "",
        description: "leave the prompt",
    },
];

fn resolve(word: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|c| c.name == word || c.aliases.iter().any(|a| *a == word))
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Exit,
}

pub struct Repl<S: BlockStore> {
    ledger: Ledger<S>,
    wallets: Vec<Wallet>,
    current: usize,
}

impl<S: BlockStore> Repl<S> {
    /// The first wallet is the sending wallet.
    pub fn new(ledger: Ledger<S>, wallets: Vec<Wallet>) -> Result<Self> {
        if wallets.is_empty() {
            bail!("at least one wallet is required");
        }
        Ok(Self {
            ledger,
            wallets,
            current: 0,
        })
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger<S> {
        &mut self.ledger
    }

    pub fn execute(&mut self, line: &str) -> Result<Outcome> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Outcome::Output(String::new()));
        };
        let args: Vec<&str> = words.collect();
        let command = resolve(word).ok_or_else(|| anyhow!("cannot find command {word:?}"))?;

        let output = match command.name {
            "transfer" => self.transfer(&args)?,
            "length" => self.ledger.len().to_string(),
            "wallets" => self.list_wallets(),
            "balance" => self.balance(&args)?,
            "blocks" => self.blocks(),
            "block" => self.block(&args)?,
            "pending" => self.pending(),
            "flush" => {
                let mined = self.ledger.flush()?;
                format!("{mined} block(s) successfully mined")
            }
            "verify" => self.ledger.verify().to_string(),
            "help" => help(),
            "exit" => return Ok(Outcome::Exit),
            other => bail!("command {other:?} is not wired up"),
        };
        Ok(Outcome::Output(output))
    }

    fn current_wallet(&self) -> &Wallet {
        &self.wallets[self.current]
    }

    fn transfer(&mut self, args: &[&str]) -> Result<String> {
        let (Some(amount), Some(target)) = (args.first(), args.get(1)) else {
            bail!("usage: transfer <amount> <address|wallet-index>");
        };
        let amount: u64 = amount
            .parse()
            .with_context(|| format!("invalid amount {amount:?}"))?;
        let address = self.target_address(target)?;

        let tx = self.current_wallet().create_tx(&address, amount);
        match self.ledger.add_transaction(tx)? {
            Admission::Queued => Ok(format!("{amount} tokens will be transferred to {address}")),
            Admission::Dropped { blocks_committed } => Ok(format!(
                "pending queue was full: mined {blocks_committed} block(s); \
                 this transfer was not queued, submit it again"
            )),
        }
    }

    fn target_address(&self, target: &str) -> Result<String> {
        if validate_address(target).is_ok() {
            return Ok(target.to_string());
        }
        let index: usize = target
            .parse()
            .map_err(|_| anyhow!("{target:?} is neither an address nor a wallet index"))?;
        self.wallets
            .get(index)
            .map(|w| w.address().to_string())
            .ok_or_else(|| anyhow!("no wallet at index {index}"))
    }

    fn list_wallets(&self) -> String {
        let mut out = String::new();
        for (i, w) in self.wallets.iter().enumerate() {
            let marker = if i == self.current { "*" } else { " " };
            let _ = writeln!(
                out,
                "{marker}{i}. {} {}",
                w.address(),
                self.ledger.find_balance(w.address())
            );
        }
        out.trim_end().to_string()
    }

    fn balance(&self, args: &[&str]) -> Result<String> {
        let address = match args.first() {
            Some(address) => {
                validate_address(address)?;
                *address
            }
            None => self.current_wallet().address(),
        };
        Ok(self.ledger.find_balance(address).to_string())
    }

    fn blocks(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.ledger.blocks().iter().enumerate() {
            let _ = writeln!(
                out,
                "{i}. {} txs={} nonce={}",
                block.hash_hex(),
                block.transactions.len(),
                block.nonce
            );
        }
        out.trim_end().to_string()
    }

    fn block(&self, args: &[&str]) -> Result<String> {
        let index = args
            .first()
            .ok_or_else(|| anyhow!("please specify block index"))?;
        let index: usize = index
            .parse()
            .with_context(|| format!("invalid block index {index:?}"))?;
        let block = self
            .ledger
            .block(index)
            .ok_or_else(|| anyhow!("no block found at index {index}"))?;

        let out = match args.get(1).copied() {
            None => describe_block(index, block),
            Some("hash") => block.hash_hex(),
            Some("nonce") => block.nonce.to_string(),
            Some("timestamp") => block.timestamp.to_string(),
            Some("prev") => block.prev_hash.map(hex::encode).unwrap_or_else(|| "-".into()),
            Some("txs") => block.transactions.len().to_string(),
            Some(field) => bail!("unknown block field {field:?}"),
        };
        Ok(out)
    }

    fn pending(&self) -> String {
        let pending = self.ledger.pending();
        if pending.is_empty() {
            return "no pending transactions".into();
        }
        let mut out = String::new();
        for tx in pending {
            let _ = writeln!(out, "{} -> {} {}", tx.from, tx.to, tx.amount);
        }
        out.trim_end().to_string()
    }
}

fn describe_block(index: usize, block: &Block) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "block {index}");
    let _ = writeln!(out, "  hash:      {}", block.hash_hex());
    let _ = writeln!(
        out,
        "  prev:      {}",
        block.prev_hash.map(hex::encode).unwrap_or_else(|| "-".into())
    );
    let _ = writeln!(out, "  timestamp: {}", block.timestamp);
    let _ = writeln!(out, "  nonce:     {}", block.nonce);
    for tx in &block.transactions {
        let _ = writeln!(
            out,
            "  tx {}: {} -> {} {}",
            hex::encode(tx.hash()),
            tx.from,
            tx.to,
            tx.amount
        );
    }
    out.trim_end().to_string()
}

fn help() -> String {
    COMMANDS
        .iter()
        .map(|c| {
            let names = std::iter::once(c.name)
                .chain(c.aliases.iter().copied())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{names} {}\t- {}", c.usage, c.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{LedgerConfig, MemoryStore};
    use std::sync::Arc;

    fn repl(max_pending: usize) -> Repl<MemoryStore> {
        let wallets: Vec<Wallet> = (0..3).map(|_| Wallet::generate()).collect();
        let ledger = Ledger::open(
            Arc::new(MemoryStore::new()),
            wallets[0].address(),
            LedgerConfig::new(1, max_pending, 2),
        )
        .unwrap();
        Repl::new(ledger, wallets).unwrap()
    }

    fn output(repl: &mut Repl<MemoryStore>, line: &str) -> String {
        match repl.execute(line).unwrap() {
            Outcome::Output(out) => out,
            Outcome::Exit => panic!("unexpected exit for {line:?}"),
        }
    }

    #[test]
    fn help_lists_every_command_and_alias() {
        let mut repl = repl(5);
        let out = output(&mut repl, "help");
        for c in COMMANDS {
            assert!(out.contains(c.name));
            for alias in c.aliases {
                assert!(out.contains(alias));
            }
        }
        assert_eq!(output(&mut repl, "h"), out);
    }

    #[test]
    fn fresh_ledger_state() {
        let mut repl = repl(5);
        assert_eq!(output(&mut repl, "length"), "1");
        assert_eq!(output(&mut repl, "bal"), "1000000");
        assert_eq!(output(&mut repl, "verify"), "true");
        assert_eq!(output(&mut repl, "pending"), "no pending transactions");
        assert!(output(&mut repl, "ls").starts_with('*'));
    }

    #[test]
    fn transfer_by_index_then_flush() {
        let mut repl = repl(5);
        let target = repl.wallets[1].address().to_string();
        let out = output(&mut repl, "tf 250 1");
        assert_eq!(out, format!("250 tokens will be transferred to {target}"));
        assert!(output(&mut repl, "pending").contains(&target));

        assert_eq!(output(&mut repl, "flush"), "1 block(s) successfully mined");
        assert_eq!(output(&mut repl, &format!("balance {target}")), "250");
        assert_eq!(output(&mut repl, "balance"), "999750");
        assert_eq!(output(&mut repl, "len"), "2");
        assert_eq!(output(&mut repl, "block 1 txs"), "1");
    }

    #[test]
    fn transfer_by_address() {
        let mut repl = repl(5);
        let target = Wallet::generate().address().to_string();
        output(&mut repl, &format!("transfer 10 {target}"));
        output(&mut repl, "flush");
        assert_eq!(output(&mut repl, &format!("bal {target}")), "10");
    }

    #[test]
    fn full_queue_reports_the_dropped_transfer() {
        let mut repl = repl(1);
        output(&mut repl, "tf 1 1");
        let out = output(&mut repl, "tf 2 2");
        assert!(out.contains("not queued"));
        let second = repl.wallets[2].address().to_string();
        assert_eq!(output(&mut repl, &format!("bal {second}")), "0");
    }

    #[test]
    fn block_fields() {
        let mut repl = repl(5);
        let hash = repl.ledger.blocks()[0].hash_hex();
        assert_eq!(output(&mut repl, "block 0 hash"), hash);
        assert_eq!(output(&mut repl, "block 0 prev"), "-");
        assert!(output(&mut repl, "block 0").contains(&hash));
        assert!(output(&mut repl, "blocks").starts_with("0. "));
    }

    #[test]
    fn bad_input_is_an_error() {
        let mut repl = repl(5);
        for line in [
            "frobnicate",
            "transfer",
            "transfer 10",
            "transfer -5 1",
            "transfer 10 99",
            "transfer 10 nowhere",
            "transfer 2000000 1",
            "balance BOB",
            "block",
            "block 7",
            "block 0 colour",
        ] {
            assert!(repl.execute(line).is_err(), "{line:?} should fail");
        }
        assert_eq!(output(&mut repl, "pending"), "no pending transactions");
    }

    #[test]
    fn blank_line_and_exit() {
        let mut repl = repl(5);
        assert_eq!(repl.execute("   ").unwrap(), Outcome::Output(String::new()));
        assert_eq!(repl.execute("quit").unwrap(), Outcome::Exit);
        assert_eq!(repl.execute("exit").unwrap(), Outcome::Exit);
    }
}
