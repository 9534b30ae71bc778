use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "relayer", about = "Cross-chain BTC/EVM staking event relayer")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run all configured relay instances until signaled.
    Start {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// One-shot balance-refresher poller, independent of the core pipeline.
    RefreshBalances {
        #[arg(short, long)]
        config: PathBuf,
    },
}
