use crate::storage::SpendPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "utxo-ledger")]
pub struct Opt {
    #[arg(
        long = "config",
        global = true,
        help = "TOML configuration file (overrides LEDGER_CONFIG)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "node",
        global = true,
        help = "Address of the ledger node (overrides NODE_ADDRESS)"
    )]
    pub node: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node over the seed chain")]
    StartNode {
        #[arg(
            long = "policy",
            help = "How spent outputs are tracked (transaction-hash, output)"
        )]
        policy: Option<SpendPolicy>,
        #[arg(long = "capacity", help = "Submission queue capacity")]
        capacity: Option<usize>,
    },
    #[command(name = "send", about = "Transfer value between accounts")]
    Send {
        #[arg(help = "Sending account")]
        from: String,
        #[arg(help = "Receiving account")]
        to: String,
        #[arg(help = "Value to transfer")]
        value: u64,
    },
    #[command(name = "submit", about = "Submit a transaction read from a JSON file")]
    Submit {
        #[arg(help = "Path to the transaction JSON")]
        path: PathBuf,
    },
    #[command(name = "printchain", about = "Print all blocks in the ledger")]
    Printchain,
    #[command(name = "getbalance", about = "Get the spendable balance of an account")]
    GetBalance {
        #[arg(help = "The account name")]
        account: String,
    },
}
