// Entry point for the ledger node and its client commands
use clap::Parser;
use log::{error, info};
use std::fs;
use std::process;
use utxo_ledger::{
    send_request, Blockchain, Command, Ledger, Opt, Request, Response, Server, Settings,
    Transaction, GLOBAL_CONFIG,
};

fn main() {
    let opt = Opt::parse();

    // Settings are resolved before logging so the configured level applies
    let settings = match Settings::resolve(opt.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // RUST_LOG still wins over the configured default
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.as_str()),
    )
    .init();

    GLOBAL_CONFIG.replace(settings);
    if let Some(node) = opt.node {
        GLOBAL_CONFIG.set_node_addr(node);
    }

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let node_addr = GLOBAL_CONFIG.get_node_addr();
    match command {
        Command::StartNode { policy, capacity } => {
            if let Some(policy) = policy {
                GLOBAL_CONFIG.set_spend_policy(policy);
            }
            if let Some(capacity) = capacity {
                GLOBAL_CONFIG.set_queue_capacity(capacity)?;
            }

            // Every node starts from the same seed chain, so their genesis blocks match
            let blockchain = Blockchain::seeded(GLOBAL_CONFIG.get_spend_policy())?;
            let ledger = Ledger::spawn(blockchain, GLOBAL_CONFIG.get_queue_capacity())?;

            let server = Server::new(ledger.handle());
            let served = server.run(&node_addr);
            drop(server);

            info!("Shutting down ledger");
            ledger.shutdown()?;
            served?
        }
        Command::Send { from, to, value } => {
            let response = send_request(&node_addr, &Request::Send { from, to, value })?;
            print_response(response)?
        }
        Command::Submit { path } => {
            let contents = fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            let transaction: Transaction = serde_json::from_str(&contents)
                .map_err(|e| format!("Invalid transaction in {}: {e}", path.display()))?;
            let response = send_request(&node_addr, &Request::Submit { transaction })?;
            print_response(response)?
        }
        Command::Printchain => {
            let response = send_request(&node_addr, &Request::GetChain)?;
            print_response(response)?
        }
        Command::GetBalance { account } => {
            let response = send_request(&node_addr, &Request::GetBalance { account })?;
            print_response(response)?
        }
    }
    Ok(())
}

fn print_response(response: Response) -> Result<(), Box<dyn std::error::Error>> {
    match response {
        Response::Accepted { block } => {
            println!("Block {} appended: {}", block.get_index(), block.get_hash());
        }
        Response::Rejected { kind, message } => {
            return Err(format!("{kind}: {message}").into());
        }
        Response::ChainProposal { replaced } => {
            println!("Chain replaced: {replaced}");
        }
        Response::Chain { blocks } => {
            // Newest block first
            for block in blocks.iter().rev() {
                println!("Block #{}", block.get_index());
                println!("Pre block hash: {}", block.get_prev_hash());
                println!("Cur block hash: {}", block.get_hash());
                println!("Cur block Timestamp: {}", block.get_timestamp());

                for tx in block.get_transactions() {
                    println!("- Transaction hash: {}", tx.get_hash());
                    for income in tx.get_incomes() {
                        println!(
                            "-- Income prev = {}, number = {}, from = {}",
                            income.get_prev_transaction_hash(),
                            income.get_prev_output_number(),
                            tx.get_from(),
                        )
                    }
                    for outcome in tx.get_outcomes() {
                        println!(
                            "-- Outcome #{} value = {}, to = {}",
                            outcome.get_number(),
                            outcome.get_value(),
                            outcome.get_target(),
                        )
                    }
                }
                println!()
            }
        }
        Response::Balance { account, balance } => {
            println!("Balance of {account}: {balance}");
        }
    }
    Ok(())
}
