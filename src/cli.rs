//! CLI implementation for txrecorder
//!
//! Inspects recorded scenarios and replays them against a node. All commands
//! output pretty JSON.

use crate::api::LogAlert;
use crate::config::{load_accounts, load_scenario};
use crate::recorder::Recorder;
use crate::rpc::RpcClient;
use crate::token::address_to_string;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Transaction recorder CLI tool
#[derive(Parser)]
#[command(name = "txrecorder")]
#[command(about = "Inspect and replay recorded transaction scenarios")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a scenario with its transactions in replay order
    Show {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },
    /// Replay a scenario against a node with unlocked accounts
    Replay {
        /// Path to the scenario JSON file
        scenario: PathBuf,

        /// RPC endpoint URL
        #[arg(short, long, default_value = "http://127.0.0.1:8545")]
        rpc_url: String,

        /// Account list file (one address per line). Defaults to the node's accounts
        #[arg(short, long)]
        accounts: Option<PathBuf>,

        /// Delay between receipt polls in milliseconds
        #[arg(long, default_value_t = 500)]
        poll_interval_ms: u64,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Show { scenario } => {
            let scenario = load_scenario(&scenario)?;
            serde_json::to_value(&scenario)?
        }

        Commands::Replay {
            scenario,
            rpc_url,
            accounts,
            poll_interval_ms,
        } => {
            let scenario = load_scenario(&scenario)?;
            info!("RPC URL: {}", rpc_url);

            let rpc = Arc::new(
                RpcClient::new(rpc_url)
                    .with_poll_interval(Duration::from_millis(poll_interval_ms)),
            );
            let accounts = match accounts {
                Some(path) => load_accounts(&path)?,
                None => rpc
                    .get_accounts()
                    .await
                    .context("Failed to fetch accounts from node")?,
            };

            let recorder = Recorder::new(rpc, Arc::new(LogAlert));
            let report = recorder
                .run(
                    &scenario.transactions,
                    &accounts,
                    &scenario.abis,
                    |_abi, address, name| {
                        info!(
                            "New contract {} at {}",
                            name.unwrap_or("<unnamed>"),
                            address_to_string(&address)
                        );
                    },
                )
                .await?;

            json!({
                "accounts": accounts.iter().map(address_to_string).collect::<Vec<_>>(),
                "report": report,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
