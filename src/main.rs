//! txrecorder - transaction scenario recorder CLI
//!
//! Inspects scenarios captured by the recorder and replays them against a
//! JSON-RPC node.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use txrecorder::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::run().await
}
