//! Collaborator interfaces
//!
//! The recorder does not talk to a VM, a wallet or a UI directly. It goes
//! through these traits so the same capture and replay logic works against an
//! in-process VM, a JSON-RPC node, or a test double.

use crate::records::ResolvedTransaction;
use crate::types::{ExecutionOutcome, SelectedContract};
use alloy_primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use tracing::error;

/// Execution environment the recorder captures from and replays into.
#[async_trait]
pub trait RecorderApi: Send + Sync {
    /// Ordered list of the accounts available in the current context.
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Contract currently selected for deployment.
    fn selected_contract(&self) -> Option<SelectedContract> {
        None
    }

    /// Execute a resolved transaction and wait for its result.
    async fn execute(&self, tx: &ResolvedTransaction) -> Result<ExecutionOutcome>;
}

/// User-facing error sink.
pub trait Alert: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alert sink that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlert;

impl Alert for LogAlert {
    fn alert(&self, message: &str) {
        error!("{}", message);
    }
}
