//! Error taxonomy for capture and replay
//!
//! Capture-side errors (`AccountFetch`, `UnknownAccount`) drop a single record.
//! Replay-side resolution errors abort the whole run; `Execution` is the only
//! replay error that lets the run continue with the next record.

use alloy_primitives::{Address, B256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    /// The account list could not be fetched while capturing.
    #[error("failed to fetch accounts: {0}")]
    AccountFetch(String),

    /// The sender of a captured transaction is not in the account list.
    #[error("sender {0:?} is not one of the known accounts")]
    UnknownAccount(Address),

    /// An `account{N}` token points past the end of the replay account list.
    #[error("no account at index {index} ({available} accounts available)")]
    UnresolvedAccount { index: usize, available: usize },

    /// A `created-contract{T}` token has no address registered for `T`.
    #[error("no contract creation recorded at timestamp {0}")]
    UnresolvedContractReference(u64),

    /// A token string or token position that cannot be used.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A raw address that is not 20 bytes of hex.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("cannot find ABI for {}", display_hash(.0))]
    MissingAbi(Option<B256>),

    #[error("cannot resolve function signature for {}", .0.as_deref().unwrap_or("<unnamed>"))]
    MissingFunctionSignature(Option<String>),

    #[error("failed to encode call data: {0}")]
    Encoding(String),

    #[error("transaction execution failed: {0}")]
    Execution(String),
}

impl RecorderError {
    /// Whether this error must halt a replay in progress.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RecorderError::Execution(_)
                | RecorderError::AccountFetch(_)
                | RecorderError::UnknownAccount(_)
        )
    }
}

fn display_hash(hash: &Option<B256>) -> String {
    match hash {
        Some(hash) => format!("0x{:x}", hash),
        None => "<no ABI reference>".to_string(),
    }
}
