//! txrecorder - transaction recorder and replay engine
//!
//! This library captures the transactions a user sends during a session into
//! a portable journal. Sender accounts and deployed contracts are stored as
//! symbolic tokens (`account{i}`, `created-contract{t}`) so the journal can be
//! replayed later against a fresh chain with a different set of accounts.

pub mod abi;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod journal;
pub mod recorder;
pub mod records;
pub mod replay;
pub mod rpc;
pub mod token;
pub mod types;

#[cfg(test)]
mod mock;

// Re-export the main types for convenience
pub use api::{Alert, LogAlert, RecorderApi};
pub use error::RecorderError;
pub use events::{EventBus, EventDispatcher, EventKind, RecorderEvent};
pub use journal::{Journal, Scenario};
pub use recorder::{Mode, Recorder};
pub use records::{FunctionKind, JournalEntry, Record, ResolvedTransaction};
pub use replay::{ReplayReport, ReplayedContract};
pub use rpc::RpcClient;
pub use token::AddressToken;
