//! Transaction capture
//!
//! The recorder listens to the execution environment's lifecycle events and
//! turns every state-changing transaction into a journal record whose
//! addresses are tokens. Capture is suspended while a replay is running so
//! replayed transactions never re-enter the journal.

use crate::abi::abi_hash;
use crate::api::{Alert, RecorderApi};
use crate::error::RecorderError;
use crate::events::{EventDispatcher, EventKind, RecorderEvent};
use crate::journal::{Journal, Scenario};
use crate::records::{FunctionKind, JournalEntry, Record, ResolvedTransaction};
use crate::token::AddressToken;
use crate::types::{CallPayload, ExecutionReport, TransactionIntent};
use alloy_primitives::{Address, Bytes, B256, U256};
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Capture mode. Listening and replaying are never active at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Listening,
    Replaying,
}

pub(crate) struct RecorderState {
    pub(crate) journal: Journal,
    mode: Mode,
}

/// Records user transactions and replays them.
pub struct Recorder {
    pub(crate) api: Arc<dyn RecorderApi>,
    pub(crate) alert: Arc<dyn Alert>,
    state: Mutex<RecorderState>,
}

/// A captured record still waiting for its sender token.
struct Draft {
    to: Option<AddressToken>,
    value: U256,
    parameters: Vec<serde_json::Value>,
    name: Option<String>,
    kind: FunctionKind,
    abi: Option<B256>,
    contract_name: Option<String>,
    bytecode: Option<Bytes>,
}

impl Draft {
    fn into_record(self, from: AddressToken) -> Record {
        Record {
            from,
            to: self.to,
            value: self.value,
            parameters: self.parameters,
            name: self.name,
            kind: self.kind,
            abi: self.abi,
            contract_name: self.contract_name,
            bytecode: self.bytecode,
        }
    }
}

impl Recorder {
    /// Create a recorder with an empty journal, listening.
    pub fn new(api: Arc<dyn RecorderApi>, alert: Arc<dyn Alert>) -> Self {
        Self {
            api,
            alert,
            state: Mutex::new(RecorderState {
                journal: Journal::new(),
                mode: Mode::Listening,
            }),
        }
    }

    /// Subscribe to the environment's lifecycle events.
    pub fn register(self: &Arc<Self>, dispatcher: &mut dyn EventDispatcher) {
        let recorder = Arc::clone(self);
        dispatcher.register(
            EventKind::ContextChanged,
            Box::new(move |_event| {
                info!("Execution context changed, clearing recorded transactions");
                recorder.clear_all();
                futures::future::ready(()).boxed()
            }),
        );

        let recorder = Arc::clone(self);
        dispatcher.register(
            EventKind::TransactionInitiated,
            Box::new(move |event| {
                let recorder = Arc::clone(&recorder);
                async move {
                    if let RecorderEvent::TransactionInitiated {
                        timestamp,
                        intent,
                        payload,
                    } = event
                    {
                        recorder
                            .on_transaction_initiated(timestamp, intent, payload)
                            .await;
                    }
                }
                .boxed()
            }),
        );

        let recorder = Arc::clone(self);
        dispatcher.register(
            EventKind::TransactionExecuted,
            Box::new(move |event| {
                if let RecorderEvent::TransactionExecuted(report) = &event {
                    recorder.on_transaction_executed(report);
                }
                futures::future::ready(()).boxed()
            }),
        );
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start or stop capturing. Not listening means replaying.
    pub fn set_listen(&self, listen: bool) {
        self.state().mode = if listen {
            Mode::Listening
        } else {
            Mode::Replaying
        };
    }

    pub fn mode(&self) -> Mode {
        self.state().mode
    }

    pub fn is_listening(&self) -> bool {
        self.mode() == Mode::Listening
    }

    pub fn is_replaying(&self) -> bool {
        self.mode() == Mode::Replaying
    }

    pub fn append(&self, timestamp: u64, record: Record) {
        self.state().journal.append(timestamp, record);
    }

    /// Sorted snapshot of the journal with its account and ABI tables.
    pub fn get_all(&self) -> Scenario {
        self.state().journal.get_all()
    }

    /// Forget every recorded transaction, address and ABI.
    pub fn clear_all(&self) {
        self.state().journal.clear_all();
    }

    /// Turn the tokens of a recorded entry back into concrete addresses.
    ///
    /// Creation records keep `to` empty. The returned transaction carries no
    /// call data yet.
    pub fn resolve_address(
        &self,
        entry: &JournalEntry,
        accounts: &[Address],
    ) -> Result<ResolvedTransaction, RecorderError> {
        let record = &entry.record;
        if let AddressToken::CreatedContract(_) = record.from {
            return Err(RecorderError::InvalidToken(format!(
                "{} cannot be a sender",
                record.from
            )));
        }

        let state = self.state();
        let from = state.journal.resolve_token(&record.from, accounts)?;
        let to = record
            .to
            .as_ref()
            .map(|token| state.journal.resolve_token(token, accounts))
            .transpose()?;

        Ok(ResolvedTransaction {
            timestamp: entry.timestamp,
            from,
            to,
            value: record.value,
            data: Bytes::new(),
            name: record.name.clone(),
            contract_name: record.contract_name.clone(),
        })
    }

    /// ABI hash of the contract creation a record's destination points to.
    pub fn resolve_abi_reference(&self, record: &Record) -> Option<B256> {
        let timestamp = record.to.as_ref()?.creation_timestamp()?;
        self.state().journal.abi_hash_for_creation(timestamp)
    }

    /// Capture a transaction that is about to execute.
    ///
    /// Read-only calls and transactions seen while replaying are ignored. A
    /// failure to fetch the account list drops this record only.
    pub async fn on_transaction_initiated(
        &self,
        timestamp: u64,
        intent: TransactionIntent,
        payload: CallPayload,
    ) {
        if intent.use_call {
            debug!("Ignoring read-only call at {}", timestamp);
            return;
        }
        let sender = intent.from;
        let Some(draft) = self.draft(timestamp, intent, payload) else {
            return;
        };

        let accounts = match self.api.accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                let err = RecorderError::AccountFetch(format!("{:#}", e));
                warn!("Dropping transaction captured at {}: {}", timestamp, err);
                return;
            }
        };

        let mut state = self.state();
        match state.journal.tokenize_account(sender, &accounts) {
            Ok(from) => {
                debug!("Captured transaction at {} from {}", timestamp, from);
                state.journal.append(timestamp, draft.into_record(from));
            }
            Err(err) => warn!("Dropping transaction captured at {}: {}", timestamp, err),
        }
    }

    fn draft(
        &self,
        timestamp: u64,
        intent: TransactionIntent,
        payload: CallPayload,
    ) -> Option<Draft> {
        let selected = match intent.to {
            None => self.api.selected_contract(),
            Some(_) => None,
        };

        let mut state = self.state();
        if state.mode != Mode::Listening {
            debug!("Replaying, ignoring transaction initiated at {}", timestamp);
            return None;
        }

        let mut draft = Draft {
            to: None,
            value: intent.value,
            parameters: payload.function_arguments,
            name: payload.function.name,
            kind: payload.function.kind,
            abi: None,
            contract_name: None,
            bytecode: None,
        };

        match intent.to {
            None => match selected {
                Some(contract) => match abi_hash(&contract.abi) {
                    Ok(hash) => {
                        draft.abi = Some(hash);
                        draft.contract_name = Some(contract.name);
                        draft.bytecode = payload.deployment_bytecode;
                        state.journal.register_abi(timestamp, hash, contract.abi);
                    }
                    Err(e) => warn!(
                        "Could not hash ABI of {} deployed at {}: {}",
                        contract.name, timestamp, e
                    ),
                },
                None => warn!(
                    "No contract selected for deployment at {}, recording it without ABI",
                    timestamp
                ),
            },
            Some(to) => match state.journal.creation_timestamp(&to) {
                Some(created) => {
                    draft.to = Some(AddressToken::CreatedContract(created));
                    draft.abi = state.journal.abi_hash_for_creation(created);
                }
                None => {
                    warn!(
                        "Destination {:?} at {} was not created in this session, its ABI is unknown",
                        to, timestamp
                    );
                    draft.to = Some(AddressToken::Direct(to));
                }
            },
        }

        Some(draft)
    }

    /// Remember the address of a contract created by a captured transaction.
    pub fn on_transaction_executed(&self, report: &ExecutionReport) {
        let outcome = match &report.result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Transaction at {} failed: {}", report.timestamp, e);
                return;
            }
        };
        if report.is_call {
            return;
        }

        match outcome.created_address() {
            Ok(Some(address)) => {
                info!(
                    "Contract created at {:?} by transaction {}",
                    address, report.timestamp
                );
                self.state()
                    .journal
                    .tokenize_contract_address(address, report.timestamp);
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Ignoring created address of transaction {}: {}",
                report.timestamp, e
            ),
        }
    }
}
