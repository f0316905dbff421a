//! Journal replay
//!
//! Records are executed one at a time in the order given. Each record waits
//! for the previous one to finish because it may target a contract that only
//! exists once an earlier record has been executed.
//!
//! Failure handling:
//! - An unresolved token, a missing ABI, a missing function signature or an
//!   encoding error stops the whole run and is reported to the alert sink.
//! - An execution error is logged and the run continues with the next record.

use crate::abi;
use crate::error::RecorderError;
use crate::recorder::Recorder;
use crate::records::{JournalEntry, ResolvedTransaction};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, B256};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Contract deployed during a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayedContract {
    /// Timestamp of the captured creation record
    pub timestamp: u64,
    pub address: Address,
    pub contract_name: Option<String>,
}

/// Summary of a replay that ran to the end of its records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Records that executed successfully
    pub executed: usize,
    /// Records whose execution failed
    pub failed: usize,
    pub created: Vec<ReplayedContract>,
}

impl Recorder {
    /// Replay `entries` against `accounts`, looking ABIs up in `abis`.
    ///
    /// Capture is suspended for the duration of the run and resumed afterwards,
    /// whether the run completes or aborts. `on_new_contract` is called with the
    /// ABI, address and recorded contract name of every contract deployed.
    pub async fn run<F>(
        &self,
        entries: &[JournalEntry],
        accounts: &[Address],
        abis: &BTreeMap<B256, JsonAbi>,
        mut on_new_contract: F,
    ) -> Result<ReplayReport, RecorderError>
    where
        F: FnMut(&JsonAbi, Address, Option<&str>),
    {
        info!(
            "Replaying {} transactions with {} accounts",
            entries.len(),
            accounts.len()
        );
        self.set_listen(false);
        let result = self
            .replay_entries(entries, accounts, abis, &mut on_new_contract)
            .await;
        self.set_listen(true);

        match &result {
            Ok(report) => info!(
                "Replay finished: {} executed, {} failed, {} contracts created",
                report.executed,
                report.failed,
                report.created.len()
            ),
            Err(e) => error!("Replay aborted: {}", e),
        }
        result
    }

    async fn replay_entries<F>(
        &self,
        entries: &[JournalEntry],
        accounts: &[Address],
        abis: &BTreeMap<B256, JsonAbi>,
        on_new_contract: &mut F,
    ) -> Result<ReplayReport, RecorderError>
    where
        F: FnMut(&JsonAbi, Address, Option<&str>),
    {
        let mut report = ReplayReport::default();

        for entry in entries {
            let (tx, abi) = self.prepare(entry, accounts, abis).map_err(|err| {
                self.report_fatal(&err, entry);
                err
            })?;

            debug!(
                "Executing transaction {} from {:?} to {:?}",
                entry.timestamp, tx.from, tx.to
            );
            let outcome = match self.api.execute(&tx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let err = RecorderError::Execution(format!("{:#}", e));
                    warn!("Transaction {} failed during replay: {}", entry.timestamp, err);
                    report.failed += 1;
                    continue;
                }
            };
            report.executed += 1;

            let address = match outcome.created_address() {
                Ok(Some(address)) => address,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        "Ignoring created address of transaction {}: {}",
                        entry.timestamp, e
                    );
                    continue;
                }
            };

            // Later records refer to this contract through the original timestamp
            self.state()
                .journal
                .tokenize_contract_address(address, entry.timestamp);
            let contract_name = entry.record.contract_name.as_deref();
            info!(
                "Created {} at {:?} (recorded at {})",
                contract_name.unwrap_or("contract"),
                address,
                entry.timestamp
            );
            on_new_contract(abi, address, contract_name);
            report.created.push(ReplayedContract {
                timestamp: entry.timestamp,
                address,
                contract_name: entry.record.contract_name.clone(),
            });
        }

        Ok(report)
    }

    /// Resolve addresses, pick the ABI entry and encode the call data.
    fn prepare<'a>(
        &self,
        entry: &JournalEntry,
        accounts: &[Address],
        abis: &'a BTreeMap<B256, JsonAbi>,
    ) -> Result<(ResolvedTransaction, &'a JsonAbi), RecorderError> {
        let record = &entry.record;
        let mut tx = self.resolve_address(entry, accounts)?;

        let abi = record
            .abi
            .as_ref()
            .and_then(|hash| abis.get(hash))
            .ok_or(RecorderError::MissingAbi(record.abi))?;

        let signature = abi::signature_for(
            abi,
            record.kind,
            record.name.as_deref(),
            record.parameters.len(),
        )
        .ok_or_else(|| RecorderError::MissingFunctionSignature(record.name.clone()))?;

        tx.data = abi::encode_call_data(&signature, &record.parameters, record.bytecode.as_ref())?;
        Ok((tx, abi))
    }

    fn report_fatal(&self, err: &RecorderError, entry: &JournalEntry) {
        let record = serde_json::to_string_pretty(&entry.record)
            .unwrap_or_else(|e| format!("<unprintable record: {}>", e));
        self.alert.alert(&format!(
            "{}. Execution stopped. Record {}: {}",
            err, entry.timestamp, record
        ));
    }
}
