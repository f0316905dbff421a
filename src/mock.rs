//! Scripted collaborators for tests
//!
//! `MockApi` hands out a configurable account list, records every transaction
//! it is asked to execute and answers with queued outcomes.

use crate::api::{Alert, RecorderApi};
use crate::records::{FunctionKind, ResolvedTransaction};
use crate::types::{CallPayload, ExecutionOutcome, FunctionDescriptor, SelectedContract};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct MockApi {
    accounts: Mutex<Result<Vec<Address>, String>>,
    selected: Mutex<Option<SelectedContract>>,
    outcomes: Mutex<VecDeque<Result<ExecutionOutcome, String>>>,
    executed: Mutex<Vec<ResolvedTransaction>>,
}

impl MockApi {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts: Mutex::new(Ok(accounts)),
            selected: Mutex::new(None),
            outcomes: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = Ok(accounts);
    }

    pub fn fail_accounts(&self, message: &str) {
        *self.accounts.lock().unwrap() = Err(message.to_string());
    }

    pub fn select(&self, contract: Option<SelectedContract>) {
        *self.selected.lock().unwrap() = contract;
    }

    /// Queue the result of the next `execute` call. Without a queued result
    /// execution succeeds and creates nothing.
    pub fn push_outcome(&self, outcome: Result<ExecutionOutcome, String>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn executed(&self) -> Vec<ResolvedTransaction> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecorderApi for MockApi {
    async fn accounts(&self) -> Result<Vec<Address>> {
        self.accounts.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    fn selected_contract(&self) -> Option<SelectedContract> {
        self.selected.lock().unwrap().clone()
    }

    async fn execute(&self, tx: &ResolvedTransaction) -> Result<ExecutionOutcome> {
        self.executed.lock().unwrap().push(tx.clone());
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(vm_plain())).map_err(|e| anyhow!(e))
    }
}

/// Alert sink that keeps every message.
#[derive(Default)]
pub struct CollectingAlert {
    messages: Mutex<Vec<String>>,
}

impl CollectingAlert {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Alert for CollectingAlert {
    fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Simple storage contract: `constructor(uint256)`, `set(uint256)`, `get()`.
pub fn storage_abi() -> JsonAbi {
    serde_json::from_value(json!([
        {
            "type": "constructor",
            "inputs": [{ "name": "initial", "type": "uint256", "internalType": "uint256" }],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "set",
            "inputs": [{ "name": "value", "type": "uint256", "internalType": "uint256" }],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "get",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }],
            "stateMutability": "view"
        }
    ]))
    .unwrap()
}

pub fn storage_bytecode() -> Bytes {
    Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52])
}

pub fn constructor_payload(arguments: Vec<Value>) -> CallPayload {
    CallPayload {
        function_arguments: arguments,
        function: FunctionDescriptor {
            name: None,
            kind: FunctionKind::Constructor,
        },
        deployment_bytecode: Some(storage_bytecode()),
    }
}

pub fn call_payload(name: &str, arguments: Vec<Value>) -> CallPayload {
    CallPayload {
        function_arguments: arguments,
        function: FunctionDescriptor {
            name: Some(name.to_string()),
            kind: FunctionKind::Function,
        },
        deployment_bytecode: None,
    }
}

pub fn vm_created(address: Address) -> ExecutionOutcome {
    ExecutionOutcome::Vm {
        created_address: Some(Bytes::copy_from_slice(address.as_slice())),
        return_value: Bytes::new(),
    }
}

pub fn vm_plain() -> ExecutionOutcome {
    ExecutionOutcome::Vm {
        created_address: None,
        return_value: Bytes::new(),
    }
}
