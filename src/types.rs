//! Payload types exchanged with the execution environment
//!
//! These describe what the environment reports when a transaction is about to
//! run and after it ran, plus the JSON-RPC receipt returned by a node.

use crate::error::RecorderError;
use crate::records::FunctionKind;
use crate::token::{normalize_address, pad_hex_string, RawAddress};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A transaction the user is about to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub from: Address,
    /// Destination (None for contract creation)
    pub to: Option<Address>,
    pub value: U256,
    /// Read-only call that never produces a transaction
    pub use_call: bool,
}

/// ABI entry the call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: Option<String>,
    pub kind: FunctionKind,
}

/// Decoded call payload attached to an initiated transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPayload {
    pub function_arguments: Vec<Value>,
    pub function: FunctionDescriptor,
    pub deployment_bytecode: Option<Bytes>,
}

/// Contract currently selected for deployment in the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedContract {
    pub name: String,
    pub abi: JsonAbi,
}

/// Result of executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// In-process VM execution
    Vm {
        created_address: Option<Bytes>,
        return_value: Bytes,
    },
    /// Transaction mined by a node
    Network {
        transaction_hash: B256,
        contract_address: Option<String>,
    },
}

impl ExecutionOutcome {
    /// Address of the contract this execution deployed, if any.
    pub fn created_address(&self) -> Result<Option<Address>, RecorderError> {
        let raw = match self {
            ExecutionOutcome::Vm {
                created_address, ..
            } => created_address.clone().map(RawAddress::Bytes),
            ExecutionOutcome::Network {
                contract_address, ..
            } => contract_address.clone().map(RawAddress::Hex),
        };
        normalize_address(raw.as_ref())
    }
}

/// Report fired once a transaction finished executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub from: Address,
    pub to: Option<Address>,
    pub data: Bytes,
    pub is_call: bool,
    pub result: Result<ExecutionOutcome, String>,
    pub timestamp: u64,
}

/// Transaction receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    #[serde(rename = "transactionHash", deserialize_with = "deserialize_hex_b256")]
    pub transaction_hash: B256,

    /// Transaction status: 1 = success, 0 = failure (hex string in JSON)
    #[serde(rename = "status", deserialize_with = "deserialize_hex_u64")]
    pub status: u64,

    /// Gas used (hex string in JSON)
    #[serde(rename = "gasUsed", deserialize_with = "deserialize_hex_u256")]
    pub gas_used: U256,

    /// Address of the deployed contract, null unless the transaction created one
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<String>,
}

impl Receipt {
    /// Check if the transaction succeeded.
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

// Hex deserialization helpers

/// Deserialize a hex string to u64.
fn deserialize_hex_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.strip_prefix("0x").unwrap_or(&s);
    u64::from_str_radix(s, 16).map_err(serde::de::Error::custom)
}

/// Deserialize a hex string to U256.
fn deserialize_hex_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.strip_prefix("0x").unwrap_or(&s);
    if s.is_empty() {
        return Ok(U256::ZERO);
    }
    let bytes = hex::decode(pad_hex_string(s)).map_err(serde::de::Error::custom)?;
    if bytes.len() > 32 {
        return Err(serde::de::Error::custom("U256 value exceeds 32 bytes"));
    }
    Ok(U256::from_be_slice(&bytes))
}

/// Deserialize a hex string to B256.
fn deserialize_hex_b256<'de, D>(deserializer: D) -> Result<B256, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.strip_prefix("0x").unwrap_or(&s);
    let bytes = hex::decode(pad_hex_string(s)).map_err(serde::de::Error::custom)?;
    if bytes.len() != 32 {
        return Err(serde::de::Error::custom(format!(
            "Expected 32 bytes for hash, got {}",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}
