//! Record types for the transaction journal
//!
//! A `Record` is one captured transaction intent with every session-specific
//! address replaced by an `AddressToken`. The JSON shape uses camelCase keys so a
//! snapshot can be exchanged with the tooling that produced it.

use crate::token::AddressToken;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Kind of ABI entry a record invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Constructor,
    Function,
}

/// One captured transaction intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Sender, normally `account{N}`
    pub from: AddressToken,
    /// Destination (None for contract creation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<AddressToken>,
    /// Native currency sent with the call, in wei
    #[serde(default)]
    pub value: U256,
    /// Decoded call arguments in declaration order
    #[serde(default)]
    pub parameters: Vec<serde_json::Value>,
    /// Function name (None for constructors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: FunctionKind,
    /// Content hash of the ABI used to encode this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    /// Deployment bytecode (creation records only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<Bytes>,
}

impl Record {
    /// Check if this record deploys a contract.
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// A record keyed by the timestamp of its capture.
///
/// Timestamps are unique and double as identifiers for contract creations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: u64,
    pub record: Record,
}

/// A record with its tokens resolved and its call data encoded, ready to be
/// handed to an execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransaction {
    /// Timestamp of the captured record this transaction replays
    pub timestamp: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub name: Option<String>,
    pub contract_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_json_shape() {
        let record = Record {
            from: AddressToken::Account(0),
            to: Some(AddressToken::CreatedContract(100)),
            value: U256::from(5u64),
            parameters: vec![json!("42")],
            name: Some("set".into()),
            kind: FunctionKind::Function,
            abi: Some(B256::repeat_byte(0x11)),
            contract_name: None,
            bytecode: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["from"], "account{0}");
        assert_eq!(value["to"], "created-contract{100}");
        assert_eq!(value["type"], "function");
        assert_eq!(value["name"], "set");
        assert!(value.get("contractName").is_none());
        assert!(value.get("bytecode").is_none());

        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_creation_record_without_to() {
        let value = json!({
            "from": "account{1}",
            "value": "0x0",
            "parameters": [],
            "type": "constructor",
            "contractName": "Storage",
            "bytecode": "0x6080"
        });
        let record: Record = serde_json::from_value(value).unwrap();
        assert!(record.is_contract_creation());
        assert_eq!(record.kind, FunctionKind::Constructor);
        assert_eq!(record.contract_name.as_deref(), Some("Storage"));
        assert_eq!(record.bytecode.unwrap().to_vec(), vec![0x60, 0x80]);
        assert_eq!(record.abi, None);
    }
}
