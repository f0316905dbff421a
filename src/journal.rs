//! Transaction journal and its side tables
//!
//! The journal is an append-only log of captured records plus the lookup
//! tables needed to turn tokens back into addresses:
//!
//! - created contract address -> creation timestamp, and the inverse
//! - account token -> account address seen at capture time
//! - ABI hash -> ABI definition
//! - creation timestamp -> ABI hash used for that deployment

use crate::error::RecorderError;
use crate::records::{JournalEntry, Record};
use crate::token::{self, AddressToken};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Snapshot of the journal, sorted and ready to be replayed or saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Account tokens seen during capture
    #[serde(default)]
    pub accounts: BTreeMap<AddressToken, Address>,
    /// Entries in ascending timestamp order
    #[serde(default)]
    pub transactions: Vec<JournalEntry>,
    /// ABIs referenced by the entries, keyed by content hash
    #[serde(default)]
    pub abis: BTreeMap<B256, JsonAbi>,
}

/// Sort entries by timestamp, keeping the relative order of equal timestamps.
pub fn sort_entries(entries: &mut [JournalEntry]) {
    entries.sort_by_key(|entry| entry.timestamp);
}

#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    created_at_timestamp: HashMap<Address, u64>,
    creation_timestamp_to_address: HashMap<u64, Address>,
    used_accounts: BTreeMap<AddressToken, Address>,
    abis_by_hash: BTreeMap<B256, JsonAbi>,
    creation_timestamp_to_abi_hash: HashMap<u64, B256>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, timestamp: u64, record: Record) {
        self.entries.push(JournalEntry { timestamp, record });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy out every entry sorted by timestamp together with the account and
    /// ABI tables. The journal itself is left in insertion order.
    pub fn get_all(&self) -> Scenario {
        let mut transactions = self.entries.clone();
        sort_entries(&mut transactions);
        Scenario {
            accounts: self.used_accounts.clone(),
            transactions,
            abis: self.abis_by_hash.clone(),
        }
    }

    /// Drop every entry and every side table.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.created_at_timestamp.clear();
        self.creation_timestamp_to_address.clear();
        self.used_accounts.clear();
        self.abis_by_hash.clear();
        self.creation_timestamp_to_abi_hash.clear();
    }

    /// Replace `address` with its `account{i}` token and remember the mapping.
    pub fn tokenize_account(
        &mut self,
        address: Address,
        accounts: &[Address],
    ) -> Result<AddressToken, RecorderError> {
        let index =
            token::account_index(address, accounts).ok_or(RecorderError::UnknownAccount(address))?;
        let account = AddressToken::Account(index);
        self.used_accounts.insert(account, address);
        Ok(account)
    }

    /// Register a deployed contract under the timestamp of the transaction
    /// that created it.
    pub fn tokenize_contract_address(&mut self, address: Address, timestamp: u64) {
        self.created_at_timestamp.insert(address, timestamp);
        self.creation_timestamp_to_address.insert(timestamp, address);
    }

    /// Creation timestamp of a contract deployed in this session.
    pub fn creation_timestamp(&self, address: &Address) -> Option<u64> {
        self.created_at_timestamp.get(address).copied()
    }

    pub fn resolve_created_contract(&self, timestamp: u64) -> Result<Address, RecorderError> {
        self.creation_timestamp_to_address
            .get(&timestamp)
            .copied()
            .ok_or(RecorderError::UnresolvedContractReference(timestamp))
    }

    /// Resolve any token to a concrete address.
    pub fn resolve_token(
        &self,
        token: &AddressToken,
        accounts: &[Address],
    ) -> Result<Address, RecorderError> {
        match token {
            AddressToken::Account(index) => token::resolve_account(*index, accounts),
            AddressToken::CreatedContract(timestamp) => self.resolve_created_contract(*timestamp),
            AddressToken::Direct(address) => Ok(*address),
        }
    }

    /// Store an ABI and bind it to the creation captured at `timestamp`.
    pub fn register_abi(&mut self, timestamp: u64, hash: B256, abi: JsonAbi) {
        self.abis_by_hash.insert(hash, abi);
        self.creation_timestamp_to_abi_hash.insert(timestamp, hash);
    }

    /// ABI hash used for the deployment captured at `timestamp`.
    pub fn abi_hash_for_creation(&self, timestamp: u64) -> Option<B256> {
        self.creation_timestamp_to_abi_hash.get(&timestamp).copied()
    }

    pub fn abi(&self, hash: &B256) -> Option<&JsonAbi> {
        self.abis_by_hash.get(hash)
    }
}
