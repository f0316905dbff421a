//! Replay-stable address tokens
//!
//! Captured transactions never store the concrete sender or the concrete
//! address of a contract deployed in the session. They store a token that is
//! resolved again at replay time:
//!
//! - `account{N}`: position `N` in the account list
//! - `created-contract{T}`: the contract created by the transaction captured at timestamp `T`
//! - `0x…`: a plain address that is used as-is

use crate::error::RecorderError;
use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const ACCOUNT_PREFIX: &str = "account";
const CREATED_CONTRACT_PREFIX: &str = "created-contract";

/// Placeholder for a context-specific address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressToken {
    /// Index into the account list.
    Account(usize),
    /// Timestamp of the capture that deployed the contract.
    CreatedContract(u64),
    /// Address that does not depend on the session.
    Direct(Address),
}

impl AddressToken {
    /// The creation timestamp for `created-contract{T}` tokens.
    pub fn creation_timestamp(&self) -> Option<u64> {
        match self {
            AddressToken::CreatedContract(timestamp) => Some(*timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for AddressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressToken::Account(index) => write!(f, "{}{{{}}}", ACCOUNT_PREFIX, index),
            AddressToken::CreatedContract(timestamp) => {
                write!(f, "{}{{{}}}", CREATED_CONTRACT_PREFIX, timestamp)
            }
            AddressToken::Direct(addr) => f.write_str(&address_to_string(addr)),
        }
    }
}

impl FromStr for AddressToken {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(index) = braced(s, ACCOUNT_PREFIX) {
            return index
                .parse()
                .map(AddressToken::Account)
                .map_err(|_| RecorderError::InvalidToken(s.to_string()));
        }
        if let Some(timestamp) = braced(s, CREATED_CONTRACT_PREFIX) {
            return timestamp
                .parse()
                .map(AddressToken::CreatedContract)
                .map_err(|_| RecorderError::InvalidToken(s.to_string()));
        }
        parse_address(s)
            .map(AddressToken::Direct)
            .map_err(|_| RecorderError::InvalidToken(s.to_string()))
    }
}

impl Serialize for AddressToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Extract `inner` from `prefix{inner}`.
fn braced<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix)?.strip_prefix('{')?.strip_suffix('}')
}

/// Position of `address` in the account list.
pub fn account_index(address: Address, accounts: &[Address]) -> Option<usize> {
    accounts.iter().position(|account| *account == address)
}

/// Look up the account at `index`.
pub fn resolve_account(index: usize, accounts: &[Address]) -> Result<Address, RecorderError> {
    accounts
        .get(index)
        .copied()
        .ok_or(RecorderError::UnresolvedAccount {
            index,
            available: accounts.len(),
        })
}

/// Created address as reported by an execution backend.
///
/// The in-process VM hands back raw bytes; a networked node reports a hex
/// string in the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAddress {
    Bytes(Bytes),
    Hex(String),
}

/// Normalize a raw created address.
///
/// Absent or empty input yields `None`, which marks "not a contract creation".
pub fn normalize_address(raw: Option<&RawAddress>) -> Result<Option<Address>, RecorderError> {
    match raw {
        None => Ok(None),
        Some(RawAddress::Bytes(bytes)) if bytes.is_empty() => Ok(None),
        Some(RawAddress::Bytes(bytes)) => {
            if bytes.len() != 20 {
                return Err(RecorderError::InvalidAddress(format!(
                    "0x{} ({} bytes)",
                    hex::encode(bytes),
                    bytes.len()
                )));
            }
            Ok(Some(Address::from_slice(bytes)))
        }
        Some(RawAddress::Hex(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == "0x" {
                return Ok(None);
            }
            parse_address(trimmed).map(Some)
        }
    }
}

/// Render an address as lowercase hex with a `0x` prefix.
pub fn address_to_string(addr: &Address) -> String {
    format!("0x{:x}", addr)
}

/// Pad an odd-length hex string with a leading zero.
/// This handles cases where RPC returns hex strings without leading zeros.
pub(crate) fn pad_hex_string(s: &str) -> String {
    if s.len() % 2 == 1 {
        format!("0{}", s)
    } else {
        s.to_string()
    }
}

/// Parse an address from a hex string.
///
/// Accepts addresses with or without 0x prefix.
pub fn parse_address(s: &str) -> Result<Address, RecorderError> {
    let hex_part = s.strip_prefix("0x").unwrap_or(s);
    let hex_part = pad_hex_string(hex_part);
    let bytes =
        hex::decode(&hex_part).map_err(|_| RecorderError::InvalidAddress(s.to_string()))?;
    if bytes.len() != 20 {
        return Err(RecorderError::InvalidAddress(format!(
            "{} ({} bytes)",
            s,
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}
