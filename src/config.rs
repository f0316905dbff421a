//! Scenario and account list loading
//!
//! A scenario is the JSON snapshot produced by `Recorder::get_all`. An account
//! list file holds one Ethereum address per line and lets a scenario be
//! replayed with accounts other than the ones the node reports.

use crate::journal::{sort_entries, Scenario};
use crate::token::parse_address;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load a scenario file.
///
/// Transactions are sorted by timestamp so the file may list them in any order.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {:?}", path))?;
    let mut scenario: Scenario = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid scenario file: {:?}", path))?;
    sort_entries(&mut scenario.transactions);
    Ok(scenario)
}

/// Load an account list from a file.
///
/// Each line should contain one Ethereum address in hex format (with or without 0x prefix).
/// Empty lines and lines starting with '#' are ignored. Line order is the
/// account order, so `account{0}` resolves to the first address.
///
/// # Example file format:
/// ```text
/// 0x5B38Da6a701c568545dCfcB03FcB875f56beddC4
/// # This is a comment
/// 0xAb8483F64d9C6d1EcF9b849Ae677dD3315835cb2
/// ```
pub fn load_accounts(path: &Path) -> Result<Vec<Address>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read account list: {:?}", path))?;

    let mut accounts = Vec::new();
    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let addr = parse_address(line)
            .with_context(|| format!("Invalid address on line {}: {}", line_num + 1, line))?;
        accounts.push(addr);
    }

    if accounts.is_empty() {
        anyhow::bail!("Account list is empty (no valid addresses found)");
    }

    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::AddressToken;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_accounts() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4").unwrap();
        writeln!(file, "# This is a comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Ab8483F64d9C6d1EcF9b849Ae677dD3315835cb2").unwrap();
        file.flush().unwrap();

        let accounts = load_accounts(file.path()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(
            format!("0x{:x}", accounts[0]),
            "0x5b38da6a701c568545dcfcb03fcb875f56beddc4"
        );
    }

    #[test]
    fn test_load_accounts_empty() {
        let file = NamedTempFile::new().unwrap();
        assert!(load_accounts(file.path()).is_err());
    }

    #[test]
    fn test_load_accounts_invalid_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0x1234").unwrap();
        file.flush().unwrap();
        let err = load_accounts(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
    }

    #[test]
    fn test_load_scenario_sorts_transactions() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "accounts": {{ "account{{0}}": "0x5b38da6a701c568545dcfcb03fcb875f56beddc4" }},
                "transactions": [
                    {{ "timestamp": 200, "record": {{ "from": "account{{0}}", "to": "created-contract{{100}}",
                       "value": "0x0", "parameters": ["5"], "name": "set", "type": "function" }} }},
                    {{ "timestamp": 100, "record": {{ "from": "account{{0}}", "value": "0x0",
                       "parameters": [], "type": "constructor", "contractName": "Storage", "bytecode": "0x6080" }} }}
                ],
                "abis": {{}}
            }}"#
        )
        .unwrap();
        file.flush().unwrap();

        let scenario = load_scenario(file.path()).unwrap();
        let stamps: Vec<u64> = scenario.transactions.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![100, 200]);
        assert_eq!(
            scenario.transactions[1].record.to,
            Some(AddressToken::CreatedContract(100))
        );
        assert!(scenario.accounts.contains_key(&AddressToken::Account(0)));
    }

    #[test]
    fn test_load_scenario_missing_file() {
        assert!(load_scenario(Path::new("/nonexistent/scenario.json")).is_err());
    }
}
