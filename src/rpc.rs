//! JSON-RPC client for Ethereum nodes
//!
//! Executes replayed transactions against a node with unlocked accounts
//! (a local dev node such as Anvil or Hardhat). Transactions are sent with
//! `eth_sendTransaction` and the receipt is polled until the node mines them.

use crate::api::RecorderApi;
use crate::records::ResolvedTransaction;
use crate::types::{ExecutionOutcome, Receipt};
use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

/// Default delay between two receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Number of polls before giving up on a receipt.
const MAX_RECEIPT_POLLS: u32 = 240;

/// JSON-RPC client for Ethereum nodes.
pub struct RpcClient {
    client: reqwest::Client,
    url: String,
    poll_interval: Duration,
}

impl RpcClient {
    /// Create a new RPC client.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Make a JSON-RPC call.
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("Failed to send RPC request")?;

        let json: Value = response
            .json()
            .await
            .context("Failed to parse RPC response")?;

        // Check for RPC error
        if let Some(error) = json.get("error") {
            anyhow::bail!("RPC error: {}", error);
        }

        // Extract result
        json.get("result")
            .cloned()
            .context("RPC response missing 'result' field")
    }

    /// Get the accounts managed by the node, in node order.
    pub async fn get_accounts(&self) -> Result<Vec<Address>> {
        let result = self.call("eth_accounts", json!([])).await?;
        serde_json::from_value(result).context("Failed to deserialize accounts")
    }

    /// Submit a transaction signed by the node and return its hash.
    pub async fn send_transaction(&self, tx: &ResolvedTransaction) -> Result<B256> {
        let params = json!([transaction_request(tx)]);
        let result = self.call("eth_sendTransaction", params).await?;
        serde_json::from_value(result).context("Failed to deserialize transaction hash")
    }

    /// Get a transaction receipt by hash, None while the transaction is pending.
    pub async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>> {
        let hash_str = format!("0x{:x}", tx_hash);
        let params = json!([hash_str]);
        let result = self.call("eth_getTransactionReceipt", params).await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .context("Failed to deserialize receipt")
    }

    /// Poll until the transaction is mined.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt> {
        for attempt in 1..=MAX_RECEIPT_POLLS {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            debug!("Receipt for {:?} not available yet (poll {})", tx_hash, attempt);
            tokio::time::sleep(self.poll_interval).await;
        }
        anyhow::bail!(
            "Transaction {:?} not mined after {} polls",
            tx_hash,
            MAX_RECEIPT_POLLS
        )
    }
}

/// Build the `eth_sendTransaction` request object.
fn transaction_request(tx: &ResolvedTransaction) -> Value {
    let mut request = Map::new();
    request.insert("from".into(), json!(format!("0x{:x}", tx.from)));
    if let Some(to) = tx.to {
        request.insert("to".into(), json!(format!("0x{:x}", to)));
    }
    request.insert("value".into(), json!(format!("0x{:x}", tx.value)));
    request.insert("data".into(), json!(format!("0x{}", hex::encode(&tx.data))));
    Value::Object(request)
}

#[async_trait]
impl RecorderApi for RpcClient {
    async fn accounts(&self) -> Result<Vec<Address>> {
        self.get_accounts().await
    }

    async fn execute(&self, tx: &ResolvedTransaction) -> Result<ExecutionOutcome> {
        let tx_hash = self
            .send_transaction(tx)
            .await
            .with_context(|| format!("Failed to send transaction {}", tx.timestamp))?;
        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.is_success() {
            anyhow::bail!("Transaction {:?} reverted", receipt.transaction_hash);
        }
        Ok(ExecutionOutcome::Network {
            transaction_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes, U256};

    #[test]
    fn test_transaction_request_shape() {
        let tx = ResolvedTransaction {
            timestamp: 1,
            from: address!("0742d35cc6634c0532925a3b844bc9e7595f0beb"),
            to: None,
            value: U256::from(255u64),
            data: Bytes::from(vec![0x60, 0x80]),
            name: None,
            contract_name: None,
        };
        let request = transaction_request(&tx);
        assert_eq!(request["from"], "0x0742d35cc6634c0532925a3b844bc9e7595f0beb");
        assert!(request.get("to").is_none());
        assert_eq!(request["value"], "0xff");
        assert_eq!(request["data"], "0x6080");

        let call = ResolvedTransaction {
            to: Some(address!("00000000000000000000000000000000000000aa")),
            ..tx
        };
        assert_eq!(
            transaction_request(&call)["to"],
            "0x00000000000000000000000000000000000000aa"
        );
    }
}
