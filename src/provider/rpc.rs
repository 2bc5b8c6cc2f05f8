use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::abi;
use super::{AccountSubscription, BlogContract, PendingTx, TxReceipt, WalletProvider};
use crate::config::ClientConfig;
use crate::error::FolioError;
use crate::Result;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

/// Delay between receipt polls while waiting for confirmation
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug)]
pub enum RpcCallError {
    /// Transport failure or malformed response
    Transport(String),
    /// Error object returned by the node
    Node { code: i64, message: String },
}

impl std::fmt::Display for RpcCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "RPC transport error: {}", msg),
            Self::Node { code, message } => write!(f, "RPC error {}: {}", code, message),
        }
    }
}

/// Minimal Ethereum JSON-RPC client over HTTP
#[derive(Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<T, RpcCallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        log::debug!("RPC {} (id {})", method, id);

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcCallError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| RpcCallError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(RpcCallError::Node {
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|e| RpcCallError::Transport(format!("{} result: {}", method, e)))
    }

    pub async fn accounts(&self) -> std::result::Result<Vec<String>, RpcCallError> {
        self.call("eth_accounts", json!([])).await
    }
}

/// Wallet provider backed by a node's JSON-RPC endpoint
///
/// The node holds the keys, so `eth_sendTransaction` is the signer. Account
/// changes are detected by polling `eth_accounts`.
#[derive(Clone)]
pub struct RpcWalletProvider {
    rpc: JsonRpcClient,
    contract_address: Option<String>,
    poll_interval: Duration,
    confirm_attempts: u32,
}

impl RpcWalletProvider {
    pub fn new(
        rpc_url: &str,
        contract_address: Option<String>,
        poll_interval: Duration,
        confirm_attempts: u32,
    ) -> Self {
        Self {
            rpc: JsonRpcClient::new(rpc_url),
            contract_address,
            poll_interval,
            confirm_attempts,
        }
    }

    /// Provider from config, `None` when no wallet endpoint is configured
    pub fn from_config(config: &ClientConfig) -> Option<Self> {
        let url = config.wallet_rpc_url.as_deref()?;
        Some(Self::new(
            url,
            config.contract_address.clone(),
            config.account_poll_interval,
            config.tx_confirm_attempts,
        ))
    }
}

impl WalletProvider for RpcWalletProvider {
    type Contract = RpcBlogContract;

    async fn request_accounts(&self) -> Result<Vec<String>> {
        match self
            .rpc
            .call::<Vec<String>>("eth_requestAccounts", json!([]))
            .await
        {
            Ok(accounts) => Ok(accounts),
            Err(RpcCallError::Node { code, .. }) if code == METHOD_NOT_FOUND => {
                log::debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.rpc.accounts().await.map_err(FolioError::provider)
            }
            Err(e) => Err(FolioError::provider(e)),
        }
    }

    fn contract(&self, account: &str) -> Option<RpcBlogContract> {
        let address = self.contract_address.clone()?;
        Some(RpcBlogContract {
            rpc: self.rpc.clone(),
            address,
            from: account.to_string(),
            confirm_attempts: self.confirm_attempts,
        })
    }

    fn subscribe_accounts(&self) -> AccountSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let rpc = self.rpc.clone();
        let interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut last = rpc.accounts().await.unwrap_or_default();
            loop {
                tokio::time::sleep(interval).await;
                match rpc.accounts().await {
                    Ok(accounts) if accounts != last => {
                        log::debug!("Accounts changed: {:?}", accounts);
                        last = accounts.clone();
                        if sender.send(accounts).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("Account poll failed: {}", e),
                }
            }
        });

        AccountSubscription::new(receiver, Some(task))
    }
}

/// Blog contract calls sent from `from` through the node
#[derive(Clone)]
pub struct RpcBlogContract {
    rpc: JsonRpcClient,
    address: String,
    from: String,
    confirm_attempts: u32,
}

impl RpcBlogContract {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn signer(&self) -> &str {
        &self.from
    }

    async fn send_transaction(&self, data: Vec<u8>, value_wei: Option<u128>) -> Result<PendingTx> {
        let mut tx = json!({
            "from": self.from,
            "to": self.address,
            "data": abi::to_hex_data(&data),
        });
        if let Some(value) = value_wei {
            tx["value"] = json!(abi::to_hex_quantity(value));
        }

        let hash: String = self
            .rpc
            .call("eth_sendTransaction", json!([tx]))
            .await
            .map_err(FolioError::contract)?;
        log::info!("Submitted transaction {}", hash);
        Ok(PendingTx { hash })
    }
}

impl BlogContract for RpcBlogContract {
    async fn create_post(&self, title: &str, content: &str) -> Result<PendingTx> {
        self.send_transaction(abi::encode_create_post(title, content), None)
            .await
    }

    async fn tip_post(&self, post_id: u64, value_wei: u128) -> Result<PendingTx> {
        self.send_transaction(abi::encode_tip_post(post_id), Some(value_wei))
            .await
    }

    async fn wait_for_confirmation(&self, tx: &PendingTx) -> Result<TxReceipt> {
        for attempt in 1..=self.confirm_attempts {
            let receipt: Option<Value> = self
                .rpc
                .call("eth_getTransactionReceipt", json!([tx.hash]))
                .await
                .map_err(FolioError::contract)?;

            if let Some(receipt) = receipt {
                let status = receipt.get("status").and_then(Value::as_str);
                if status == Some("0x0") {
                    return Err(FolioError::Contract(format!(
                        "Transaction {} reverted",
                        tx.hash
                    )));
                }
                let block_number = receipt
                    .get("blockNumber")
                    .and_then(Value::as_str)
                    .and_then(|n| u64::from_str_radix(n.trim_start_matches("0x"), 16).ok());
                return Ok(TxReceipt {
                    hash: tx.hash.clone(),
                    block_number,
                });
            }

            if attempt < self.confirm_attempts {
                tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
            }
        }

        Err(FolioError::Contract(format!(
            "Transaction {} not confirmed after {} attempts",
            tx.hash, self.confirm_attempts
        )))
    }
}
