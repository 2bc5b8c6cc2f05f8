/// Ethereum JSON-RPC node stub
///
/// Answers the handful of methods the folio wallet provider uses. Sent
/// transactions are kept and confirmed immediately (or reverted, on request).
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct NodeInner {
    accounts: Vec<String>,
    legacy: bool,
    revert: bool,
    withhold_receipts: bool,
    sent: Vec<Value>,
    methods: Vec<String>,
}

#[derive(Default)]
pub struct NodeStub {
    inner: Mutex<NodeInner>,
}

impl NodeStub {
    pub fn new(accounts: &[&str]) -> Self {
        let stub = Self::default();
        stub.set_accounts(accounts);
        stub
    }

    fn lock(&self) -> MutexGuard<'_, NodeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        self.lock().accounts = accounts.iter().map(|a| a.to_string()).collect();
    }

    /// Reject `eth_requestAccounts` with "method not found", like older nodes
    pub fn set_legacy(&self, legacy: bool) {
        self.lock().legacy = legacy;
    }

    pub fn set_revert(&self, revert: bool) {
        self.lock().revert = revert;
    }

    /// Keep answering `null` for receipts, as for a transaction never mined
    pub fn set_withhold_receipts(&self, withhold: bool) {
        self.lock().withhold_receipts = withhold;
    }

    /// Transaction objects received through `eth_sendTransaction`
    pub fn sent(&self) -> Vec<Value> {
        self.lock().sent.clone()
    }

    /// Every method called, in order
    pub fn methods(&self) -> Vec<String> {
        self.lock().methods.clone()
    }

    fn handle(&self, method: &str, params: &Value) -> Result<Value, (i64, String)> {
        let mut inner = self.lock();
        inner.methods.push(method.to_string());

        match method {
            "eth_requestAccounts" if inner.legacy => {
                Err((-32601, "Method eth_requestAccounts not found".to_string()))
            }
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(inner.accounts)),
            "eth_sendTransaction" => {
                let tx = params.get(0).cloned().unwrap_or(Value::Null);
                inner.sent.push(tx);
                Ok(json!(format!("0x{:064x}", inner.sent.len())))
            }
            "eth_getTransactionReceipt" => {
                if inner.withhold_receipts {
                    return Ok(Value::Null);
                }
                let hash = params.get(0).cloned().unwrap_or(Value::Null);
                let status = if inner.revert { "0x0" } else { "0x1" };
                Ok(json!({
                    "transactionHash": hash,
                    "blockNumber": format!("{:#x}", 0x10 + inner.sent.len()),
                    "status": status,
                }))
            }
            other => Err((-32601, format!("Method {} not found", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

async fn rpc(State(node): State<Arc<NodeStub>>, Json(req): Json<RpcRequest>) -> Json<Value> {
    log::debug!("node stub: {}", req.method);
    let body = match node.handle(&req.method, &req.params) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": req.id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": req.id,
            "error": { "code": code, "message": message },
        }),
    };
    Json(body)
}

pub fn create_node_router(node: Arc<NodeStub>) -> Router {
    Router::new().route("/", post(rpc)).with_state(node)
}

/// Serve a node stub on an ephemeral localhost port
pub async fn spawn_node(accounts: &[&str]) -> anyhow::Result<(SocketAddr, Arc<NodeStub>)> {
    let node = Arc::new(NodeStub::new(accounts));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_node_router(node.clone());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Node stub stopped: {}", e);
        }
    });

    Ok((addr, node))
}
