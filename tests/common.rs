//! Common test utilities for folio client integration tests
//!
//! Shared infrastructure: a mock REST backend on an ephemeral port (one per
//! test), a scripted wallet provider with a recording blog contract, and a
//! notifier that keeps every message for assertions.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use folio_client::provider::AccountSender;
use folio_client::{
    AccountSubscription, ApiClient, BlogContract, ClientConfig, ClientStorage, FolioError,
    Notifier, PendingTx, TxReceipt, WalletProvider, WalletSessionManager,
};
use folio_mock::MockStore;
use tempfile::TempDir;

pub const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
pub const BOB: &str = "0xb0b0000000000000000000000000000000000002";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

// ============================================================================
// Wallet provider
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    CreatePost { account: String, title: String, content: String },
    TipPost { account: String, post_id: u64, value_wei: u128 },
    Confirm(String),
}

#[derive(Default)]
struct ProviderState {
    accounts: Mutex<Vec<String>>,
    reject: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    senders: Mutex<Vec<AccountSender>>,
    subscriptions: AtomicUsize,
    calls: Arc<Mutex<Vec<ContractCall>>>,
}

/// Wallet provider whose accounts and account-change events are scripted
///
/// Clones share state, so a test keeps one handle after giving the other to
/// the session manager.
#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<ProviderState>,
    with_contract: bool,
}

impl FakeProvider {
    pub fn new(accounts: &[&str]) -> Self {
        let provider = Self {
            state: Arc::default(),
            with_contract: true,
        };
        provider.set_accounts(accounts);
        provider
    }

    /// Provider for a chain with no blog contract deployed
    pub fn without_contract(accounts: &[&str]) -> Self {
        Self {
            with_contract: false,
            ..Self::new(accounts)
        }
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        *self.state.accounts.lock().unwrap() = accounts.iter().map(|a| a.to_string()).collect();
    }

    /// Make `request_accounts` fail, as when the user declines
    pub fn reject_with(&self, message: &str) {
        *self.state.reject.lock().unwrap() = Some(message.to_string());
    }

    pub fn delay_requests(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    /// Push an account list to the newest subscription; false if nobody listens
    pub fn emit(&self, accounts: &[&str]) -> bool {
        let senders = self.state.senders.lock().unwrap();
        match senders.last() {
            Some(sender) => sender
                .send(accounts.iter().map(|a| a.to_string()).collect())
                .is_ok(),
            None => false,
        }
    }

    pub fn subscriptions(&self) -> usize {
        self.state.subscriptions.load(Ordering::SeqCst)
    }

    /// Subscriptions whose receiving end is still alive
    pub fn live_subscriptions(&self) -> usize {
        self.state
            .senders
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }

    pub fn contract_calls(&self) -> Vec<ContractCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

impl WalletProvider for FakeProvider {
    type Contract = FakeContract;

    async fn request_accounts(&self) -> folio_client::Result<Vec<String>> {
        let delay = *self.state.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.state.reject.lock().unwrap().clone() {
            return Err(FolioError::Provider(message));
        }
        Ok(self.state.accounts.lock().unwrap().clone())
    }

    fn contract(&self, account: &str) -> Option<FakeContract> {
        self.with_contract.then(|| FakeContract {
            account: account.to_string(),
            calls: self.state.calls.clone(),
            next_tx: Arc::default(),
        })
    }

    fn subscribe_accounts(&self) -> AccountSubscription {
        let (sender, subscription) = AccountSubscription::channel();
        self.state.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.state.senders.lock().unwrap().push(sender);
        subscription
    }
}

/// Blog contract that records calls and confirms immediately
pub struct FakeContract {
    account: String,
    calls: Arc<Mutex<Vec<ContractCall>>>,
    next_tx: Arc<AtomicUsize>,
}

impl FakeContract {
    fn pending(&self) -> PendingTx {
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        PendingTx {
            hash: format!("0x{:064x}", n),
        }
    }
}

impl BlogContract for FakeContract {
    async fn create_post(&self, title: &str, content: &str) -> folio_client::Result<PendingTx> {
        self.calls.lock().unwrap().push(ContractCall::CreatePost {
            account: self.account.clone(),
            title: title.to_string(),
            content: content.to_string(),
        });
        Ok(self.pending())
    }

    async fn tip_post(&self, post_id: u64, value_wei: u128) -> folio_client::Result<PendingTx> {
        self.calls.lock().unwrap().push(ContractCall::TipPost {
            account: self.account.clone(),
            post_id,
            value_wei,
        });
        Ok(self.pending())
    }

    async fn wait_for_confirmation(&self, tx: &PendingTx) -> folio_client::Result<TxReceipt> {
        self.calls
            .lock()
            .unwrap()
            .push(ContractCall::Confirm(tx.hash.clone()));
        Ok(TxReceipt {
            hash: tx.hash.clone(),
            block_number: Some(1),
        })
    }
}

// ============================================================================
// Test environment
// ============================================================================

/// Mock backend plus a client configuration pointing at it
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub store: Arc<MockStore>,
    pub config: ClientConfig,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestEnv {
    pub async fn new() -> anyhow::Result<Self> {
        init_logging();

        let temp_dir = TempDir::new()?;
        let (addr, store) = folio_mock::spawn().await?;

        let config = ClientConfig {
            api_url: format!("http://{}", addr),
            data_dir: temp_dir.path().to_path_buf(),
            game_tick: Duration::from_millis(10),
            ..ClientConfig::default()
        };

        Ok(Self {
            temp_dir,
            store,
            config,
            notifier: Arc::new(RecordingNotifier::default()),
        })
    }

    pub fn storage(&self) -> ClientStorage {
        ClientStorage::new(self.config.data_dir.clone())
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.config, self.storage())
    }

    pub fn manager(&self, provider: Option<FakeProvider>) -> WalletSessionManager<FakeProvider> {
        WalletSessionManager::new(provider, self.api(), self.notifier.clone())
    }

    /// Log in as the seeded user so authenticated writes succeed
    pub async fn login(&self) -> anyhow::Result<()> {
        self.api()
            .login(&folio_client::api::Credentials {
                username: folio_mock::SEED_USERNAME.to_string(),
                password: folio_mock::SEED_PASSWORD.to_string(),
            })
            .await?;
        Ok(())
    }
}
