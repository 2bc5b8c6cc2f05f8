use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use super::state::{SessionPhase, WalletSession};
use crate::api::{ApiClient, GameRecord, RecordGameRequest, WalletProfile};
use crate::error::FolioError;
use crate::notify::Notifier;
use crate::provider::{AccountSubscription, WalletProvider};
use crate::Result;

/// Outcome of one account-change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    /// Provider reported no accounts; the session was cleared
    Disconnected,
    /// Primary account changed and was re-registered with the backend
    Switched(String),
    /// Same primary account as before
    Unchanged,
}

/// Read-only view of the session for display code
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub address: Option<String>,
    pub connected: bool,
    pub has_contract: bool,
    pub profile: Option<WalletProfile>,
}

struct SessionState<C> {
    session: WalletSession<C>,
    profile: Option<WalletProfile>,
    subscription: Option<AccountSubscription>,
    /// Bumped whenever the subscription is replaced or torn down
    generation: u64,
}

impl<C> SessionState<C> {
    fn clear(&mut self) {
        self.session.reset();
        self.profile = None;
        self.subscription = None;
        self.generation += 1;
    }
}

/// Subscription taken out of the state for the length of one wait
///
/// Dropping the lease hands the subscription back unless the session moved
/// on in the meantime, so a cancelled poll never loses the listener.
struct SubscriptionLease<'a, C> {
    state: &'a Mutex<SessionState<C>>,
    generation: u64,
    subscription: Option<AccountSubscription>,
}

impl<C> Drop for SubscriptionLease<'_, C> {
    fn drop(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation && state.subscription.is_none() {
            state.subscription = Some(subscription);
        }
    }
}

/// Clears the in-flight flag when the wallet operation finishes
struct OperationGuard<'a>(&'a AtomicBool);

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wallet Session Manager - owns the connection and the cached profile
///
/// All mutation of the session goes through here; views read snapshots.
/// `connect` and `disconnect` share one in-flight guard, so a second call
/// while one is pending fails with `OperationPending` instead of racing.
pub struct WalletSessionManager<P: WalletProvider> {
    provider: Option<P>,
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState<P::Contract>>,
    in_flight: AtomicBool,
    teardown: Notify,
}

impl<P: WalletProvider> WalletSessionManager<P> {
    // ============================================================================
    // Constructor
    // ============================================================================

    /// `provider` is `None` when no wallet is available in this environment
    pub fn new(provider: Option<P>, api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            provider,
            api,
            notifier,
            state: Mutex::new(SessionState {
                session: WalletSession::default(),
                profile: None,
                subscription: None,
                generation: 0,
            }),
            in_flight: AtomicBool::new(false),
            teardown: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState<P::Contract>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_operation(&self) -> Result<OperationGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FolioError::OperationPending)?;
        Ok(OperationGuard(&self.in_flight))
    }

    fn report(&self, context: &str, err: &FolioError) {
        log::error!("{}: {}", context, err);
        self.notifier.notify(&format!("{}: {}", context, err));
    }

    // ============================================================================
    // Readers
    // ============================================================================

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn address(&self) -> Option<String> {
        self.state().session.address().map(str::to_string)
    }

    pub fn is_connected(&self) -> bool {
        self.state().session.is_connected()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().session.phase()
    }

    pub fn profile(&self) -> Option<WalletProfile> {
        self.state().profile.clone()
    }

    pub fn contract(&self) -> Option<Arc<P::Contract>> {
        self.state().session.contract()
    }

    pub fn has_subscription(&self) -> bool {
        self.state().subscription.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            phase: state.session.phase(),
            address: state.session.address().map(str::to_string),
            connected: state.session.is_connected(),
            has_contract: state.session.contract().is_some(),
            profile: state.profile.clone(),
        }
    }

    // ============================================================================
    // Connection lifecycle
    // ============================================================================

    /// Authorize with the provider and register the connection
    ///
    /// Returns the connected address. A failed backend upsert is reported
    /// but leaves the wallet connected.
    pub async fn connect(&self) -> Result<String> {
        let Some(provider) = self.provider.as_ref() else {
            self.notifier
                .notify("Please install a wallet provider to connect your wallet!");
            return Err(FolioError::ProviderUnavailable);
        };
        let _guard = self.begin_operation()?;

        self.state().session.begin_connect();
        log::info!("Connecting wallet...");

        let accounts = match provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.state().session.abort_connect();
                self.report("Error connecting wallet", &e);
                return Err(e);
            }
        };
        let Some(address) = accounts.into_iter().next() else {
            self.state().session.abort_connect();
            let err = FolioError::Provider("wallet returned no accounts".to_string());
            self.report("Error connecting wallet", &err);
            return Err(err);
        };

        let contract = provider.contract(&address).map(Arc::new);
        if contract.is_none() {
            log::info!("No blog contract configured, on-chain features disabled");
        }
        let subscription = provider.subscribe_accounts();

        {
            let mut state = self.state();
            state.session.establish(address.clone(), contract);
            state.profile = None;
            // replacing the handle drops any listener from a previous connect
            state.subscription = Some(subscription);
            state.generation += 1;
        }
        self.teardown.notify_waiters();
        log::info!("🔗 Wallet connected: {}", address);

        self.record_connection(&address).await;
        Ok(address)
    }

    /// Clear the session and stop listening for account changes
    ///
    /// Idempotent: disconnecting a disconnected session is a no-op.
    pub fn disconnect(&self) -> Result<()> {
        let _guard = self.begin_operation()?;
        self.clear_session();
        Ok(())
    }

    fn clear_session(&self) {
        let was_connected = {
            let mut state = self.state();
            let was_connected = state.session.is_connected();
            state.clear();
            was_connected
        };
        self.teardown.notify_waiters();
        if was_connected {
            log::info!("Wallet disconnected");
        }
    }

    /// Upsert the connection record, caching the profile if still relevant
    async fn record_connection(&self, address: &str) -> Option<WalletProfile> {
        match self.api.connect_wallet(address).await {
            Ok(profile) => {
                let mut state = self.state();
                if state.session.is_current(address) {
                    state.profile = Some(profile.clone());
                }
                Some(profile)
            }
            Err(e) => {
                self.report("Error recording wallet connection", &e);
                None
            }
        }
    }

    // ============================================================================
    // Account changes
    // ============================================================================

    /// Wait for the next account-change notification and apply it
    ///
    /// Returns `None` when there is no active subscription, when it is torn
    /// down while waiting (disconnect or reconnect), or when the provider
    /// stops sending.
    pub async fn poll_account_change(&self) -> Option<AccountEvent> {
        let teardown = self.teardown.notified();
        tokio::pin!(teardown);
        teardown.as_mut().enable();

        let mut lease = {
            let mut state = self.state();
            SubscriptionLease {
                state: &self.state,
                generation: state.generation,
                subscription: Some(state.subscription.take()?),
            }
        };
        let generation = lease.generation;

        let accounts = {
            let subscription = lease.subscription.as_mut()?;
            tokio::select! {
                accounts = subscription.next() => accounts,
                _ = &mut teardown => return None,
            }
        };

        let Some(accounts) = accounts else {
            log::warn!("Wallet provider closed the account stream");
            lease.subscription = None;
            return None;
        };
        drop(lease);

        self.apply_accounts(generation, accounts).await
    }

    /// Apply an account list delivered under `generation`
    ///
    /// The generation is checked under the same lock that mutates the
    /// session, so an event that raced a disconnect or reconnect is dropped.
    async fn apply_accounts(&self, generation: u64, accounts: Vec<String>) -> Option<AccountEvent> {
        let Some(new_address) = accounts.into_iter().next() else {
            {
                let mut state = self.state();
                if state.generation != generation {
                    return None;
                }
                state.clear();
            }
            self.teardown.notify_waiters();
            log::info!("Wallet reported no accounts, disconnected");
            return Some(AccountEvent::Disconnected);
        };

        {
            let mut state = self.state();
            if state.generation != generation {
                return None;
            }
            if state.session.is_current(&new_address) {
                return Some(AccountEvent::Unchanged);
            }
            let contract = self
                .provider
                .as_ref()
                .and_then(|provider| provider.contract(&new_address))
                .map(Arc::new);
            state.session.establish(new_address.clone(), contract);
            state.profile = None;
        }
        log::info!("🔁 Wallet account switched to {}", new_address);

        self.record_connection(&new_address).await;
        Some(AccountEvent::Switched(new_address))
    }

    // ============================================================================
    // Profile
    // ============================================================================

    /// Fetch a wallet profile; on failure the cache is left as it was
    pub async fn fetch_profile(&self, address: &str) -> Result<WalletProfile> {
        match self.api.get_wallet(address).await {
            Ok(profile) => {
                let mut state = self.state();
                if state.session.is_current(address) {
                    state.profile = Some(profile.clone());
                }
                Ok(profile)
            }
            Err(e) => {
                self.report("Error fetching wallet details", &e);
                Err(e)
            }
        }
    }

    /// Set the nickname for `address`; blank nicknames never reach the backend
    pub async fn update_nickname(&self, address: &str, nickname: &str) -> Result<WalletProfile> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(FolioError::validation("Nickname cannot be empty"));
        }

        match self.api.update_nickname(address, nickname).await {
            Ok(profile) => {
                let mut state = self.state();
                if state.session.is_current(address) {
                    state.profile = Some(profile.clone());
                }
                log::info!("Nickname for {} set to '{}'", address, nickname);
                Ok(profile)
            }
            Err(e) => {
                self.report("Error updating wallet nickname", &e);
                Err(e)
            }
        }
    }

    /// Record a finished game for the connected wallet
    ///
    /// Without a connected wallet this returns `Ok(None)` and sends nothing.
    /// Otherwise the profile is re-fetched after the attempt whatever its
    /// outcome, so history and high scores reflect the backend.
    pub async fn record_game_score(
        &self,
        game_id: u64,
        score: u64,
        extra: Value,
    ) -> Result<Option<GameRecord>> {
        let Some(address) = self.address() else {
            log::debug!("No wallet connected, score {} not recorded", score);
            return Ok(None);
        };

        let request = RecordGameRequest {
            wallet_address: address.clone(),
            game_id,
            score,
            data: if extra.is_null() {
                Value::Object(Default::default())
            } else {
                extra
            },
        };

        let result = self.api.record_game(&request).await;
        if let Err(ref e) = result {
            self.report("Error recording game score", e);
        }

        // fetch_profile reports its own failure
        let _ = self.fetch_profile(&address).await;

        result.map(Some)
    }
}
