/// Client configuration from environment variables
///
/// Controls the REST backend endpoint, the optional wallet RPC endpoint
/// and the click game timing. Defaults target a local development backend.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_GAME_NAME: &str = "Click Game";
pub const DEFAULT_GAME_DURATION: u32 = 10;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// REST backend base URL (without the `/api` prefix)
    pub api_url: String,
    /// Wallet JSON-RPC endpoint; `None` means no wallet provider is present
    pub wallet_rpc_url: Option<String>,
    /// Deployed blog contract address (required for on-chain posting)
    pub contract_address: Option<String>,
    /// Directory for persisted client storage (token, preferences)
    pub data_dir: PathBuf,
    /// Name of the game looked up through `/api/games?name=`
    pub game_name: String,
    /// Number of time units a game session lasts
    pub game_duration: u32,
    /// Length of one game time unit
    pub game_tick: Duration,
    /// How often the RPC provider polls for account changes
    pub account_poll_interval: Duration,
    /// Receipt polls before a transaction is considered unconfirmed
    pub tx_confirm_attempts: u32,
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `FOLIO_API_URL`: REST backend (default `http://localhost:8000`)
    /// - `WALLET_RPC_URL`: wallet JSON-RPC endpoint (optional)
    /// - `BLOG_CONTRACT_ADDRESS`: blog contract address (optional)
    /// - `FOLIO_DATA_DIR`: client storage directory (default `./.folio`)
    /// - `GAME_NAME`, `GAME_DURATION`, `GAME_TICK_MS`
    /// - `ACCOUNT_POLL_MS`, `TX_CONFIRM_ATTEMPTS`
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Local backend, no wallet
    /// folio posts
    ///
    /// # Local Hardhat node as the wallet
    /// WALLET_RPC_URL=http://localhost:8545 BLOG_CONTRACT_ADDRESS=0x5FbDB... folio connect
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = env::var("FOLIO_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        log::info!("📡 API URL: {}", api_url);

        let wallet_rpc_url = env::var("WALLET_RPC_URL").ok().filter(|s| !s.is_empty());
        match wallet_rpc_url {
            Some(ref url) => log::info!("🔗 Wallet RPC URL: {}", url),
            None => log::info!("No WALLET_RPC_URL set, wallet features disabled"),
        }

        let contract_address = env::var("BLOG_CONTRACT_ADDRESS")
            .ok()
            .filter(|s| !s.is_empty());

        let data_dir = env::var("FOLIO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let game_name = env::var("GAME_NAME").unwrap_or(defaults.game_name);

        Self {
            api_url,
            wallet_rpc_url,
            contract_address,
            data_dir,
            game_name,
            game_duration: parse_env("GAME_DURATION", defaults.game_duration),
            game_tick: Duration::from_millis(parse_env("GAME_TICK_MS", 1000)),
            account_poll_interval: Duration::from_millis(parse_env("ACCOUNT_POLL_MS", 1000)),
            tx_confirm_attempts: parse_env("TX_CONFIRM_ATTEMPTS", defaults.tx_confirm_attempts),
        }
    }

    /// Full URL for an `/api/...` path
    pub fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("⚠️  Invalid {} '{}', using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            wallet_rpc_url: None,
            contract_address: None,
            data_dir: PathBuf::from("./.folio"),
            game_name: DEFAULT_GAME_NAME.to_string(),
            game_duration: DEFAULT_GAME_DURATION,
            game_tick: Duration::from_secs(1),
            account_poll_interval: Duration::from_secs(1),
            tx_confirm_attempts: 30,
        }
    }
}
