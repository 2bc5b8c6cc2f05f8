//! Folio: blog and portfolio client with wallet connect
//!
//! This crate is the client side of a personal blog/portfolio site. Posts
//! and comments live on a REST backend; a connected wallet records its
//! visits and nickname there, can publish posts and tips through the blog
//! contract, and keeps per-wallet scores for a small click game.
//!
//! # Architecture
//!
//! - **Wallet Session Manager**: connection state, provider calls, cached wallet profile
//! - **Game Session Loop**: countdown timer, score counter, score submission
//! - **Blog Service**: post/comment CRUD with an optional on-chain path
//! - **API Client**: typed REST client with bearer-token auth
//!
//! # Example
//!
//! ```ignore
//! use folio_client::{ApiClient, ClientConfig, ClientStorage, LogNotifier};
//! use folio_client::{RpcWalletProvider, WalletSessionManager};
//! use std::sync::Arc;
//!
//! let config = ClientConfig::from_env();
//! let api = ApiClient::new(&config, ClientStorage::new(config.data_dir.clone()));
//! let provider = RpcWalletProvider::from_config(&config);
//! let manager = WalletSessionManager::new(provider, api, Arc::new(LogNotifier));
//!
//! let address = manager.connect().await?;
//! manager.update_nickname(&address, "Alice").await?;
//! ```

// Public modules
pub mod api;
pub mod blog;
pub mod config;
pub mod error;
pub mod game;
pub mod notify;
pub mod provider;
pub mod session;
pub mod storage;

// Re-exports for convenience
pub use api::{ApiClient, BlogPost, Comment, Game, GameRecord, LeaderboardEntry, PostDraft, WalletProfile};
pub use blog::{BlogService, PostView, PublishTarget, Published};
pub use config::ClientConfig;
pub use error::{FolioError, StorageError};
pub use game::{GameInput, GameResult, GameRunner, GameSession, SaveStatus};
pub use notify::{ConsoleNotifier, LogNotifier, Notifier};
pub use provider::{AccountSubscription, BlogContract, PendingTx, RpcWalletProvider, TxReceipt, WalletProvider};
pub use session::{AccountEvent, SessionPhase, SessionSnapshot, WalletSessionManager};
pub use storage::{ClientStorage, Preferences};

// Common result type
pub type Result<T> = std::result::Result<T, FolioError>;
