//! Wallet session
//!
//! - Connection state and its invariants
//! - Manager brokering provider calls and the cached wallet profile

mod manager;
mod state;

pub use manager::{AccountEvent, SessionSnapshot, WalletSessionManager};
pub use state::{SessionPhase, WalletSession};
