// REST backend integration
// Typed client for posts, comments, auth, wallets and game history

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;
