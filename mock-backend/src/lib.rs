/// Folio Mock Backend Library
///
/// In-memory stand-in for the blog/wallet/game REST backend, usable as a
/// standalone binary or spawned inside integration tests, plus a JSON-RPC
/// node stub for the wallet provider.
pub mod handlers;
pub mod node;
pub mod server;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use node::{spawn_node, NodeStub};
pub use server::{create_router, run_server, spawn};
pub use store::{routes, MockStore, SEED_GAME, SEED_PASSWORD, SEED_USERNAME};
