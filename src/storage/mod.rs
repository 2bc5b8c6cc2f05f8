//! Persisted client storage
//!
//! - Bearer token for the REST backend
//! - User preferences (theme)

mod file_system;
mod models;

pub use file_system::ClientStorage;
pub use models::Preferences;
