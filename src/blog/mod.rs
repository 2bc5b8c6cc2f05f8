//! Blog and comment screens
//!
//! Post creation goes through one [`PostPublisher`] interface with a REST
//! and a chain-backed variant, picked by [`PublishTarget`].

pub mod publisher;
pub mod service;

pub use publisher::{ChainPublisher, PostPublisher, PublishTarget, Published, RestPublisher};
pub use service::{BlogService, PostView, MIN_TIP_WEI};
