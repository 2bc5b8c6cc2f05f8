//! Post publishing
//!
//! REST-created posts and chain-created posts are separate records with no
//! shared identity; nothing here tries to reconcile them.

use std::sync::Arc;

use crate::api::{ApiClient, BlogPost, PostDraft};
use crate::provider::{BlogContract, TxReceipt};
use crate::Result;

/// Where a new post should be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishTarget {
    #[default]
    Rest,
    Chain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Rest(BlogPost),
    Chain(TxReceipt),
}

#[allow(async_fn_in_trait)]
pub trait PostPublisher {
    async fn publish(&self, draft: &PostDraft) -> Result<Published>;
}

pub struct RestPublisher<'a> {
    api: &'a ApiClient,
}

impl<'a> RestPublisher<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }
}

impl PostPublisher for RestPublisher<'_> {
    async fn publish(&self, draft: &PostDraft) -> Result<Published> {
        let post = self.api.create_post(draft).await?;
        log::info!("Post {} created on backend", post.id);
        Ok(Published::Rest(post))
    }
}

/// Writes the post through the blog contract and waits for confirmation
pub struct ChainPublisher<C: BlogContract> {
    contract: Arc<C>,
}

impl<C: BlogContract> ChainPublisher<C> {
    pub fn new(contract: Arc<C>) -> Self {
        Self { contract }
    }
}

impl<C: BlogContract> PostPublisher for ChainPublisher<C> {
    async fn publish(&self, draft: &PostDraft) -> Result<Published> {
        // featured images have no on-chain representation
        if draft.featured_image.is_some() {
            log::debug!("Dropping featured image for on-chain post");
        }
        let pending = self.contract.create_post(&draft.title, &draft.content).await?;
        let receipt = self.contract.wait_for_confirmation(&pending).await?;
        log::info!("Post created on chain in tx {}", receipt.hash);
        Ok(Published::Chain(receipt))
    }
}
