use super::publisher::{ChainPublisher, PostPublisher, PublishTarget, Published, RestPublisher};
use crate::api::{BlogPost, Comment, NewComment, PostDraft};
use crate::error::FolioError;
use crate::provider::abi::parse_ether;
use crate::provider::{BlogContract, TxReceipt, WalletProvider};
use crate::session::WalletSessionManager;
use crate::Result;

/// Smallest tip accepted, 0.001 ETH
pub const MIN_TIP_WEI: u128 = 1_000_000_000_000_000;

/// A post opened for reading, with its comment thread
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: BlogPost,
}

impl PostView {
    pub fn comments(&self) -> &[Comment] {
        &self.post.comments
    }

    /// Edit/delete are offered only to the author
    pub fn can_edit(&self, account: Option<&str>) -> bool {
        account.is_some_and(|account| self.post.author.username == account)
    }
}

/// Blog screens: list, read, write, comment, tip
///
/// Failures are logged and pushed to the session's notifier before being
/// returned, so callers only decide what to show next.
pub struct BlogService<'a, P: WalletProvider> {
    manager: &'a WalletSessionManager<P>,
}

impl<'a, P: WalletProvider> BlogService<'a, P> {
    pub fn new(manager: &'a WalletSessionManager<P>) -> Self {
        Self { manager }
    }

    fn report<T>(&self, context: &str, result: Result<T>) -> Result<T> {
        if let Err(ref e) = result {
            log::error!("{}: {}", context, e);
            self.manager
                .notifier()
                .notify(&format!("{}. Please try again.", context));
        }
        result
    }

    fn check_draft(&self, draft: &PostDraft) -> Result<()> {
        if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
            self.manager
                .notifier()
                .notify("Please fill in all required fields");
            return Err(FolioError::validation("Title and content are required"));
        }
        Ok(())
    }

    pub async fn list_posts(&self) -> Result<Vec<BlogPost>> {
        let result = self.manager.api().list_posts().await;
        self.report("Failed to load posts", result)
    }

    pub async fn open_post(&self, id: u64) -> Result<PostView> {
        let result = self.manager.api().get_post(id).await;
        self.report("Failed to load post details", result)
            .map(|post| PostView { post })
    }

    /// Create a post on the backend or on chain
    pub async fn create_post(&self, draft: &PostDraft, target: PublishTarget) -> Result<Published> {
        self.check_draft(draft)?;

        let result = match target {
            PublishTarget::Rest => RestPublisher::new(self.manager.api()).publish(draft).await,
            PublishTarget::Chain => match self.manager.contract() {
                Some(contract) => ChainPublisher::new(contract).publish(draft).await,
                None => {
                    self.manager
                        .notifier()
                        .notify("Please connect your wallet first");
                    return Err(FolioError::NotConnected);
                }
            },
        };
        self.report("Failed to create post", result)
    }

    pub async fn update_post(&self, id: u64, draft: &PostDraft) -> Result<BlogPost> {
        self.check_draft(draft)?;
        let result = self.manager.api().update_post(id, draft).await;
        self.report("Failed to update post", result)
    }

    pub async fn delete_post(&self, id: u64) -> Result<()> {
        let result = self.manager.api().delete_post(id).await;
        self.report("Failed to delete post", result)
    }

    /// Post a comment and append the server's copy to the open thread
    pub async fn add_comment(&self, view: &mut PostView, content: &str) -> Result<Comment> {
        if content.trim().is_empty() {
            return Err(FolioError::validation("Comment cannot be empty"));
        }
        let body = NewComment {
            content: content.to_string(),
        };
        let result = self.manager.api().add_comment(view.post.id, &body).await;
        let comment = self.report("Failed to add comment", result)?;
        view.post.comments.push(comment.clone());
        Ok(comment)
    }

    pub async fn delete_comment(&self, view: &mut PostView, comment_id: u64) -> Result<()> {
        let result = self.manager.api().delete_comment(comment_id).await;
        self.report("Failed to delete comment", result)?;
        view.post.comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    /// Tip a post's author through the blog contract
    pub async fn tip_post(&self, post_id: u64, amount_eth: &str) -> Result<TxReceipt> {
        let Some(contract) = self.manager.contract() else {
            self.manager
                .notifier()
                .notify("Please connect your wallet first");
            return Err(FolioError::NotConnected);
        };

        let value_wei = parse_ether(amount_eth)?;
        if value_wei < MIN_TIP_WEI {
            return Err(FolioError::validation("Minimum tip is 0.001 ETH"));
        }

        let result = async {
            let pending = contract.tip_post(post_id, value_wei).await?;
            contract.wait_for_confirmation(&pending).await
        }
        .await;
        let receipt = self.report("Failed to send tip", result)?;

        log::info!("Thank you for your tip of {} ETH!", amount_eth.trim());
        Ok(receipt)
    }
}
