//! Wallet provider seam
//!
//! A provider authorizes accounts, hands out a blog contract handle bound to
//! the account's signer, and streams account-change notifications. The
//! JSON-RPC implementation talks to a node that manages the keys (a local
//! Hardhat/Anvil node or a signer proxy); tests script their own.

pub mod abi;
pub mod rpc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::Result;

pub use rpc::{JsonRpcClient, RpcBlogContract, RpcWalletProvider};

/// Transaction submitted to the chain but not yet confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: String,
    pub block_number: Option<u64>,
}

#[allow(async_fn_in_trait)]
pub trait WalletProvider: Send + Sync {
    type Contract: BlogContract;

    /// Ask the wallet to authorize this client; first entry is the primary account
    async fn request_accounts(&self) -> Result<Vec<String>>;

    /// Blog contract handle signing as `account`, `None` if no contract is deployed
    fn contract(&self, account: &str) -> Option<Self::Contract>;

    /// Start listening for account changes
    fn subscribe_accounts(&self) -> AccountSubscription;
}

#[allow(async_fn_in_trait)]
pub trait BlogContract: Send + Sync {
    async fn create_post(&self, title: &str, content: &str) -> Result<PendingTx>;

    async fn tip_post(&self, post_id: u64, value_wei: u128) -> Result<PendingTx>;

    async fn wait_for_confirmation(&self, tx: &PendingTx) -> Result<TxReceipt>;
}

/// Live account-change listener
///
/// Owning the handle owns the listener: dropping it (or calling
/// [`AccountSubscription::unsubscribe`]) stops any background poll task, so a
/// reconnect never leaves a stale listener behind.
pub struct AccountSubscription {
    receiver: mpsc::UnboundedReceiver<Vec<String>>,
    task: Option<JoinHandle<()>>,
}

pub type AccountSender = mpsc::UnboundedSender<Vec<String>>;

impl AccountSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<Vec<String>>, task: Option<JoinHandle<()>>) -> Self {
        Self { receiver, task }
    }

    /// Push-driven subscription: whoever holds the sender emits account lists
    pub fn channel() -> (AccountSender, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self::new(receiver, None))
    }

    /// Next account list, `None` once the source has gone away
    pub async fn next(&mut self) -> Option<Vec<String>> {
        self.receiver.recv().await
    }

    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for AccountSubscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_subscription_delivers_in_order() {
        let (sender, mut sub) = AccountSubscription::channel();
        sender.send(vec!["0xa".to_string()]).unwrap();
        sender.send(vec![]).unwrap();

        assert_eq!(sub.next().await, Some(vec!["0xa".to_string()]));
        assert_eq!(sub.next().await, Some(vec![]));

        drop(sender);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_sender_side() {
        let (sender, sub) = AccountSubscription::channel();
        assert!(!sender.is_closed());
        sub.unsubscribe();
        assert!(sender.is_closed());
    }

    #[tokio::test]
    async fn test_drop_aborts_poll_task() {
        let (_sender, receiver) = mpsc::unbounded_channel();
        let marker = std::sync::Arc::new(());
        let held = marker.clone();
        let task = tokio::spawn(async move {
            let _held = held;
            std::future::pending::<()>().await;
        });
        let sub = AccountSubscription::new(receiver, Some(task));
        drop(sub);

        for _ in 0..10 {
            if std::sync::Arc::strong_count(&marker) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(std::sync::Arc::strong_count(&marker), 1);
    }
}
