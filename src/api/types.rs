// REST request/response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author: User,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl BlogPost {
    /// First 100 characters of the content, as shown in the post list
    pub fn excerpt(&self) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Body for creating or updating a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub featured_image: Option<String>,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            featured_image: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(alias = "key", alias = "access")]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One played game as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: u64,
    pub wallet: u64,
    pub game: u64,
    #[serde(default)]
    pub game_name: String,
    pub score: u64,
    pub played_at: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub record: GameRecord,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub wallet_nickname: Option<String>,
}

impl LeaderboardEntry {
    /// Nickname if set, otherwise the shortened address
    pub fn display_name(&self) -> String {
        if let Some(nickname) = self.wallet_nickname.as_deref().filter(|n| !n.is_empty()) {
            return nickname.to_string();
        }
        match &self.wallet_address {
            Some(address) => short_address(address),
            None => format!("Wallet #{}", self.record.wallet),
        }
    }
}

/// Backend record of a wallet address
///
/// The connect and nickname endpoints return the summary form, without
/// history or statistics; those fields then stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletProfile {
    pub id: u64,
    pub address: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub first_connection: DateTime<Utc>,
    pub last_connection: DateTime<Utc>,
    pub connection_count: u32,
    #[serde(default)]
    pub total_games_played: u32,
    #[serde(default)]
    pub high_scores: BTreeMap<String, u64>,
    #[serde(default)]
    pub game_history: Vec<GameRecord>,
}

impl WalletProfile {
    pub fn high_score(&self, game_name: &str) -> u64 {
        self.high_scores.get(game_name).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectWalletRequest {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNicknameRequest {
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordGameRequest {
    pub wallet_address: String,
    pub game_id: u64,
    pub score: u64,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `0x1234...abcd` form of an address; short inputs are returned unchanged
pub fn short_address(address: &str) -> String {
    if address.len() > 10 && address.is_ascii() {
        format!("{}...{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}
