/// Backend API response and request types
///
/// Field names match what the folio client deserializes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: u64,
    pub author: UserResponse,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: UserResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub featured_image: Option<String>,
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResponse {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecordResponse {
    pub id: u64,
    pub wallet: u64,
    pub game: u64,
    pub game_name: String,
    pub score: u64,
    pub played_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(flatten)]
    pub record: GameRecordResponse,
    pub wallet_address: String,
    pub wallet_nickname: Option<String>,
}

/// Summary form returned by connect and update_nickname
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub id: u64,
    pub address: String,
    pub nickname: Option<String>,
    pub first_connection: DateTime<Utc>,
    pub last_connection: DateTime<Utc>,
    pub connection_count: u32,
}

/// Detail form returned by GET /api/wallets/{address}/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletDetailResponse {
    #[serde(flatten)]
    pub wallet: WalletResponse,
    pub total_games_played: u32,
    pub high_scores: BTreeMap<String, u64>,
    pub game_history: Vec<GameRecordResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordGameRequest {
    pub wallet_address: String,
    pub game_id: u64,
    pub score: u64,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GameQuery {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub game_id: Option<u64>,
}
