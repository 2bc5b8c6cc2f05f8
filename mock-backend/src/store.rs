/// In-memory backing store for the mock backend
///
/// Besides the data itself the store keeps a per-route call counter, the
/// last Authorization header it saw, and a set of routes forced to fail, so
/// tests can assert on exactly what the client sent.
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::*;

/// Route keys used for call counting and failure injection
pub mod routes {
    pub const LIST_POSTS: &str = "GET /api/posts/";
    pub const GET_POST: &str = "GET /api/posts/{id}/";
    pub const CREATE_POST: &str = "POST /api/posts/";
    pub const UPDATE_POST: &str = "PUT /api/posts/{id}/";
    pub const DELETE_POST: &str = "DELETE /api/posts/{id}/";
    pub const ADD_COMMENT: &str = "POST /api/posts/{id}/add_comment/";
    pub const DELETE_COMMENT: &str = "DELETE /api/comments/{id}/";
    pub const LOGIN: &str = "POST /api/auth/login/";
    pub const REGISTER: &str = "POST /api/auth/register/";
    pub const CONNECT_WALLET: &str = "POST /api/wallets/connect/";
    pub const GET_WALLET: &str = "GET /api/wallets/{address}/";
    pub const UPDATE_NICKNAME: &str = "POST /api/wallets/{address}/update_nickname/";
    pub const FIND_GAMES: &str = "GET /api/games";
    pub const LEADERBOARD: &str = "GET /api/game-history/leaderboard/";
    pub const RECORD_GAME: &str = "POST /api/game-history/record_game/";
}

pub const SEED_USERNAME: &str = "demo";
pub const SEED_PASSWORD: &str = "demo-password";
pub const SEED_GAME: &str = "Click Game";

const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone)]
struct UserRow {
    user: UserResponse,
    password: String,
}

#[derive(Debug, Clone)]
struct PostRow {
    id: u64,
    title: String,
    content: String,
    author: u64,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
    featured_image: Option<String>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    comment: CommentResponse,
    post: u64,
}

/// Why a store operation was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Forbidden,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Default)]
struct Inner {
    users: Vec<UserRow>,
    tokens: HashMap<String, u64>,
    posts: Vec<PostRow>,
    comments: Vec<CommentRow>,
    wallets: Vec<WalletResponse>,
    games: Vec<GameResponse>,
    history: Vec<GameRecordResponse>,
    next_id: u64,
    calls: HashMap<String, u32>,
    failing: HashSet<String>,
    last_authorization: Option<String>,
}

impl Inner {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: u64) -> Option<&UserResponse> {
        self.users.iter().find(|u| u.user.id == id).map(|u| &u.user)
    }

    fn wallet_index(&self, address: &str) -> Option<usize> {
        self.wallets
            .iter()
            .position(|w| w.address.eq_ignore_ascii_case(address))
    }

    fn post_response(&self, row: &PostRow) -> StoreResult<PostResponse> {
        let author = self
            .user(row.author)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Author {} missing", row.author)))?;
        let comments = self
            .comments
            .iter()
            .filter(|c| c.post == row.id)
            .map(|c| c.comment.clone())
            .collect();
        Ok(PostResponse {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            author,
            created_at: row.created_at,
            updated_at: row.updated_at,
            featured_image: row.featured_image.clone(),
            comments,
        })
    }

    fn create_user(&mut self, username: &str, password: &str, email: String) -> UserResponse {
        let user = UserResponse {
            id: self.id(),
            username: username.to_string(),
            email,
            first_name: String::new(),
            last_name: String::new(),
        };
        self.users.push(UserRow {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }
}

pub struct MockStore {
    inner: Mutex<Inner>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Store seeded with one user and the click game
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.create_user(SEED_USERNAME, SEED_PASSWORD, "demo@example.com".to_string());
        let game_id = inner.id();
        inner.games.push(GameResponse {
            id: game_id,
            name: SEED_GAME.to_string(),
            description: Some("Click as fast as you can".to_string()),
        });
        Self {
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Test instrumentation
    // ========================================================================

    /// Count a call and report whether the route is forced to fail
    pub fn enter(&self, route: &str, authorization: Option<String>) -> bool {
        let mut inner = self.lock();
        *inner.calls.entry(route.to_string()).or_default() += 1;
        inner.last_authorization = authorization;
        inner.failing.contains(route)
    }

    pub fn calls(&self, route: &str) -> u32 {
        self.lock().calls.get(route).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.lock().last_authorization.clone()
    }

    /// Make a route answer 500 until [`MockStore::recover`] is called
    pub fn fail(&self, route: &str) {
        self.lock().failing.insert(route.to_string());
    }

    pub fn recover(&self, route: &str) {
        self.lock().failing.remove(route);
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub fn login(&self, username: &str, password: &str) -> StoreResult<String> {
        let mut inner = self.lock();
        let user_id = inner
            .users
            .iter()
            .find(|u| u.user.username == username && u.password == password)
            .map(|u| u.user.id)
            .ok_or(StoreError::Unauthorized)?;
        let token = format!("token-{}-{}", user_id, inner.id());
        inner.tokens.insert(token.clone(), user_id);
        Ok(token)
    }

    pub fn register(&self, username: &str, password: &str, email: Option<String>) -> StoreResult<UserResponse> {
        let mut inner = self.lock();
        if username.trim().is_empty() || password.is_empty() {
            return Err(StoreError::BadRequest("Username and password are required".into()));
        }
        if inner.users.iter().any(|u| u.user.username == username) {
            return Err(StoreError::BadRequest(format!("User {} already exists", username)));
        }
        Ok(inner.create_user(username, password, email.unwrap_or_default()))
    }

    /// Resolve `Bearer <token>` to a user id
    pub fn authenticate(&self, authorization: Option<&str>) -> StoreResult<u64> {
        let token = authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(StoreError::Unauthorized)?;
        self.lock()
            .tokens
            .get(token)
            .copied()
            .ok_or(StoreError::Unauthorized)
    }

    // ========================================================================
    // Posts & comments
    // ========================================================================

    pub fn list_posts(&self) -> StoreResult<Vec<PostResponse>> {
        let inner = self.lock();
        let mut posts = inner
            .posts
            .iter()
            .map(|row| inner.post_response(row))
            .collect::<StoreResult<Vec<_>>>()?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    pub fn get_post(&self, id: u64) -> StoreResult<PostResponse> {
        let inner = self.lock();
        let row = inner
            .posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Post {} not found", id)))?;
        inner.post_response(row)
    }

    pub fn create_post(&self, author: u64, request: PostRequest) -> StoreResult<PostResponse> {
        if request.title.trim().is_empty() || request.content.trim().is_empty() {
            return Err(StoreError::BadRequest("Title and content are required".into()));
        }
        let mut inner = self.lock();
        let now = Utc::now();
        let row = PostRow {
            id: inner.id(),
            title: request.title,
            content: request.content,
            author,
            created_at: now,
            updated_at: now,
            featured_image: request.featured_image,
        };
        inner.posts.push(row.clone());
        inner.post_response(&row)
    }

    pub fn update_post(&self, user: u64, id: u64, request: PostRequest) -> StoreResult<PostResponse> {
        let mut inner = self.lock();
        let row = inner
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Post {} not found", id)))?;
        if row.author != user {
            return Err(StoreError::Forbidden);
        }
        row.title = request.title;
        row.content = request.content;
        row.featured_image = request.featured_image;
        row.updated_at = Utc::now();
        let row = row.clone();
        inner.post_response(&row)
    }

    pub fn delete_post(&self, user: u64, id: u64) -> StoreResult<()> {
        let mut inner = self.lock();
        let row = inner
            .posts
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Post {} not found", id)))?;
        if row.author != user {
            return Err(StoreError::Forbidden);
        }
        inner.posts.retain(|p| p.id != id);
        inner.comments.retain(|c| c.post != id);
        Ok(())
    }

    pub fn add_comment(&self, user: u64, post: u64, content: &str) -> StoreResult<CommentResponse> {
        let mut inner = self.lock();
        if !inner.posts.iter().any(|p| p.id == post) {
            return Err(StoreError::NotFound(format!("Post {} not found", post)));
        }
        if content.trim().is_empty() {
            return Err(StoreError::BadRequest("Comment cannot be empty".into()));
        }
        let author = inner.user(user).cloned().ok_or(StoreError::Unauthorized)?;
        let comment = CommentResponse {
            id: inner.id(),
            author,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.comments.push(CommentRow {
            comment: comment.clone(),
            post,
        });
        Ok(comment)
    }

    pub fn delete_comment(&self, user: u64, id: u64) -> StoreResult<()> {
        let mut inner = self.lock();
        let row = inner
            .comments
            .iter()
            .find(|c| c.comment.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Comment {} not found", id)))?;
        if row.comment.author.id != user {
            return Err(StoreError::Forbidden);
        }
        inner.comments.retain(|c| c.comment.id != id);
        Ok(())
    }

    // ========================================================================
    // Wallets
    // ========================================================================

    /// Get-or-create the wallet row and count the connection
    pub fn connect_wallet(&self, address: &str) -> StoreResult<WalletResponse> {
        if address.trim().is_empty() {
            return Err(StoreError::BadRequest("Address is required".into()));
        }
        let mut inner = self.lock();
        let now = Utc::now();
        match inner.wallet_index(address) {
            Some(index) => {
                let wallet = &mut inner.wallets[index];
                wallet.connection_count += 1;
                wallet.last_connection = now;
                Ok(wallet.clone())
            }
            None => {
                let wallet = WalletResponse {
                    id: inner.id(),
                    address: address.to_string(),
                    nickname: None,
                    first_connection: now,
                    last_connection: now,
                    connection_count: 1,
                };
                inner.wallets.push(wallet.clone());
                Ok(wallet)
            }
        }
    }

    pub fn wallet(&self, address: &str) -> StoreResult<WalletDetailResponse> {
        let inner = self.lock();
        let wallet = inner
            .wallet_index(address)
            .map(|i| inner.wallets[i].clone())
            .ok_or_else(|| StoreError::NotFound(format!("Wallet {} not found", address)))?;

        let mut game_history: Vec<_> = inner
            .history
            .iter()
            .filter(|r| r.wallet == wallet.id)
            .cloned()
            .collect();
        game_history.sort_by(|a, b| b.played_at.cmp(&a.played_at).then(b.id.cmp(&a.id)));

        let mut high_scores = BTreeMap::new();
        for record in &game_history {
            let best = high_scores.entry(record.game_name.clone()).or_insert(0);
            *best = record.score.max(*best);
        }

        Ok(WalletDetailResponse {
            wallet,
            total_games_played: game_history.len() as u32,
            high_scores,
            game_history,
        })
    }

    pub fn update_nickname(&self, address: &str, nickname: &str) -> StoreResult<WalletResponse> {
        let mut inner = self.lock();
        let index = inner
            .wallet_index(address)
            .ok_or_else(|| StoreError::NotFound(format!("Wallet {} not found", address)))?;
        let wallet = &mut inner.wallets[index];
        wallet.nickname = Some(nickname.to_string());
        Ok(wallet.clone())
    }

    // ========================================================================
    // Games
    // ========================================================================

    pub fn find_games(&self, name: Option<&str>) -> Vec<GameResponse> {
        self.lock()
            .games
            .iter()
            .filter(|g| name.map_or(true, |name| g.name == name))
            .cloned()
            .collect()
    }

    pub fn record_game(&self, request: RecordGameRequest) -> StoreResult<GameRecordResponse> {
        let mut inner = self.lock();
        let wallet = inner
            .wallet_index(&request.wallet_address)
            .map(|i| inner.wallets[i].id)
            .ok_or_else(|| StoreError::NotFound(format!("Wallet {} not found", request.wallet_address)))?;
        let game = inner
            .games
            .iter()
            .find(|g| g.id == request.game_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Game {} not found", request.game_id)))?;

        let data = if request.data.is_null() {
            serde_json::json!({})
        } else {
            request.data
        };
        let record = GameRecordResponse {
            id: inner.id(),
            wallet,
            game: game.id,
            game_name: game.name,
            score: request.score,
            played_at: Utc::now(),
            data,
        };
        inner.history.push(record.clone());
        Ok(record)
    }

    /// Top scores for a game, highest first
    pub fn leaderboard(&self, game_id: u64) -> Vec<LeaderboardResponse> {
        let inner = self.lock();
        let mut records: Vec<_> = inner
            .history
            .iter()
            .filter(|r| r.game == game_id)
            .collect();
        records.sort_by(|a, b| b.score.cmp(&a.score).then(a.played_at.cmp(&b.played_at)));

        records
            .into_iter()
            .take(LEADERBOARD_SIZE)
            .filter_map(|record| {
                let wallet = inner.wallets.iter().find(|w| w.id == record.wallet)?;
                Some(LeaderboardResponse {
                    record: record.clone(),
                    wallet_address: wallet.address.clone(),
                    wallet_nickname: wallet.nickname.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_counts_and_matches_case_insensitively() {
        let store = MockStore::new();
        let first = store.connect_wallet("0xAbC").unwrap();
        let second = store.connect_wallet("0xabc").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.connection_count, 2);
        assert_eq!(second.address, "0xAbC");
    }

    #[test]
    fn test_leaderboard_sorted_and_capped() {
        let store = MockStore::new();
        store.connect_wallet("0x1").unwrap();
        let game_id = store.find_games(Some(SEED_GAME))[0].id;
        for score in 0..12 {
            store
                .record_game(RecordGameRequest {
                    wallet_address: "0x1".into(),
                    game_id,
                    score,
                    data: serde_json::Value::Null,
                })
                .unwrap();
        }
        let board = store.leaderboard(game_id);
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].record.score, 11);
        assert_eq!(board[9].record.score, 2);
        assert_eq!(board[0].record.data, serde_json::json!({}));
    }

    #[test]
    fn test_wallet_detail_statistics() {
        let store = MockStore::new();
        store.connect_wallet("0x1").unwrap();
        let game_id = store.find_games(None)[0].id;
        for score in [3, 9, 5] {
            store
                .record_game(RecordGameRequest {
                    wallet_address: "0x1".into(),
                    game_id,
                    score,
                    data: serde_json::json!({"duration": 10}),
                })
                .unwrap();
        }
        let detail = store.wallet("0x1").unwrap();
        assert_eq!(detail.total_games_played, 3);
        assert_eq!(detail.high_scores.get(SEED_GAME), Some(&9));
    }

    #[test]
    fn test_only_author_deletes_post() {
        let store = MockStore::new();
        let header = format!("Bearer {}", store.login(SEED_USERNAME, SEED_PASSWORD).unwrap());
        let author = store.authenticate(Some(header.as_str())).unwrap();
        let post = store
            .create_post(author, PostRequest {
                title: "Hello".into(),
                content: "World".into(),
                featured_image: None,
            })
            .unwrap();
        let other = store.register("eve", "pw", None).unwrap();
        assert_eq!(store.delete_post(other.id, post.id), Err(StoreError::Forbidden));
        assert!(store.delete_post(author, post.id).is_ok());
        assert!(store.list_posts().unwrap().is_empty());
    }
}
