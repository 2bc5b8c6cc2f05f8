/// Axum HTTP handlers for the blog/wallet/game REST API
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::store::{routes, MockStore, StoreError};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockStore>;

/// Custom error type for handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Authentication credentials were not provided")]
    Unauthorized,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::BadRequest(msg) => ApiError::BadRequest(msg),
            StoreError::Unauthorized => ApiError::Unauthorized,
            StoreError::Forbidden => ApiError::Forbidden,
        }
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Count the call and honour failure injection
fn enter(store: &MockStore, route: &str, headers: &HeaderMap) -> Result<(), ApiError> {
    if store.enter(route, authorization(headers)) {
        log::warn!("Forced failure on {}", route);
        return Err(ApiError::Internal(format!("Forced failure on {}", route)));
    }
    Ok(())
}

fn require_user(store: &MockStore, headers: &HeaderMap) -> Result<u64, ApiError> {
    Ok(store.authenticate(authorization(headers).as_deref())?)
}

// ============================================================================
// POSTS & COMMENTS
// ============================================================================

/// GET /api/posts/
pub async fn list_posts(
    State(store): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    enter(&store, routes::LIST_POSTS, &headers)?;
    Ok(Json(store.list_posts()?))
}

/// GET /api/posts/{id}/
pub async fn get_post(
    State(store): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<PostResponse>, ApiError> {
    enter(&store, routes::GET_POST, &headers)?;
    Ok(Json(store.get_post(id)?))
}

/// POST /api/posts/ (authenticated)
pub async fn create_post(
    State(store): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    enter(&store, routes::CREATE_POST, &headers)?;
    let user = require_user(&store, &headers)?;
    let post = store.create_post(user, req)?;
    log::info!("Created post {} '{}'", post.id, post.title);
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/{id}/ (author only)
pub async fn update_post(
    State(store): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<PostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    enter(&store, routes::UPDATE_POST, &headers)?;
    let user = require_user(&store, &headers)?;
    Ok(Json(store.update_post(user, id, req)?))
}

/// DELETE /api/posts/{id}/ (author only)
pub async fn delete_post(
    State(store): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    enter(&store, routes::DELETE_POST, &headers)?;
    let user = require_user(&store, &headers)?;
    store.delete_post(user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/{id}/add_comment/ (authenticated)
pub async fn add_comment(
    State(store): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    enter(&store, routes::ADD_COMMENT, &headers)?;
    let user = require_user(&store, &headers)?;
    let comment = store.add_comment(user, id, &req.content)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/comments/{id}/ (author only)
pub async fn delete_comment(
    State(store): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    enter(&store, routes::DELETE_COMMENT, &headers)?;
    let user = require_user(&store, &headers)?;
    store.delete_comment(user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// AUTH
// ============================================================================

/// POST /api/auth/login/
pub async fn login(
    State(store): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    enter(&store, routes::LOGIN, &headers)?;
    let token = store.login(&req.username, &req.password)?;
    Ok(Json(TokenResponse { token }))
}

/// POST /api/auth/register/
pub async fn register(
    State(store): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    enter(&store, routes::REGISTER, &headers)?;
    let user = store.register(&req.username, &req.password, req.email)?;
    Ok((StatusCode::CREATED, Json(user)))
}

// ============================================================================
// WALLETS
// ============================================================================

/// POST /api/wallets/connect/
pub async fn connect_wallet(
    State(store): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    enter(&store, routes::CONNECT_WALLET, &headers)?;
    let wallet = store.connect_wallet(&req.address)?;
    log::info!("Wallet {} connected ({} times)", wallet.address, wallet.connection_count);
    Ok(Json(wallet))
}

/// GET /api/wallets/{address}/
pub async fn get_wallet(
    State(store): State<AppState>,
    Path(address): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WalletDetailResponse>, ApiError> {
    enter(&store, routes::GET_WALLET, &headers)?;
    Ok(Json(store.wallet(&address)?))
}

/// POST /api/wallets/{address}/update_nickname/
pub async fn update_nickname(
    State(store): State<AppState>,
    Path(address): Path<String>,
    headers: HeaderMap,
    Json(req): Json<NicknameRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    enter(&store, routes::UPDATE_NICKNAME, &headers)?;
    Ok(Json(store.update_nickname(&address, &req.nickname)?))
}

// ============================================================================
// GAMES
// ============================================================================

/// GET /api/games?name=...
pub async fn find_games(
    State(store): State<AppState>,
    Query(query): Query<GameQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<GameResponse>>, ApiError> {
    enter(&store, routes::FIND_GAMES, &headers)?;
    Ok(Json(store.find_games(query.name.as_deref())))
}

/// GET /api/game-history/leaderboard/?game_id=...
pub async fn leaderboard(
    State(store): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<LeaderboardResponse>>, ApiError> {
    enter(&store, routes::LEADERBOARD, &headers)?;
    let game_id = query
        .game_id
        .ok_or_else(|| ApiError::BadRequest("game_id is required".into()))?;
    Ok(Json(store.leaderboard(game_id)))
}

/// POST /api/game-history/record_game/
pub async fn record_game(
    State(store): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RecordGameRequest>,
) -> Result<(StatusCode, Json<GameRecordResponse>), ApiError> {
    enter(&store, routes::RECORD_GAME, &headers)?;
    let record = store.record_game(req)?;
    log::info!("Recorded score {} for wallet {}", record.score, record.wallet);
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
