use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::types::*;
use crate::config::ClientConfig;
use crate::error::FolioError;
use crate::storage::ClientStorage;
use crate::Result;

/// Typed client for the blog/wallet REST backend
///
/// Every request carries `Authorization: Bearer <token>` when a token is
/// present in client storage. The token is read per request, so a login in
/// one place is picked up everywhere that shares the storage directory.
#[derive(Clone)]
pub struct ApiClient {
    /// reqwest::Client is internally Arc-based
    http: reqwest::Client,
    config: ClientConfig,
    storage: ClientStorage,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, storage: ClientStorage) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
            storage,
        }
    }

    pub fn storage(&self) -> &ClientStorage {
        &self.storage
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.api_endpoint(path);
        log::debug!("{} {}", method, url);

        let builder = self.http.request(method, url);
        match self.storage.load_token() {
            Ok(Some(token)) => builder.bearer_auth(token),
            Ok(None) => builder,
            Err(e) => {
                log::warn!("Could not read stored token: {}", e);
                builder
            }
        }
    }

    // ========================================================================
    // Response handling
    // ========================================================================

    /// Read side: failures become `FolioError::Fetch`
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(FolioError::fetch)?;
        let response = ensure_success(response).await.map_err(FolioError::Fetch)?;
        response.json().await.map_err(FolioError::fetch)
    }

    /// Write side: failures become `FolioError::Submit`
    async fn submit<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(FolioError::submit)?;
        let response = ensure_success(response).await.map_err(FolioError::Submit)?;
        response.json().await.map_err(FolioError::submit)
    }

    async fn submit_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await.map_err(FolioError::submit)?;
        ensure_success(response).await.map_err(FolioError::Submit)?;
        Ok(())
    }

    // ========================================================================
    // Posts & comments
    // ========================================================================

    pub async fn list_posts(&self) -> Result<Vec<BlogPost>> {
        self.fetch(self.request(Method::GET, "posts/")).await
    }

    pub async fn get_post(&self, id: u64) -> Result<BlogPost> {
        self.fetch(self.request(Method::GET, &format!("posts/{}/", id)))
            .await
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<BlogPost> {
        self.submit(self.request(Method::POST, "posts/").json(draft))
            .await
    }

    pub async fn update_post(&self, id: u64, draft: &PostDraft) -> Result<BlogPost> {
        self.submit(
            self.request(Method::PUT, &format!("posts/{}/", id))
                .json(draft),
        )
        .await
    }

    pub async fn delete_post(&self, id: u64) -> Result<()> {
        self.submit_empty(self.request(Method::DELETE, &format!("posts/{}/", id)))
            .await
    }

    pub async fn add_comment(&self, post_id: u64, comment: &NewComment) -> Result<Comment> {
        self.submit(
            self.request(Method::POST, &format!("posts/{}/add_comment/", post_id))
                .json(comment),
        )
        .await
    }

    pub async fn delete_comment(&self, id: u64) -> Result<()> {
        self.submit_empty(self.request(Method::DELETE, &format!("comments/{}/", id)))
            .await
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Log in and persist the returned token for subsequent requests
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthToken> {
        let token: AuthToken = self
            .submit(self.request(Method::POST, "auth/login/").json(credentials))
            .await?;
        self.storage.save_token(&token.token)?;
        log::info!("Logged in as {}", credentials.username);
        Ok(token)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.submit(self.request(Method::POST, "auth/register/").json(request))
            .await
    }

    pub fn logout(&self) -> Result<()> {
        self.storage.clear_token()?;
        Ok(())
    }

    // ========================================================================
    // Wallets
    // ========================================================================

    /// Upsert the connection record for an address
    pub async fn connect_wallet(&self, address: &str) -> Result<WalletProfile> {
        let body = ConnectWalletRequest {
            address: address.to_string(),
        };
        self.submit(self.request(Method::POST, "wallets/connect/").json(&body))
            .await
    }

    pub async fn get_wallet(&self, address: &str) -> Result<WalletProfile> {
        self.fetch(self.request(Method::GET, &format!("wallets/{}/", address)))
            .await
    }

    pub async fn update_nickname(&self, address: &str, nickname: &str) -> Result<WalletProfile> {
        let body = UpdateNicknameRequest {
            nickname: nickname.to_string(),
        };
        self.submit(
            self.request(Method::POST, &format!("wallets/{}/update_nickname/", address))
                .json(&body),
        )
        .await
    }

    // ========================================================================
    // Games
    // ========================================================================

    pub async fn find_games(&self, name: &str) -> Result<Vec<Game>> {
        self.fetch(self.request(Method::GET, "games").query(&[("name", name)]))
            .await
    }

    pub async fn leaderboard(&self, game_id: u64) -> Result<Vec<LeaderboardEntry>> {
        self.fetch(
            self.request(Method::GET, "game-history/leaderboard/")
                .query(&[("game_id", game_id)]),
        )
        .await
    }

    pub async fn record_game(&self, request: &RecordGameRequest) -> Result<GameRecord> {
        self.submit(
            self.request(Method::POST, "game-history/record_game/")
                .json(request),
        )
        .await
    }
}

/// Turn a non-2xx response into a message carrying the status and body
async fn ensure_success(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(format!("{} returned {}: {}", url, status, body.trim()))
}
