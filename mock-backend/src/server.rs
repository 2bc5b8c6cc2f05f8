/// Axum HTTP server setup and routing
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::store::MockStore;

pub fn create_router(store: Arc<MockStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Posts & comments
        .route("/api/posts/", get(list_posts).post(create_post))
        .route(
            "/api/posts/:id/",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/:id/add_comment/", post(add_comment))
        .route("/api/comments/:id/", delete(delete_comment))
        // Auth
        .route("/api/auth/login/", post(login))
        .route("/api/auth/register/", post(register))
        // Wallets
        .route("/api/wallets/connect/", post(connect_wallet))
        .route("/api/wallets/:address/", get(get_wallet))
        .route("/api/wallets/:address/update_nickname/", post(update_nickname))
        // Games
        .route("/api/games", get(find_games))
        .route("/api/game-history/leaderboard/", get(leaderboard))
        .route("/api/game-history/record_game/", post(record_game))
        .with_state(store)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(store: Arc<MockStore>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(store);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Folio mock backend listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve a fresh seeded store on an ephemeral localhost port
///
/// The server task lives as long as the calling runtime.
pub async fn spawn() -> anyhow::Result<(SocketAddr, Arc<MockStore>)> {
    let store = Arc::new(MockStore::new());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(store.clone());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Mock backend stopped: {}", e);
        }
    });

    log::debug!("Mock backend on http://{}", addr);
    Ok((addr, store))
}
