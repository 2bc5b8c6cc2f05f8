/// Folio Mock Backend
///
/// Serves the blog/wallet/game REST API from memory for local development.
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use folio_mock::{run_server, MockStore};

#[derive(Debug)]
struct Config {
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        Ok(Self {
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!("Server will listen on {}:{}", config.server_host, config.server_port);
    log::info!(
        "Seeded user '{}' and game '{}'",
        folio_mock::SEED_USERNAME,
        folio_mock::SEED_GAME
    );

    run_server(Arc::new(MockStore::new()), config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
