use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::session::{GameSession, TickOutcome};
use crate::api::{ApiClient, Game, GameRecord, LeaderboardEntry};
use crate::config::ClientConfig;
use crate::error::FolioError;
use crate::provider::WalletProvider;
use crate::session::WalletSessionManager;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    Click,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    /// Score stored for the connected wallet
    Recorded(GameRecord),
    /// No wallet connected; the score was discarded
    NotConnected,
    /// The backend rejected or never received the score
    Failed,
    /// Player quit before time ran out
    Abandoned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    pub score: u64,
    pub status: SaveStatus,
}

/// Look up a game by name; the first match wins
pub async fn resolve_game(api: &ApiClient, name: &str) -> Result<Game> {
    api.find_games(name)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| FolioError::GameNotFound(name.to_string()))
}

/// Drives a [`GameSession`] with a timer and player input
pub struct GameRunner<'a, P: WalletProvider> {
    manager: &'a WalletSessionManager<P>,
    game: Game,
    session: GameSession,
    tick: Duration,
    leaderboard: Vec<LeaderboardEntry>,
}

impl<'a, P: WalletProvider> GameRunner<'a, P> {
    pub fn new(manager: &'a WalletSessionManager<P>, game: Game, duration: u32, tick: Duration) -> Self {
        let session = GameSession::with_duration(game.id, duration);
        Self {
            manager,
            game,
            session,
            tick,
            leaderboard: Vec::new(),
        }
    }

    /// Resolve the configured game and load its leaderboard
    pub async fn load(manager: &'a WalletSessionManager<P>, config: &ClientConfig) -> Result<Self> {
        let game = resolve_game(manager.api(), &config.game_name)
            .await
            .inspect_err(|e| log::error!("Error fetching game: {}", e))?;
        log::debug!("Loaded game '{}' (id {})", game.name, game.id);

        let mut runner = Self::new(manager, game, config.game_duration, config.game_tick);
        // failure is already reported; an empty board is fine to start with
        let _ = runner.refresh_leaderboard().await;
        Ok(runner)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Re-fetch the ranked list; on failure the previous list is kept
    pub async fn refresh_leaderboard(&mut self) -> Result<&[LeaderboardEntry]> {
        match self.manager.api().leaderboard(self.game.id).await {
            Ok(entries) => {
                self.leaderboard = entries;
                Ok(&self.leaderboard)
            }
            Err(e) => {
                log::error!("Error fetching leaderboard: {}", e);
                self.manager
                    .notifier()
                    .notify(&format!("Error fetching leaderboard: {}", e));
                Err(e)
            }
        }
    }

    /// Play one round
    ///
    /// Clicks queued before the first tick count toward the round. A closed
    /// input channel just means no more clicks; the clock still runs out.
    pub async fn play(&mut self, inputs: &mut mpsc::UnboundedReceiver<GameInput>) -> GameResult {
        self.session.start();
        log::info!("🎮 {} started ({} units)", self.game.name, self.session.time_left());

        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inputs_open = true;

        loop {
            tokio::select! {
                biased;

                input = inputs.recv(), if inputs_open => match input {
                    Some(GameInput::Click) => {
                        self.session.increment();
                    }
                    Some(GameInput::Quit) => {
                        self.session.stop();
                        log::info!("Game abandoned with score {}", self.session.score());
                        return GameResult {
                            score: self.session.score(),
                            status: SaveStatus::Abandoned,
                        };
                    }
                    None => inputs_open = false,
                },

                _ = ticker.tick() => match self.session.tick() {
                    TickOutcome::Expired { score } => return self.finish(score).await,
                    TickOutcome::Running(left) => log::debug!("{} left, score {}", left, self.session.score()),
                    TickOutcome::Ignored => {}
                },
            }
        }
    }

    async fn finish(&mut self, score: u64) -> GameResult {
        log::info!("⏱️  Time's up! Score: {}", score);

        if !self.manager.is_connected() {
            self.manager
                .notifier()
                .notify("Connect your wallet to save your score!");
            return GameResult {
                score,
                status: SaveStatus::NotConnected,
            };
        }

        let extra = json!({ "duration": self.session.duration() });
        let status = match self
            .manager
            .record_game_score(self.game.id, score, extra)
            .await
        {
            Ok(Some(record)) => SaveStatus::Recorded(record),
            Ok(None) => SaveStatus::NotConnected,
            Err(_) => SaveStatus::Failed,
        };

        let _ = self.refresh_leaderboard().await;
        GameResult { score, status }
    }
}
