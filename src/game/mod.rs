//! Click game
//!
//! - Session state machine (score, countdown)
//! - Timer-driven runner with score submission and leaderboard

pub mod runner;
pub mod session;

pub use runner::{resolve_game, GameInput, GameResult, GameRunner, SaveStatus};
pub use session::{GameSession, TickOutcome};
