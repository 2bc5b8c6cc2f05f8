//! Click game state machine
//!
//! `Idle → Active → Idle`. Ticks and clicks that arrive while idle are
//! ignored, which keeps a late timer callback or a stray click after the
//! end from touching the finished score.

use crate::config::DEFAULT_GAME_DURATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session was idle; nothing changed
    Ignored,
    /// One unit elapsed, this many remain
    Running(u32),
    /// Time ran out; the session is idle again with this final score
    Expired { score: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    game_id: u64,
    score: u64,
    time_left: u32,
    active: bool,
    duration: u32,
}

impl GameSession {
    pub fn new(game_id: u64) -> Self {
        Self::with_duration(game_id, DEFAULT_GAME_DURATION)
    }

    pub fn with_duration(game_id: u64, duration: u32) -> Self {
        Self {
            game_id,
            score: 0,
            time_left: duration,
            active: false,
            duration,
        }
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Units a round lasts
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reset score and clock, whatever state the previous round ended in
    pub fn start(&mut self) {
        self.score = 0;
        self.time_left = self.duration;
        self.active = true;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.active {
            return TickOutcome::Ignored;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.active = false;
            TickOutcome::Expired { score: self.score }
        } else {
            TickOutcome::Running(self.time_left)
        }
    }

    /// Count one click; returns false when the session isn't running
    pub fn increment(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.score += 1;
        true
    }

    /// End the round early; the score is kept but nothing is submitted
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}
