//! Flip to Match - a memory card matching game
//!
//! Core modules:
//! - `sim`: Pure game logic (deck, card flips, session, timer/score)
//! - `game`: Controller owning the current session and its collaborators
//! - `highscores`: Best score per board size
//! - `persistence`: Key-value store, result log and remote sink
//! - `platform`: Clock and browser glue
//! - `settings`: Configuration with built-in defaults

pub mod error;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{SetupError, StoreError};
pub use game::{Collaborators, DynCollaborators, Game};
pub use highscores::{BestScoreRecord, BestScores};
pub use settings::{CardSettings, MessageTemplates, Settings};

/// Game configuration constants
pub mod consts {
    /// Smallest allowed row/column count
    pub const GRID_MIN: u32 = 2;
    /// Largest allowed row/column count
    pub const GRID_MAX: u32 = 5;

    /// Points awarded per pair toward the maximum score
    pub const POINTS_PER_PAIR: u32 = 100;
    /// Seconds of play after which the score has decayed to zero
    pub const SCORE_DECAY_SECS: u32 = 180;

    /// Timer refresh interval
    pub const TIMER_INTERVAL_MS: u64 = 250;
    /// How long both faces of a pair stay visible before the outcome plays
    pub const RESULT_PAUSE_MS: u64 = 800;
    /// Full flip duration (both half-rotations)
    pub const FLIP_DURATION_MS: u64 = 600;

    /// Hide-matched mode: fade starts after the match animation
    pub const MATCHED_FADE_MS: u64 = 600;
    /// Hide-matched mode: card is removed from the board
    pub const MATCHED_REMOVE_MS: u64 = 900;
    /// Hide-matched mode: delay before the win screen is presented
    pub const WIN_PRESENT_DELAY_MS: u64 = 600;

    /// Number of numbered card images shipped with the game
    pub const IMAGE_COUNT: usize = 20;
    /// Image shown on the back of every card
    pub const REVERSE_IMAGE: &str = "assets/img/cards/r.png";
}

/// Format elapsed milliseconds as `MM:SS`
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
