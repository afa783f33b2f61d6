//! Game simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time comes in as a millisecond timestamp, never read from a clock
//! - Seeded RNG only
//! - No storage, rendering or platform dependencies

pub mod deck;
pub mod flip;
pub mod messages;
pub mod session;
pub mod tick;
pub mod timer;

pub use deck::{DeckSlot, GridSize, Icon, IconPool, PairKey, build_deck, shuffle, validate_grid};
pub use flip::{FaceContent, FlipCard, FlipDirection, FlipEvent, FlipOptions, FlipState, Side};
pub use messages::{MessageCategory, Substitutions, render_status};
pub use session::{
    Card, CardKind, GameEvent, PlayerSetup, Session, SessionAction, SessionPhase, SessionSummary,
};
pub use tick::{Scheduler, tick};
pub use timer::{ScoreModel, Timer};
