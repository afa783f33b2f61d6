//! Match session state
//!
//! One `Session` per game. It owns the cards, evaluates selected pairs and
//! keeps moves, score and time. It never touches storage; the controller
//! reacts to the events it raises.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::deck::{DeckSlot, GridSize, Icon, IconPool, PairKey, build_deck};
use super::flip::{FlipCard, FlipEvent, FlipOptions, FlipState};
use super::messages::{MessageCategory, Substitutions, render_status};
use super::tick::Scheduler;
use super::timer::{ScoreModel, Timer};
use crate::consts::{MATCHED_FADE_MS, MATCHED_REMOVE_MS};
use crate::error::SetupError;
use crate::settings::Settings;

/// What the player chose on the setup screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    pub email: Option<String>,
    pub rows: u32,
    pub columns: u32,
    /// Remove matched cards from the board after a short fade
    pub hide_matched: bool,
}

impl PlayerSetup {
    pub fn new(name: impl Into<String>, rows: u32, columns: u32) -> Self {
        Self {
            name: name.into(),
            email: None,
            rows,
            columns,
            hide_matched: false,
        }
    }
}

/// What a board cell holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardKind {
    Pair(Icon),
    Filler,
}

/// A card on the board
#[derive(Debug, Clone)]
pub struct Card {
    pub kind: CardKind,
    pub flip: FlipCard,
    pub matched: bool,
    /// Faded out in hide-matched mode
    pub removed: bool,
}

impl Card {
    fn from_slot(slot: DeckSlot, settings: &Settings) -> Self {
        let (kind, face_image) = match slot {
            DeckSlot::Card(icon) => {
                let image = icon.image.clone();
                (CardKind::Pair(icon), image)
            }
            DeckSlot::Filler => (CardKind::Filler, String::new()),
        };
        Self {
            kind,
            flip: FlipCard::new(FlipOptions::from_settings(settings, &face_image)),
            matched: false,
            removed: false,
        }
    }

    pub fn pair_key(&self) -> Option<PairKey> {
        match &self.kind {
            CardKind::Pair(icon) => Some(icon.pair_key()),
            CardKind::Filler => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            CardKind::Pair(icon) => Some(&icon.label),
            CardKind::Filler => None,
        }
    }

    pub fn is_filler(&self) -> bool {
        self.kind == CardKind::Filler
    }

    /// Face down, unmatched, not animating
    pub fn is_selectable(&self) -> bool {
        !self.is_filler() && !self.matched && self.flip.state() == FlipState::Hidden
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    Won,
}

/// Snapshot of a session's results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub name: String,
    pub email: Option<String>,
    pub rows: u32,
    pub columns: u32,
    pub hide_matched: bool,
    pub slots: u32,
    pub score: u32,
    pub max_score: u32,
    pub time_ms: u64,
    pub moves: u32,
    pub matches_found: u32,
}

/// Everything a session reports to the outside, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Flip { card: usize, event: FlipEvent },
    Status(String),
    MovesChanged(u32),
    MatchFound { first: usize, second: usize, found: u32 },
    Mismatch { first: usize, second: usize },
    /// Hide-matched mode: start fading a matched card
    CardFading(usize),
    /// Hide-matched mode: matched card leaves the board
    CardRemoved(usize),
    ScoreChanged { score: u32, elapsed_ms: u64 },
    Won(SessionSummary),
    /// Win screen may be shown now
    WinPresented,
}

/// Delayed work queued by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    HideMismatch { first: usize, second: usize },
    FadeMatched(usize),
    RemoveMatched(usize),
    PresentWin,
}

/// A single game, from first card to last match
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    email: Option<String>,
    grid: GridSize,
    hide_matched: bool,
    pub(super) cards: Vec<Card>,
    /// Selected cards awaiting evaluation (0-2)
    pending: Vec<usize>,
    matches_found: u32,
    moves: u32,
    /// Input locked while a pair is being resolved
    busy: bool,
    phase: SessionPhase,
    pub(super) timer: Timer,
    score_model: ScoreModel,
    score: u32,
    status: String,
    pub(super) settings: Settings,
    rng: Pcg32,
    pub(super) scheduler: Scheduler<SessionAction>,
    /// Mismatched cards still waiting to be turned face down
    hiding: Vec<usize>,
    pub(super) last_timer_tick: u64,
    events: Vec<GameEvent>,
}

impl Session {
    /// Build the deck and set up a fresh session.
    ///
    /// Fails before anything is created if the grid is invalid.
    pub fn new(
        setup: &PlayerSetup,
        settings: &Settings,
        pool: &IconPool,
        seed: u64,
    ) -> Result<Self, SetupError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let deck = build_deck(setup.rows, setup.columns, pool, &mut rng)?;
        let grid = GridSize {
            rows: setup.rows,
            columns: setup.columns,
        };
        let cards = deck
            .into_iter()
            .map(|slot| Card::from_slot(slot, settings))
            .collect();
        let score_model = ScoreModel::for_pairs(grid.pairs());

        let mut session = Self {
            name: setup.name.clone(),
            email: setup.email.clone(),
            grid,
            hide_matched: setup.hide_matched,
            cards,
            pending: Vec::with_capacity(2),
            matches_found: 0,
            moves: 0,
            busy: false,
            phase: SessionPhase::Playing,
            timer: Timer::new(),
            score_model,
            score: score_model.max_score,
            status: String::new(),
            settings: settings.clone(),
            rng,
            scheduler: Scheduler::new(),
            hiding: Vec::new(),
            last_timer_tick: 0,
            events: Vec::new(),
        };
        session.set_status(MessageCategory::Start);
        log::info!(
            "Session started for {}: {}x{}, {} pairs, seed {}",
            session.name,
            grid.rows,
            grid.columns,
            grid.pairs(),
            seed
        );
        Ok(session)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn hide_matched(&self) -> bool {
        self.hide_matched
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn pending(&self) -> &[usize] {
        &self.pending
    }

    pub fn pairs_needed(&self) -> u32 {
        self.grid.pairs()
    }

    pub fn matches_found(&self) -> u32 {
        self.matches_found
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_won(&self) -> bool {
        self.phase == SessionPhase::Won
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn max_score(&self) -> u32 {
        self.score_model.max_score
    }

    pub fn penalty_per_second(&self) -> u32 {
        self.score_model.penalty_per_second
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Started but not finished: a leaving player abandons it
    pub fn is_in_progress(&self) -> bool {
        self.phase == SessionPhase::Playing
            && (self.moves > 0 || self.timer.elapsed_ms() > 0 || self.timer.is_running())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            name: self.name.clone(),
            email: self.email.clone(),
            rows: self.grid.rows,
            columns: self.grid.columns,
            hide_matched: self.hide_matched,
            slots: self.grid.slots(),
            score: self.score,
            max_score: self.score_model.max_score,
            time_ms: self.timer.elapsed_ms(),
            moves: self.moves,
            matches_found: self.matches_found,
        }
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Player picked a card. Returns false if the selection was ignored.
    pub fn select(&mut self, index: usize, now: u64) -> bool {
        if self.phase != SessionPhase::Playing || self.busy {
            return false;
        }
        match self.cards.get(index) {
            Some(card) if card.is_selectable() => {}
            _ => return false,
        }
        if !self.cards[index].flip.flip_to_face(now) {
            // Still cooling down from the last flip
            return false;
        }
        self.flush_card(index);

        if !self.timer.is_running() {
            self.timer.start(now);
            self.last_timer_tick = now;
        }

        self.pending.push(index);
        if self.pending.len() == 2 {
            self.busy = true;
            self.evaluate(now);
        }
        true
    }

    /// The renderer finished a half-rotation of `index`
    pub fn segment_complete(&mut self, index: usize, now: u64) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        card.flip.segment_complete(now);
        self.flush_card(index);
        self.retry_hiding(now);
    }

    /// End play now (player left). Stops the clock and freezes the score.
    pub fn stop(&mut self, now: u64) {
        self.timer.stop(now);
        self.refresh_score();
    }

    fn evaluate(&mut self, now: u64) {
        let (first, second) = (self.pending[0], self.pending[1]);
        self.moves += 1;
        self.events.push(GameEvent::MovesChanged(self.moves));

        let first_key = self.cards[first].pair_key();
        let is_match = first_key.is_some() && first_key == self.cards[second].pair_key();

        if is_match {
            self.resolve_match(first, second, now);
        } else {
            log::debug!("Mismatch: cards {first} and {second}");
            self.events.push(GameEvent::Mismatch { first, second });
            self.set_status(MessageCategory::Mismatch);
            let due = now.saturating_add(self.settings.result_pause_ms);
            self.scheduler
                .schedule(due, SessionAction::HideMismatch { first, second });
        }
    }

    fn resolve_match(&mut self, first: usize, second: usize, now: u64) {
        for index in [first, second] {
            let card = &mut self.cards[index];
            card.matched = true;
            card.flip.lock();
            self.flush_card(index);
        }
        self.matches_found += 1;
        self.pending.clear();
        self.busy = false;

        log::debug!(
            "Match: cards {first} and {second} ({}/{})",
            self.matches_found,
            self.pairs_needed()
        );
        self.events.push(GameEvent::MatchFound {
            first,
            second,
            found: self.matches_found,
        });
        self.set_status(MessageCategory::Progress);

        if self.hide_matched {
            for index in [first, second] {
                self.scheduler
                    .schedule(now + MATCHED_FADE_MS, SessionAction::FadeMatched(index));
                self.scheduler
                    .schedule(now + MATCHED_REMOVE_MS, SessionAction::RemoveMatched(index));
            }
        }

        if self.matches_found == self.pairs_needed() {
            self.win(now);
        }
    }

    fn win(&mut self, now: u64) {
        self.timer.stop(now);
        self.refresh_score();
        self.phase = SessionPhase::Won;
        self.set_status(MessageCategory::Win);

        let summary = self.summary();
        log::info!(
            "{} won: score {}/{}, {} moves, {} ms",
            summary.name,
            summary.score,
            summary.max_score,
            summary.moves,
            summary.time_ms
        );
        self.events.push(GameEvent::Won(summary));

        let delay = self.settings.effective_win_delay(self.hide_matched);
        if delay == 0 {
            self.events.push(GameEvent::WinPresented);
        } else {
            self.scheduler
                .schedule(now.saturating_add(delay), SessionAction::PresentWin);
        }
    }

    /// Run a scheduled action that has come due
    pub(super) fn run_action(&mut self, action: SessionAction, now: u64) {
        match action {
            SessionAction::HideMismatch { first, second } => {
                self.hiding.extend([first, second]);
                self.retry_hiding(now);
            }
            SessionAction::FadeMatched(index) => self.events.push(GameEvent::CardFading(index)),
            SessionAction::RemoveMatched(index) => {
                if let Some(card) = self.cards.get_mut(index) {
                    card.removed = true;
                    self.events.push(GameEvent::CardRemoved(index));
                }
            }
            SessionAction::PresentWin => self.events.push(GameEvent::WinPresented),
        }
    }

    /// Send mismatched cards face down, retrying while they are still busy.
    /// Input unlocks once both have settled face down.
    pub(super) fn retry_hiding(&mut self, now: u64) {
        if self.hiding.is_empty() {
            return;
        }
        let mut waiting = Vec::with_capacity(self.hiding.len());
        for index in std::mem::take(&mut self.hiding) {
            let flip = &mut self.cards[index].flip;
            if flip.state() == FlipState::Revealed {
                flip.flip_to_reverse(now);
            }
            let settled = flip.state() == FlipState::Hidden;
            self.flush_card(index);
            if !settled {
                waiting.push(index);
            }
        }
        self.hiding = waiting;

        if self.hiding.is_empty() {
            self.pending.clear();
            self.busy = false;
        }
    }

    /// Advance every card's time-driven transitions
    pub(super) fn advance_cards(&mut self, now: u64) {
        for index in 0..self.cards.len() {
            self.cards[index].flip.advance(now);
            self.flush_card(index);
        }
    }

    /// Recompute the score from the timer
    pub(super) fn refresh_score(&mut self) {
        self.score = self.score_model.score_at(self.timer.elapsed_ms());
        self.events.push(GameEvent::ScoreChanged {
            score: self.score,
            elapsed_ms: self.timer.elapsed_ms(),
        });
    }

    fn set_status(&mut self, category: MessageCategory) {
        let subs = Substitutions {
            name: &self.name,
            found: self.matches_found,
            total: self.grid.pairs(),
        };
        self.status = render_status(category, &self.settings.messages, &subs, &mut self.rng);
        self.events.push(GameEvent::Status(self.status.clone()));
    }

    fn flush_card(&mut self, index: usize) {
        for event in self.cards[index].flip.drain_events() {
            self.events.push(GameEvent::Flip { card: index, event });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::flip::FlipDirection;

    fn reduced_settings() -> Settings {
        Settings {
            reduced_motion: true,
            ..Default::default()
        }
    }

    fn session(rows: u32, columns: u32) -> Session {
        let setup = PlayerSetup::new("Ada", rows, columns);
        Session::new(&setup, &reduced_settings(), &IconPool::default(), 11).unwrap()
    }

    /// Indices of two cards sharing a key, and one card that differs
    fn find_pair(session: &Session) -> (usize, usize, usize) {
        let cards = session.cards();
        for a in 0..cards.len() {
            for b in (a + 1)..cards.len() {
                if cards[a].is_selectable() && cards[a].pair_key() == cards[b].pair_key() {
                    let other = (0..cards.len())
                        .find(|&c| {
                            cards[c].is_selectable() && cards[c].pair_key() != cards[a].pair_key()
                        })
                        .unwrap_or(a);
                    return (a, b, other);
                }
            }
        }
        panic!("no pair left");
    }

    #[test]
    fn test_new_session_defaults() {
        let s = session(2, 2);
        assert_eq!(s.pairs_needed(), 2);
        assert_eq!(s.max_score(), 200);
        assert_eq!(s.score(), 200);
        assert_eq!(s.penalty_per_second(), 1);
        assert_eq!(s.status(), "Ada, find all the matching pairs!");
        assert!(!s.is_in_progress());
    }

    #[test]
    fn test_invalid_grid_is_rejected() {
        let setup = PlayerSetup::new("Ada", 6, 2);
        let err = Session::new(&setup, &Settings::default(), &IconPool::default(), 1).unwrap_err();
        assert_eq!(err, SetupError::GridOutOfRange { rows: 6, columns: 2 });
    }

    #[test]
    fn test_match_locks_cards() {
        let mut s = session(2, 3);
        let (a, b, _) = find_pair(&s);
        assert!(s.select(a, 0));
        assert_eq!(s.pending(), &[a]);
        assert!(s.select(b, 100));

        assert_eq!(s.moves(), 1);
        assert_eq!(s.matches_found(), 1);
        assert!(!s.is_busy());
        assert!(s.pending().is_empty());
        assert!(s.card(a).unwrap().matched);
        assert!(s.card(a).unwrap().flip.is_locked());
        assert_eq!(s.status(), "Great work, Ada! 1 / 3 pairs found.");

        // Matched cards can't be picked again
        assert!(!s.select(a, 200));
    }

    #[test]
    fn test_mismatch_hides_after_pause() {
        let mut s = session(2, 3);
        let (a, _, other) = find_pair(&s);
        s.select(a, 0);
        s.select(other, 100);
        assert!(s.is_busy());
        assert_eq!(s.moves(), 1);
        assert_eq!(s.status(), "Try again, Ada!");

        // Input stays locked during the pause
        let (_, _, third) = find_pair(&s);
        assert!(!s.select(third, 200));

        crate::sim::tick(&mut s, 899);
        assert!(s.is_busy());
        assert!(s.card(a).unwrap().flip.is_face());

        crate::sim::tick(&mut s, 900);
        assert!(!s.is_busy());
        assert!(s.pending().is_empty());
        assert_eq!(s.card(a).unwrap().flip.state(), FlipState::Hidden);
        assert_eq!(s.card(other).unwrap().flip.state(), FlipState::Hidden);
    }

    #[test]
    fn test_ignored_selections() {
        let mut s = session(3, 3);
        let filler = s.cards().iter().position(Card::is_filler).unwrap();
        assert!(!s.select(filler, 0));
        assert!(!s.select(99, 0));

        let (a, _, _) = find_pair(&s);
        assert!(s.select(a, 0));
        // Same card twice is not a pair
        assert!(!s.select(a, 10));
        assert_eq!(s.pending(), &[a]);
        assert_eq!(s.moves(), 0);
    }

    #[test]
    fn test_flip_events_are_forwarded() {
        let mut s = session(2, 2);
        s.drain_events();
        s.select(0, 0);
        let events = s.drain_events();
        assert_eq!(
            events[0],
            GameEvent::Flip {
                card: 0,
                event: FlipEvent::FlipStart(FlipDirection::ToFace)
            }
        );
        assert!(events.contains(&GameEvent::Flip {
            card: 0,
            event: FlipEvent::Face
        }));
    }

    #[test]
    fn test_win_stops_timer() {
        let mut s = session(2, 2);
        let mut now = 0;
        while !s.is_won() {
            let (a, b, _) = find_pair(&s);
            s.select(a, now);
            s.select(b, now + 100);
            now += 2_500;
        }
        assert!(!s.timer.is_running());
        assert_eq!(s.moves(), 2);
        // Second match at 2600 ms: two whole seconds lost
        assert_eq!(s.elapsed_ms(), 2_600);
        assert_eq!(s.score(), 198);

        let events = s.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::Won(summary) if summary.score == 198))
        );
        assert!(events.contains(&GameEvent::WinPresented));

        // Nothing is selectable after the win
        crate::sim::tick(&mut s, 100_000);
        assert_eq!(s.score(), 198);
    }

    #[test]
    fn test_hide_matched_removes_cards() {
        let setup = PlayerSetup {
            hide_matched: true,
            ..PlayerSetup::new("Ada", 2, 3)
        };
        let mut s = Session::new(&setup, &reduced_settings(), &IconPool::default(), 4).unwrap();
        let (a, b, _) = find_pair(&s);
        s.select(a, 0);
        s.select(b, 0);
        s.drain_events();

        crate::sim::tick(&mut s, 600);
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::CardFading(a)));
        assert!(!s.card(a).unwrap().removed);

        crate::sim::tick(&mut s, 900);
        assert!(s.drain_events().contains(&GameEvent::CardRemoved(b)));
        assert!(s.card(a).unwrap().removed);
        assert!(s.card(b).unwrap().removed);
    }

    #[test]
    fn test_stop_freezes_score() {
        let mut s = session(2, 2);
        s.select(0, 0);
        assert!(s.is_in_progress());
        s.stop(5_400);
        assert_eq!(s.elapsed_ms(), 5_400);
        assert_eq!(s.score(), 195);
    }
}
