//! Game controller
//!
//! Owns the current `Session` and the collaborators around it. Input and
//! time go to the session; lifecycle events come back out, and the
//! controller turns them into best-score updates and result records.
//! Storage and network failures are logged and never reach the caller.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::SetupError;
use crate::highscores::{BestScoreRecord, BestScores};
use crate::persistence::{
    GameRecord, KvStore, MemoryResultLog, MemoryStore, NullSink, RecordStatus, ResultLog,
    ResultSink,
};
use crate::platform::{Clock, SystemClock};
use crate::settings::Settings;
use crate::sim::{self, GameEvent, IconPool, PlayerSetup, Session, SessionSummary, validate_grid};

/// Everything the controller talks to outside the session
#[derive(Debug, Clone)]
pub struct Collaborators<S, L, K, C> {
    pub store: S,
    pub log: L,
    pub sink: K,
    pub clock: C,
}

impl Collaborators<MemoryStore, MemoryResultLog, NullSink, SystemClock> {
    /// Nothing leaves the process
    pub fn in_memory() -> Self {
        Self {
            store: MemoryStore::new(),
            log: MemoryResultLog::new(),
            sink: NullSink,
            clock: SystemClock,
        }
    }
}

/// Boxed collaborators, for picking implementations at runtime
pub type DynCollaborators =
    Collaborators<Box<dyn KvStore>, Box<dyn ResultLog>, Box<dyn ResultSink>, Box<dyn Clock>>;

/// Controller over boxed collaborators
pub type DynGame = Game<Box<dyn KvStore>, Box<dyn ResultLog>, Box<dyn ResultSink>, Box<dyn Clock>>;

/// Top-level game: one session at a time plus its bookkeeping
pub struct Game<S, L, K, C> {
    settings: Settings,
    pool: IconPool,
    ledger: BestScores<S>,
    log: L,
    sink: K,
    clock: C,
    rng: Pcg32,
    session: Option<Session>,
    /// Best record after the last win, for the win screen
    last_best: Option<BestScoreRecord>,
    outbox: Vec<GameEvent>,
}

impl<S, L, K, C> Game<S, L, K, C>
where
    S: KvStore,
    L: ResultLog,
    K: ResultSink,
    C: Clock,
{
    /// `seed` drives every deck dealt by this controller
    pub fn new(
        settings: Settings,
        pool: IconPool,
        collaborators: Collaborators<S, L, K, C>,
        seed: u64,
    ) -> Self {
        let Collaborators {
            store,
            log,
            sink,
            clock,
        } = collaborators;
        Self {
            settings,
            pool,
            ledger: BestScores::new(store),
            log,
            sink,
            clock,
            rng: Pcg32::seed_from_u64(seed),
            session: None,
            last_best: None,
            outbox: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings. The game in progress keeps its own copy;
    /// the next `start` uses the new ones.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn ledger(&self) -> &BestScores<S> {
        &self.ledger
    }

    pub fn last_best(&self) -> Option<&BestScoreRecord> {
        self.last_best.as_ref()
    }

    /// Start a new game, replacing the current one.
    ///
    /// The grid is checked first; on error the current session is untouched.
    /// A session still in progress is recorded as abandoned.
    pub fn start(&mut self, setup: &PlayerSetup, now: u64) -> Result<&Session, SetupError> {
        validate_grid(setup.rows, setup.columns, self.pool.len())?;

        self.abandon(now);
        let seed = self.rng.random::<u64>();
        let session = Session::new(setup, &self.settings, &self.pool, seed)?;
        self.last_best = None;
        self.outbox.clear();
        self.record(RecordStatus::Started, &session.summary());

        let session = self.session.insert(session);
        self.outbox.extend(session.drain_events());
        Ok(&*session)
    }

    /// Forward a card pick. Returns false if the session ignored it.
    pub fn select(&mut self, index: usize, now: u64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let accepted = session.select(index, now);
        self.collect();
        accepted
    }

    /// Forward a finished half-rotation from the renderer
    pub fn segment_complete(&mut self, index: usize, now: u64) {
        if let Some(session) = self.session.as_mut() {
            session.segment_complete(index, now);
            self.collect();
        }
    }

    /// Advance time and hand back every event raised since the last call
    pub fn tick(&mut self, now: u64) -> Vec<GameEvent> {
        if let Some(session) = self.session.as_mut() {
            sim::tick(session, now);
            self.collect();
        }
        std::mem::take(&mut self.outbox)
    }

    /// End a game in progress. Returns true if one was abandoned.
    pub fn abandon(&mut self, now: u64) -> bool {
        let summary = match self.session.as_mut() {
            Some(session) if session.is_in_progress() => {
                session.stop(now);
                session.summary()
            }
            _ => return false,
        };
        log::info!(
            "{} abandoned a {}x{} game after {} moves",
            summary.name,
            summary.rows,
            summary.columns,
            summary.moves
        );
        self.record(RecordStatus::Abandoned, &summary);
        self.session = None;
        true
    }

    /// Best record for a board size
    pub fn best(&mut self, slots: u32) -> Option<BestScoreRecord> {
        self.ledger.load(slots)
    }

    /// Move session events to the outbox, handling the ones with side effects
    fn collect(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let events = session.drain_events();
        for event in &events {
            if let GameEvent::Won(summary) = event {
                self.on_won(summary);
            }
        }
        self.outbox.extend(events);
    }

    fn on_won(&mut self, summary: &SessionSummary) {
        let candidate = BestScoreRecord {
            score: summary.score,
            slots: summary.slots,
            time_ms: summary.time_ms,
            moves: summary.moves,
            timestamp: self.clock.now_ms(),
        };
        self.last_best = self.ledger.save_if_higher(candidate);
        self.record(RecordStatus::Completed, summary);
    }

    fn record(&mut self, status: RecordStatus, summary: &SessionSummary) {
        let timestamp = self.clock.now_ms();
        let record = match status {
            RecordStatus::Started => GameRecord::started(summary, timestamp),
            _ => GameRecord::from_summary(status, summary, timestamp),
        };
        match self.log.append(&record) {
            Ok(id) => log::debug!("Recorded {:?} result #{id}", status),
            Err(e) => log::warn!("Could not record {:?} result: {e}", status),
        }
        self.sink.submit(&record);
    }
}
