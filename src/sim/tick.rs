//! Cooperative session loop
//!
//! Everything time-based runs from `tick`: card transitions, delayed actions
//! and the score timer. Callers invoke it from a single thread, typically on
//! every animation frame or timer interval.

use super::session::Session;

#[derive(Debug, Clone)]
struct Scheduled<A> {
    due: u64,
    seq: u64,
    action: A,
}

/// Delayed actions, released in due-time order (ties in scheduling order)
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    queue: Vec<Scheduled<A>>,
    next_seq: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: u64, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { due, seq, action });
    }

    /// Remove and return the earliest action due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<A> {
        let pos = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= now)
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(i, _)| i)?;
        Some(self.queue.remove(pos).action)
    }

    /// Time of the earliest pending action
    pub fn next_due(&self) -> Option<u64> {
        self.queue.iter().map(|s| s.due).min()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Advance the session to `now`
pub fn tick(session: &mut Session, now: u64) {
    session.advance_cards(now);

    while let Some(action) = session.scheduler.pop_due(now) {
        session.run_action(action, now);
    }

    // Mismatched cards that were still animating when their pause ended
    session.retry_hiding(now);

    if session.timer.is_running() {
        let interval = session.settings.effective_timer_interval();
        if now >= session.last_timer_tick.saturating_add(interval) {
            session.timer.tick(now);
            session.last_timer_tick = now;
            session.refresh_score();
        }
    }
}
