//! Best score per board size
//!
//! One record per slot count (rows x columns), stored as JSON under
//! `<namespace>:best:slots-<N>`. Records written under the game's previous
//! name are migrated on first read.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::persistence::KvStore;

/// Best result for one board size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestScoreRecord {
    pub score: u32,
    pub slots: u32,
    pub time_ms: u64,
    pub moves: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

/// Best-score ledger on top of a key-value store
#[derive(Debug, Clone)]
pub struct BestScores<S> {
    store: S,
    namespace: String,
    legacy_namespace: Option<String>,
}

impl<S: KvStore> BestScores<S> {
    pub const NAMESPACE: &'static str = "FlipToMatchGame";
    pub const LEGACY_NAMESPACE: &'static str = "H2Game";

    pub fn new(store: S) -> Self {
        Self::with_namespaces(store, Self::NAMESPACE, Some(Self::LEGACY_NAMESPACE))
    }

    pub fn with_namespaces(store: S, namespace: &str, legacy_namespace: Option<&str>) -> Self {
        Self {
            store,
            namespace: namespace.to_string(),
            legacy_namespace: legacy_namespace.map(str::to_string),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Storage key for a board size
    pub fn key(&self, slots: u32) -> String {
        Self::key_in(&self.namespace, slots)
    }

    fn key_in(namespace: &str, slots: u32) -> String {
        format!("{namespace}:best:slots-{slots}")
    }

    /// Read the record, migrating a legacy key if needed
    pub fn try_load(&mut self, slots: u32) -> Result<Option<BestScoreRecord>, StoreError> {
        let key = self.key(slots);
        let mut raw = self.store.get(&key)?;

        if raw.is_none() {
            if let Some(legacy) = &self.legacy_namespace {
                let legacy_key = Self::key_in(legacy, slots);
                raw = self.store.get(&legacy_key)?;
                if let Some(json) = &raw {
                    log::info!("Migrating best score {legacy_key} -> {key}");
                    if let Err(e) = self.store.set(&key, json) {
                        log::warn!("Best score migration failed: {e}");
                    }
                }
            }
        }

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Read the record; storage problems read as "no record"
    pub fn load(&mut self, slots: u32) -> Option<BestScoreRecord> {
        self.try_load(slots).unwrap_or_else(|e| {
            log::warn!("Could not read best score for {slots} slots: {e}");
            None
        })
    }

    /// Store `candidate` if it beats the current best for its board size.
    ///
    /// Returns the record that is best afterwards, or `None` if storage failed.
    pub fn save_if_higher(&mut self, candidate: BestScoreRecord) -> Option<BestScoreRecord> {
        match self.try_save_if_higher(candidate) {
            Ok(best) => Some(best),
            Err(e) => {
                log::warn!("Could not save best score: {e}");
                None
            }
        }
    }

    fn try_save_if_higher(
        &mut self,
        candidate: BestScoreRecord,
    ) -> Result<BestScoreRecord, StoreError> {
        let slots = candidate.slots;
        // An unreadable record counts as no record and gets replaced
        if let Some(existing) = self.load(slots) {
            if candidate.score <= existing.score {
                return Ok(existing);
            }
        }
        self.store.set(&self.key(slots), &serde_json::to_string(&candidate)?)?;
        log::info!("New best score for {} slots: {}", slots, candidate.score);
        Ok(candidate)
    }

    /// Best score for a board size, if any
    pub fn top_score(&mut self, slots: u32) -> Option<u32> {
        self.load(slots).map(|r| r.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn record(score: u32) -> BestScoreRecord {
        BestScoreRecord {
            score,
            slots: 12,
            time_ms: 30_000,
            moves: 9,
            timestamp: 1,
        }
    }

    #[test]
    fn test_first_save_always_stores() {
        let mut ledger = BestScores::new(MemoryStore::new());
        assert_eq!(ledger.load(12), None);
        assert_eq!(ledger.save_if_higher(record(0)), Some(record(0)));
        assert_eq!(ledger.top_score(12), Some(0));
    }

    #[test]
    fn test_lower_or_equal_never_overwrites() {
        let mut ledger = BestScores::new(MemoryStore::new());
        ledger.save_if_higher(record(500));

        let equal = BestScoreRecord {
            moves: 1,
            ..record(500)
        };
        assert_eq!(ledger.save_if_higher(equal), Some(record(500)));
        assert_eq!(ledger.save_if_higher(record(120)), Some(record(500)));
        assert_eq!(ledger.load(12), Some(record(500)));

        assert_eq!(ledger.save_if_higher(record(501)), Some(record(501)));
        assert_eq!(ledger.top_score(12), Some(501));
    }

    #[test]
    fn test_keys_per_board_size() {
        let mut ledger = BestScores::new(MemoryStore::new());
        ledger.save_if_higher(record(300));
        assert_eq!(ledger.key(12), "FlipToMatchGame:best:slots-12");
        assert_eq!(ledger.load(9), None);
    }

    #[test]
    fn test_legacy_key_migrates() {
        let mut store = MemoryStore::new();
        store
            .set(
                "H2Game:best:slots-12",
                r#"{"score":410,"slots":12,"timeMs":21000,"moves":8,"timestamp":5}"#,
            )
            .unwrap();

        let mut ledger = BestScores::new(store);
        let best = ledger.load(12).unwrap();
        assert_eq!(best.score, 410);
        assert!(ledger.store().get("FlipToMatchGame:best:slots-12").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_record_reads_as_none() {
        let mut store = MemoryStore::new();
        store.set("FlipToMatchGame:best:slots-12", "garbage").unwrap();
        let mut ledger = BestScores::new(store);
        assert_eq!(ledger.load(12), None);
        // Replaced by the next save
        assert_eq!(ledger.save_if_higher(record(10)), Some(record(10)));
        assert_eq!(ledger.load(12), Some(record(10)));
    }
}
