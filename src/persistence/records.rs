//! Game lifecycle records
//!
//! One record is appended when a game starts, completes or is abandoned.
//! Logs are append-only and hand out increasing ids.

use serde::{Deserialize, Serialize};

use super::store::KvStore;
use crate::error::StoreError;
use crate::sim::SessionSummary;

/// Lifecycle event a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Started,
    Completed,
    Abandoned,
}

/// A single result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub status: RecordStatus,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub rows: u32,
    pub columns: u32,
    pub hide_matched: bool,
    pub slots: u32,
    pub score: u32,
    pub max_score: u32,
    pub time_ms: u64,
    pub moves: u32,
    /// Unix time (ms)
    pub timestamp: u64,
}

impl GameRecord {
    pub fn from_summary(status: RecordStatus, summary: &SessionSummary, timestamp: u64) -> Self {
        Self {
            status,
            name: summary.name.clone(),
            email: summary.email.clone(),
            rows: summary.rows,
            columns: summary.columns,
            hide_matched: summary.hide_matched,
            slots: summary.slots,
            score: summary.score,
            max_score: summary.max_score,
            time_ms: summary.time_ms,
            moves: summary.moves,
            timestamp,
        }
    }

    /// Record of a game that has just been dealt: nothing scored yet
    pub fn started(summary: &SessionSummary, timestamp: u64) -> Self {
        Self {
            score: 0,
            time_ms: 0,
            moves: 0,
            ..Self::from_summary(RecordStatus::Started, summary, timestamp)
        }
    }
}

/// A record with the id the log assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: u64,
    #[serde(flatten)]
    pub record: GameRecord,
}

/// Append-only record store
pub trait ResultLog {
    /// Append a record, returning its id
    fn append(&mut self, record: &GameRecord) -> Result<u64, StoreError>;
}

impl<L: ResultLog + ?Sized> ResultLog for Box<L> {
    fn append(&mut self, record: &GameRecord) -> Result<u64, StoreError> {
        (**self).append(record)
    }
}

/// In-process log
#[derive(Debug, Clone, Default)]
pub struct MemoryResultLog {
    entries: Vec<StoredRecord>,
}

impl MemoryResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[StoredRecord] {
        &self.entries
    }

    pub fn with_status(&self, status: RecordStatus) -> impl Iterator<Item = &GameRecord> {
        self.entries
            .iter()
            .map(|e| &e.record)
            .filter(move |r| r.status == status)
    }
}

impl ResultLog for MemoryResultLog {
    fn append(&mut self, record: &GameRecord) -> Result<u64, StoreError> {
        let id = self.entries.len() as u64 + 1;
        self.entries.push(StoredRecord {
            id,
            record: record.clone(),
        });
        Ok(id)
    }
}

/// Log kept as a JSON array under one key of a `KvStore`
#[derive(Debug, Clone)]
pub struct KvResultLog<S> {
    store: S,
    key: String,
}

impl<S: KvStore> KvResultLog<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn load(&self) -> Result<Vec<StoredRecord>, StoreError> {
        match self.store.get(&self.key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

impl<S: KvStore> ResultLog for KvResultLog<S> {
    fn append(&mut self, record: &GameRecord) -> Result<u64, StoreError> {
        let mut entries = self.load()?;
        let id = entries.last().map(|e| e.id + 1).unwrap_or(1);
        entries.push(StoredRecord {
            id,
            record: record.clone(),
        });
        self.store.set(&self.key, &serde_json::to_string(&entries)?)?;
        Ok(id)
    }
}

/// One JSON object per line (native)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct JsonlResultLog {
    path: std::path::PathBuf,
    next_id: u64,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonlResultLog {
    /// Open (or create on first append) the log at `path`
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let next_id = match std::fs::read_to_string(&path) {
            Ok(text) => text.lines().filter(|l| !l.trim().is_empty()).count() as u64 + 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 1,
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, next_id })
    }

    pub fn load(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ResultLog for JsonlResultLog {
    fn append(&mut self, record: &GameRecord) -> Result<u64, StoreError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entry = StoredRecord {
            id: self.next_id,
            record: record.clone(),
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&entry)?)?;
        self.next_id += 1;
        Ok(entry.id)
    }
}
