//! Persistence collaborators
//!
//! - `store`: key-value storage (memory, JSON file, LocalStorage)
//! - `records`: append-only log of game lifecycle records
//! - `sink`: fire-and-forget submission of records to a server
//!
//! Callers treat every failure as non-fatal: gameplay never waits on or
//! changes because of storage or network outcomes.

pub mod records;
pub mod sink;
pub mod store;

pub use records::{GameRecord, KvResultLog, MemoryResultLog, RecordStatus, ResultLog, StoredRecord};
pub use sink::{NullSink, ResultSink};
pub use store::{KvStore, MemoryStore};

#[cfg(not(target_arch = "wasm32"))]
pub use records::JsonlResultLog;
#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStore;

#[cfg(target_arch = "wasm32")]
pub use sink::HttpSink;
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorage;
