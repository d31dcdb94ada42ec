//! Durable storage for the whole application tree: candidate profile, live interview and the
//! results store, saved as one JSON snapshot under a single key.

mod snapshot;
mod storage;

pub use snapshot::{
    validate_snapshot, AppSnapshot, IntegrityError, LoadOutcome, SnapshotSource, SnapshotStore,
    SNAPSHOT_VERSION,
};
pub use storage::{storage_warning, FileStore, KeyValueStore, MemoryStore, StorageError};
