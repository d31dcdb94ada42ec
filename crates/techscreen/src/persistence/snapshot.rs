use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::storage::{storage_warning, KeyValueStore, StorageError};
use crate::workflows::candidates::{CandidateQuery, CandidateRecord};
use crate::workflows::interview::domain::SessionStatus;
use crate::workflows::interview::InterviewSession;
use crate::workflows::profile::CandidateProfile;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub version: u32,
    #[serde(default)]
    pub profile: Option<CandidateProfile>,
    #[serde(default)]
    pub interview: InterviewSession,
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
    #[serde(default)]
    pub candidate_view: CandidateQuery,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            profile: None,
            interview: InterviewSession::default(),
            candidates: Vec::new(),
            candidate_view: CandidateQuery::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid candidate id '{0}'")]
    InvalidCandidateId(String),
    #[error("interview session is inconsistent: {0}")]
    Session(&'static str),
    #[error("interview session does not belong to the stored profile")]
    ProfileMismatch,
    #[error("candidate '{0}' has a negative or non-finite score")]
    InvalidScore(String),
    #[error("candidate '{0}' has a score percentage above 100")]
    InvalidPercentage(String),
}

/// Rejects the snapshot on the first rule it breaks.
pub fn validate_snapshot(snapshot: &AppSnapshot) -> Result<(), IntegrityError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(IntegrityError::UnsupportedVersion(snapshot.version));
    }

    if let Some(profile) = &snapshot.profile {
        ensure_uuid(profile.id.as_str())?;
    }

    if let Some(reason) = snapshot.interview.invariant_violation() {
        return Err(IntegrityError::Session(reason));
    }
    if snapshot.interview.status() != SessionStatus::NotStarted {
        let owner = snapshot.profile.as_ref().map(|profile| &profile.id);
        if owner.is_none() || owner != snapshot.interview.candidate_id() {
            return Err(IntegrityError::ProfileMismatch);
        }
    }

    for record in &snapshot.candidates {
        ensure_uuid(record.id.as_str())?;
        let scores_valid = valid_score(record.final_score)
            && record
                .scores
                .iter()
                .all(|score| valid_score(score.weighted_score));
        if !scores_valid {
            return Err(IntegrityError::InvalidScore(record.id.to_string()));
        }
        if record.score_percentage > 100 {
            return Err(IntegrityError::InvalidPercentage(record.id.to_string()));
        }
    }
    Ok(())
}

fn valid_score(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Hyphenated RFC 4122 UUID, versions 1 through 5.
fn ensure_uuid(raw: &str) -> Result<(), IntegrityError> {
    let valid = raw.len() == 36
        && Uuid::parse_str(raw).is_ok_and(|id| {
            (1..=5).contains(&id.get_version_num()) && id.get_variant() == uuid::Variant::RFC4122
        });
    if valid {
        Ok(())
    } else {
        Err(IntegrityError::InvalidCandidateId(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Nothing stored yet.
    Empty,
    Restored,
    /// Stored data could not be used and was ignored.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub snapshot: AppSnapshot,
    pub source: SnapshotSource,
    pub warning: Option<String>,
}

impl LoadOutcome {
    fn fresh(source: SnapshotSource, warning: Option<String>) -> Self {
        Self {
            snapshot: AppSnapshot::default(),
            source,
            warning,
        }
    }
}

/// Reads and writes the [`AppSnapshot`] under one key of a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct SnapshotStore<K> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> SnapshotStore<K> {
    pub fn new(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    /// Never fails: unreadable, unparseable or inconsistent data yields a fresh snapshot and
    /// a warning for the user.
    pub fn load(&self) -> LoadOutcome {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadOutcome::fresh(SnapshotSource::Empty, None),
            Err(err) => {
                warn!(key = %self.key, error = %err, "could not read saved state");
                return LoadOutcome::fresh(
                    SnapshotSource::Discarded,
                    Some(storage_warning(&err).to_string()),
                );
            }
        };

        let snapshot = serde_json::from_str::<AppSnapshot>(&raw)
            .map_err(|err| err.to_string())
            .and_then(|snapshot| {
                validate_snapshot(&snapshot)
                    .map(|()| snapshot)
                    .map_err(|err| err.to_string())
            });
        match snapshot {
            Ok(snapshot) => {
                info!(
                    key = %self.key,
                    status = snapshot.interview.status().label(),
                    candidates = snapshot.candidates.len(),
                    "restored saved state"
                );
                LoadOutcome {
                    snapshot,
                    source: SnapshotSource::Restored,
                    warning: None,
                }
            }
            Err(reason) => {
                warn!(key = %self.key, %reason, "discarding saved state");
                let err = StorageError::Corrupted(reason);
                LoadOutcome::fresh(
                    SnapshotSource::Discarded,
                    Some(storage_warning(&err).to_string()),
                )
            }
        }
    }

    pub fn save(&self, snapshot: &AppSnapshot) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(snapshot)
            .map_err(|err| StorageError::Corrupted(err.to_string()))?;
        self.backend.put(&self.key, &encoded)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::workflows::interview::bank::QuestionBank;
    use crate::workflows::interview::domain::{CandidateId, SubmitMode};
    use chrono::{TimeZone, Utc};

    fn profile() -> CandidateProfile {
        CandidateProfile {
            uploaded_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            ..CandidateProfile::new()
                .with_name("Jane Doe")
                .with_email("jane@example.com")
                .with_phone("5551234567")
        }
    }

    fn active_snapshot() -> AppSnapshot {
        let profile = profile();
        let mut interview = InterviewSession::new();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap();
        let _ = interview.start(profile.id.clone(), &QuestionBank::standard(), now);
        let _ = interview.update_draft("useState keeps local state");
        let _ = interview.submit(SubmitMode::Explicit, now);
        AppSnapshot {
            profile: Some(profile),
            interview,
            ..AppSnapshot::default()
        }
    }

    #[test]
    fn saved_snapshot_is_restored() {
        let store = SnapshotStore::new(MemoryStore::new(), "root");
        let snapshot = active_snapshot();
        store.save(&snapshot).unwrap();

        let outcome = store.load();
        assert_eq!(outcome.source, SnapshotSource::Restored);
        assert_eq!(outcome.warning, None);
        assert_eq!(outcome.snapshot, snapshot);
    }

    #[test]
    fn missing_snapshot_is_fresh_without_warning() {
        let outcome = SnapshotStore::new(MemoryStore::new(), "root").load();
        assert_eq!(outcome.source, SnapshotSource::Empty);
        assert_eq!(outcome.warning, None);
        assert_eq!(outcome.snapshot, AppSnapshot::default());
    }

    #[test]
    fn garbage_is_discarded_with_corruption_warning() {
        let backend = MemoryStore::new();
        backend.insert_raw("root", "{not json");
        let outcome = SnapshotStore::new(backend, "root").load();

        assert_eq!(outcome.source, SnapshotSource::Discarded);
        assert_eq!(
            outcome.warning.as_deref(),
            Some("Saved data is corrupted. Starting fresh session.")
        );
    }

    #[test]
    fn unparseable_timestamp_counts_as_corruption() {
        let backend = MemoryStore::new();
        let store = SnapshotStore::new(backend.clone(), "root");
        store.save(&active_snapshot()).unwrap();
        let tampered = backend
            .raw("root")
            .unwrap()
            .replace("2024-05-01T12:00:00Z", "yesterday");
        backend.insert_raw("root", tampered);

        assert_eq!(store.load().source, SnapshotSource::Discarded);
    }

    #[test]
    fn unreadable_backend_degrades_to_fresh_state() {
        let backend = MemoryStore::new();
        backend.set_access_denied(true);
        let outcome = SnapshotStore::new(backend, "root").load();

        assert_eq!(outcome.source, SnapshotSource::Discarded);
        assert_eq!(
            outcome.warning.as_deref(),
            Some("Unable to access storage. Please check the data directory permissions.")
        );
    }

    #[test]
    fn integrity_rules() {
        let mut snapshot = active_snapshot();
        assert_eq!(validate_snapshot(&snapshot), Ok(()));

        snapshot.version = 7;
        assert_eq!(
            validate_snapshot(&snapshot),
            Err(IntegrityError::UnsupportedVersion(7))
        );

        let mut bad_id = active_snapshot();
        if let Some(profile) = bad_id.profile.as_mut() {
            profile.id = CandidateId("candidate-1".into());
        }
        assert_eq!(
            validate_snapshot(&bad_id),
            Err(IntegrityError::InvalidCandidateId("candidate-1".into()))
        );

        let orphan = AppSnapshot {
            profile: None,
            ..active_snapshot()
        };
        assert_eq!(validate_snapshot(&orphan), Err(IntegrityError::ProfileMismatch));
    }

    #[test]
    fn save_over_quota_reports_quota_and_keeps_nothing() {
        let store = SnapshotStore::new(MemoryStore::with_quota(128), "root");
        let err = store.save(&active_snapshot()).expect_err("snapshot exceeds quota");

        assert_eq!(err, StorageError::QuotaExceeded);
        assert_eq!(
            storage_warning(&err),
            "Storage quota exceeded. Please clear saved data or use a smaller resume file."
        );
        assert_eq!(store.load().source, SnapshotSource::Empty);
    }

    #[test]
    fn snapshot_without_candidate_view_uses_default_view() {
        let backend = MemoryStore::new();
        let mut encoded = serde_json::to_value(active_snapshot()).unwrap();
        encoded
            .as_object_mut()
            .unwrap()
            .remove("candidate_view");
        backend.insert_raw("root", encoded.to_string());

        let outcome = SnapshotStore::new(backend, "root").load();
        assert_eq!(outcome.source, SnapshotSource::Restored);
        assert_eq!(outcome.snapshot.candidate_view, CandidateQuery::default());
    }

    #[test]
    fn non_v4_ids_follow_version_rules() {
        assert!(ensure_uuid("123e4567-e89b-12d3-a456-426614174000").is_ok());
        assert!(ensure_uuid("123e4567e89b12d3a456426614174000").is_err());
        assert!(ensure_uuid("123e4567-e89b-72d3-a456-426614174000").is_err());
    }
}
