use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::bank::QuestionBank;
use super::domain::{CandidateId, SessionStatus, SubmitMode, Transition};
use super::session::InterviewSession;
use super::timer::TimerRecovery;
use super::views::SessionView;
use crate::persistence::{
    storage_warning, AppSnapshot, KeyValueStore, SnapshotSource, SnapshotStore, StorageError,
    SNAPSHOT_VERSION,
};
use crate::workflows::candidates::{
    CandidateRecord, CandidateResultsStore, CandidateViewUpdate, UpsertOutcome,
};
use crate::workflows::profile::{validate_profile, CandidateProfile, ProfileValidationErrors};

/// Wall-clock source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub type SharedController<K> = Arc<Mutex<InterviewController<K>>>;

/// What happened while rehydrating saved state.
#[derive(Debug, Clone, Serialize)]
pub struct BootReport {
    pub source: SnapshotSource,
    pub warning: Option<String>,
    pub resumption: Option<Resumption>,
}

/// Outcome of the one-shot timer reconciliation for a session that was active at shutdown.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Resumption {
    pub recovery: TimerRecovery,
    pub auto_submitted: Option<Transition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tick", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Issued for a session that has since been reset or restarted.
    Stale,
    Inactive,
    Counted { remaining_seconds: u32 },
    AutoSubmitted { transition: Transition },
}

impl TickOutcome {
    /// Whether a periodic tick source should keep running after this outcome.
    pub fn keeps_ticking(self) -> bool {
        match self {
            Self::Counted { .. } => true,
            Self::AutoSubmitted { transition } => !matches!(transition, Transition::Completed),
            Self::Stale | Self::Inactive => false,
        }
    }
}

/// Owner of the single live interview. Every mutation goes through here so that
/// completions reach the results store and the snapshot is rewritten afterwards.
pub struct InterviewController<K> {
    bank: QuestionBank,
    session: InterviewSession,
    profile: Option<CandidateProfile>,
    candidates: CandidateResultsStore,
    generation: u64,
    snapshots: SnapshotStore<K>,
    clock: Arc<dyn Clock>,
    storage_warning: Option<String>,
}

impl<K: KeyValueStore> InterviewController<K> {
    /// Loads saved state, then runs the resumption step for a session that was mid-question.
    /// No other operation can observe the controller before this returns.
    pub fn boot(snapshots: SnapshotStore<K>, clock: Arc<dyn Clock>) -> (Self, BootReport) {
        Self::boot_with_bank(snapshots, clock, QuestionBank::standard())
    }

    pub fn boot_with_bank(
        snapshots: SnapshotStore<K>,
        clock: Arc<dyn Clock>,
        bank: QuestionBank,
    ) -> (Self, BootReport) {
        let loaded = snapshots.load();
        let AppSnapshot {
            profile,
            interview,
            candidates,
            candidate_view,
            ..
        } = loaded.snapshot;

        let mut controller = Self {
            bank,
            session: interview,
            profile,
            candidates: CandidateResultsStore::restore(candidates, candidate_view),
            generation: 0,
            snapshots,
            clock,
            storage_warning: loaded.warning.clone(),
        };

        let resumption = controller.resume();
        let report = BootReport {
            source: loaded.source,
            warning: loaded.warning,
            resumption,
        };
        (controller, report)
    }

    fn resume(&mut self) -> Option<Resumption> {
        let now = self.clock.now();
        let recovery = self.session.resume_timer(now)?;
        info!(
            ?recovery,
            question = self.session.progress().0,
            "resuming interview after restart"
        );

        let auto_submitted = if recovery.is_exhausted() {
            Some(self.submit_with(SubmitMode::Auto))
        } else {
            self.persist();
            None
        };
        Some(Resumption {
            recovery,
            auto_submitted,
        })
    }

    /// Stores the candidate profile after checking it. Only allowed before a session starts.
    pub fn set_profile(
        &mut self,
        profile: CandidateProfile,
    ) -> Result<Transition, ProfileValidationErrors> {
        validate_profile(&profile)?;
        if self.session.status() != SessionStatus::NotStarted {
            return Ok(Transition::Ignored);
        }
        info!(candidate = %profile.id, "candidate profile accepted");
        self.profile = Some(profile);
        self.persist();
        Ok(Transition::Applied)
    }

    pub fn start(&mut self) -> Result<Transition, ProfileValidationErrors> {
        let profile = self.profile.clone().unwrap_or_default();
        validate_profile(&profile)?;

        let candidate_id = profile.id;
        let transition = self
            .session
            .start(candidate_id.clone(), &self.bank, self.clock.now());
        if transition.is_applied() {
            self.generation += 1;
            info!(candidate = %candidate_id, generation = self.generation, "interview started");
            self.persist();
        }
        Ok(transition)
    }

    pub fn update_draft(&mut self, text: impl Into<String>) -> Transition {
        let transition = self.session.update_draft(text);
        if transition.is_applied() {
            debug!(chars = self.session.current_draft().len(), "draft updated");
            self.persist();
        }
        transition
    }

    /// Explicit submission of the current draft.
    pub fn submit(&mut self) -> Transition {
        self.submit_with(SubmitMode::Explicit)
    }

    /// One countdown second from a tick source stamped with `generation`.
    ///
    /// Plain ticks are not persisted: the saved checkpoint plus remaining time already pins
    /// the question deadline, so a restart recovers the same remaining time.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation {
            return TickOutcome::Stale;
        }
        if !self.session.is_active() {
            return TickOutcome::Inactive;
        }

        let _ = self.session.tick();
        let remaining_seconds = self.session.time_remaining_seconds();
        if remaining_seconds > 0 {
            return TickOutcome::Counted { remaining_seconds };
        }
        TickOutcome::AutoSubmitted {
            transition: self.submit_with(SubmitMode::Auto),
        }
    }

    pub fn rescore(&mut self) -> Transition {
        let transition = self.session.rescore();
        if transition.is_applied() {
            self.record_completion();
            self.persist();
        }
        transition
    }

    /// Clears the session and profile; completed results are kept. Ticks stamped with the
    /// previous generation become stale.
    pub fn reset(&mut self) -> Transition {
        let transition = self.session.reset();
        self.profile = None;
        self.generation += 1;
        info!(generation = self.generation, "interview reset");
        self.persist();
        transition
    }

    pub fn remove_candidate(&mut self, id: &CandidateId) -> Option<CandidateRecord> {
        let removed = self.candidates.remove(id)?;
        info!(candidate = %id, "candidate removed");
        self.persist();
        Some(removed)
    }

    /// Changes the saved search, filter or sort of the results table.
    pub fn update_candidate_view(&mut self, update: CandidateViewUpdate) {
        if self.candidates.apply_view(update) {
            debug!(view = ?self.candidates.current_query(), "candidate view changed");
            self.persist();
        }
    }

    pub fn clear_candidates(&mut self) -> usize {
        let count = self.candidates.count();
        self.candidates.clear();
        info!(count, "candidate results cleared");
        self.persist();
        count
    }

    /// Drops everything, including the stored snapshot.
    pub fn purge(&mut self) -> Result<(), StorageError> {
        let _ = self.session.reset();
        self.profile = None;
        self.candidates = CandidateResultsStore::new();
        self.generation += 1;
        self.snapshots.clear()?;
        self.storage_warning = None;
        info!("saved state purged");
        Ok(())
    }

    fn submit_with(&mut self, mode: SubmitMode) -> Transition {
        let transition = self.session.submit(mode, self.clock.now());
        match transition {
            Transition::Ignored => return transition,
            Transition::Completed => {
                info!(?mode, "interview completed");
                self.record_completion();
            }
            Transition::Advanced { index } => {
                debug!(?mode, question = index + 1, "advanced to next question");
            }
            Transition::Applied => {}
        }
        self.persist();
        transition
    }

    fn record_completion(&mut self) {
        let Some(profile) = &self.profile else {
            warn!("completed interview has no candidate profile; result not recorded");
            return;
        };
        let Some(record) = CandidateRecord::from_session(profile, &self.session) else {
            return;
        };
        let percentage = record.score_percentage;
        let outcome = self.candidates.upsert(record);
        info!(candidate = %profile.id, percentage, ?outcome, "candidate result recorded");
        if outcome == UpsertOutcome::Replaced {
            debug!(candidate = %profile.id, "existing result replaced");
        }
    }

    fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            version: SNAPSHOT_VERSION,
            profile: self.profile.clone(),
            interview: self.session.clone(),
            candidates: self.candidates.records().to_vec(),
            candidate_view: self.candidates.current_query().clone(),
        }
    }

    /// Writes the whole tree. Failures never undo the transition that triggered the write.
    fn persist(&mut self) {
        match self.snapshots.save(&self.snapshot()) {
            Ok(()) => self.storage_warning = None,
            Err(err) => {
                warn!(error = %err, "could not save interview state");
                self.storage_warning = Some(storage_warning(&err).to_string());
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    pub fn profile(&self) -> Option<&CandidateProfile> {
        self.profile.as_ref()
    }

    pub fn candidates(&self) -> &CandidateResultsStore {
        &self.candidates
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Latest storage problem, cleared by the next successful write.
    pub fn storage_warning(&self) -> Option<&str> {
        self.storage_warning.as_deref()
    }

    pub fn view(&self) -> SessionView {
        SessionView::new(
            &self.session,
            self.profile.as_ref(),
            self.generation,
            self.storage_warning.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use chrono::{Duration, TimeZone};

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(now)))
        }

        fn advance(&self, seconds: i64) {
            let mut guard = self.0.lock().expect("clock mutex poisoned");
            *guard = *guard + Duration::seconds(seconds);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock mutex poisoned")
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn jane() -> CandidateProfile {
        CandidateProfile::new()
            .with_name("Jane Doe")
            .with_email("jane@example.com")
            .with_phone("555-123-4567")
    }

    fn boot(backend: &MemoryStore, clock: Arc<FixedClock>) -> InterviewController<MemoryStore> {
        InterviewController::boot(SnapshotStore::new(backend.clone(), "root"), clock).0
    }

    #[test]
    fn start_requires_a_valid_profile() {
        let backend = MemoryStore::new();
        let mut controller = boot(&backend, FixedClock::at(t0()));

        assert!(controller.start().is_err());
        let invalid = CandidateProfile::new().with_name("J");
        assert!(controller.set_profile(invalid).is_err());
        assert!(controller.profile().is_none());

        assert_eq!(controller.set_profile(jane()), Ok(Transition::Applied));
        assert_eq!(controller.start(), Ok(Transition::Applied));
        assert_eq!(controller.session().status(), SessionStatus::Active);
        assert_eq!(controller.generation(), 1);
    }

    #[test]
    fn ticks_auto_submit_and_advance() {
        let backend = MemoryStore::new();
        let clock = FixedClock::at(t0());
        let mut controller = boot(&backend, clock.clone());
        assert!(controller.set_profile(jane()).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));
        let generation = controller.generation();

        for expected in (1..20).rev() {
            clock.advance(1);
            assert_eq!(
                controller.tick(generation),
                TickOutcome::Counted {
                    remaining_seconds: expected
                }
            );
        }
        clock.advance(1);
        assert_eq!(
            controller.tick(generation),
            TickOutcome::AutoSubmitted {
                transition: Transition::Advanced { index: 1 }
            }
        );

        let answer = &controller.session().answers()[0];
        assert!(answer.auto_submitted);
        assert_eq!(answer.time_spent_seconds, 20);
        assert_eq!(controller.session().time_remaining_seconds(), 20);
    }

    #[test]
    fn stale_generation_is_ignored_after_reset() {
        let backend = MemoryStore::new();
        let mut controller = boot(&backend, FixedClock::at(t0()));
        assert!(controller.set_profile(jane()).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));
        let generation = controller.generation();

        let _ = controller.reset();
        assert_eq!(controller.tick(generation), TickOutcome::Stale);
        assert_eq!(controller.tick(controller.generation()), TickOutcome::Inactive);
        assert!(controller.profile().is_none());
    }

    #[test]
    fn completion_records_candidate_once() {
        let backend = MemoryStore::new();
        let mut controller = boot(&backend, FixedClock::at(t0()));
        let profile = jane();
        let id = profile.id.clone();
        assert!(controller.set_profile(profile).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));

        let mut last = Transition::Ignored;
        while controller.session().is_active() {
            let _ = controller.update_draft("A thoughtful answer about state and props");
            last = controller.submit();
        }
        assert_eq!(last, Transition::Completed);
        assert_eq!(controller.candidates().count(), 1);

        assert_eq!(controller.rescore(), Transition::Applied);
        assert_eq!(controller.candidates().count(), 1);
        let record = controller.candidates().get(&id).expect("recorded");
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.answers.len(), 6);

        assert_eq!(controller.submit(), Transition::Ignored);
    }

    #[test]
    fn every_applied_transition_is_saved() {
        let backend = MemoryStore::new();
        let mut controller = boot(&backend, FixedClock::at(t0()));
        assert!(controller.set_profile(jane()).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));
        let _ = controller.update_draft("hooks");

        let saved = SnapshotStore::new(backend.clone(), "root").load();
        assert_eq!(saved.source, SnapshotSource::Restored);
        assert_eq!(saved.snapshot.interview.current_draft(), "hooks");
    }

    #[test]
    fn write_failures_surface_a_warning_without_undoing_the_transition() {
        let backend = MemoryStore::new();
        let mut controller = boot(&backend, FixedClock::at(t0()));
        assert!(controller.set_profile(jane()).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));

        backend.set_access_denied(true);
        assert_eq!(controller.submit(), Transition::Advanced { index: 1 });
        assert_eq!(
            controller.storage_warning(),
            Some("Unable to access storage. Please check the data directory permissions.")
        );

        backend.set_access_denied(false);
        let _ = controller.update_draft("again");
        assert_eq!(controller.storage_warning(), None);
    }

    #[test]
    fn quota_exhaustion_keeps_the_interview_running() {
        let backend = MemoryStore::with_quota(64);
        let mut controller = boot(&backend, FixedClock::at(t0()));

        assert_eq!(controller.set_profile(jane()), Ok(Transition::Applied));
        assert_eq!(controller.start(), Ok(Transition::Applied));
        assert_eq!(controller.submit(), Transition::Advanced { index: 1 });

        assert_eq!(controller.session().answers().len(), 1);
        assert_eq!(
            controller.storage_warning(),
            Some("Storage quota exceeded. Please clear saved data or use a smaller resume file.")
        );
        assert_eq!(
            controller.view().storage_warning.as_deref(),
            controller.storage_warning()
        );
        assert!(backend.raw("root").is_none());
    }

    #[test]
    fn candidate_view_changes_are_saved() {
        let backend = MemoryStore::new();
        let mut controller = boot(&backend, FixedClock::at(t0()));
        controller.update_candidate_view(CandidateViewUpdate {
            search: Some("jane".to_string()),
            ..CandidateViewUpdate::default()
        });

        let saved = SnapshotStore::new(backend.clone(), "root").load();
        assert_eq!(saved.snapshot.candidate_view.search, "jane");

        let rebooted = boot(&backend, FixedClock::at(t0()));
        assert_eq!(rebooted.candidates().current_query().search, "jane");
    }

    #[test]
    fn reboot_charges_downtime_against_the_current_question() {
        let backend = MemoryStore::new();
        let clock = FixedClock::at(t0());
        let mut controller = boot(&backend, clock.clone());
        assert!(controller.set_profile(jane()).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));
        let generation = controller.generation();
        for _ in 0..5 {
            clock.advance(1);
            let _ = controller.tick(generation);
        }
        drop(controller);

        clock.advance(7);
        let (rebooted, report) =
            InterviewController::boot(SnapshotStore::new(backend.clone(), "root"), clock.clone());
        let resumption = report.resumption.expect("active session resumes");
        assert_eq!(
            resumption.recovery,
            TimerRecovery::Resumed {
                elapsed_seconds: 12,
                remaining_seconds: 8
            }
        );
        assert_eq!(resumption.auto_submitted, None);
        assert_eq!(rebooted.session().time_remaining_seconds(), 8);
    }

    #[test]
    fn reboot_after_deadline_auto_submits() {
        let backend = MemoryStore::new();
        let clock = FixedClock::at(t0());
        let mut controller = boot(&backend, clock.clone());
        assert!(controller.set_profile(jane()).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));
        let _ = controller.update_draft("partial");
        drop(controller);

        clock.advance(45);
        let (rebooted, report) =
            InterviewController::boot(SnapshotStore::new(backend.clone(), "root"), clock);
        let resumption = report.resumption.expect("active session resumes");
        assert!(resumption.recovery.is_exhausted());
        assert_eq!(
            resumption.auto_submitted,
            Some(Transition::Advanced { index: 1 })
        );
        let answer = &rebooted.session().answers()[0];
        assert_eq!(answer.text, "partial");
        assert!(answer.auto_submitted);
    }
}
