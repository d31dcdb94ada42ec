use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use techscreen::persistence::{FileStore, KeyValueStore, SnapshotSource, SnapshotStore};
use techscreen::workflows::candidates::{CandidateViewUpdate, SortField, SortOrder};
use techscreen::workflows::interview::scoring::Rating;
use techscreen::workflows::interview::{
    Clock, InterviewController, SessionStatus, TickOutcome, TimerRecovery, Transition,
};
use techscreen::workflows::profile::CandidateProfile;

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn new() -> Arc<Self> {
        let start = Utc
            .with_ymd_and_hms(2025, 3, 14, 15, 0, 0)
            .single()
            .expect("valid start");
        Arc::new(Self(Mutex::new(start)))
    }

    fn advance(&self, seconds: i64) {
        let mut now = self.0.lock().expect("clock mutex poisoned");
        *now = *now + Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex poisoned")
    }
}

fn candidate(name: &str, email: &str) -> CandidateProfile {
    CandidateProfile::new()
        .with_name(name)
        .with_email(email)
        .with_phone("+1 (555) 010-2030")
}

fn boot(
    dir: &tempfile::TempDir,
    clock: Arc<ManualClock>,
) -> (
    InterviewController<FileStore>,
    techscreen::workflows::interview::BootReport,
) {
    InterviewController::boot(
        SnapshotStore::new(FileStore::new(dir.path()), "root"),
        clock,
    )
}

fn run_interview(
    controller: &mut InterviewController<FileStore>,
    clock: &ManualClock,
    answers: &[&str],
) -> Transition {
    assert_eq!(controller.start(), Ok(Transition::Applied));
    let mut last = Transition::Ignored;
    for text in answers {
        clock.advance(5);
        let _ = controller.update_draft(*text);
        last = controller.submit();
    }
    last
}

const STRONG: [&str; 6] = [
    "Props are read-only inputs passed from a parent component, while state is owned by the component and changes through setState or the useState hook; props flow down the tree.",
    "Node uses an event loop with non-blocking async I/O so a single thread can serve many requests; callbacks and promises resume work when the operation completes.",
    "useEffect runs after render; the dependency array controls when it re-runs and the cleanup function handles unmounting. Lifecycle methods like componentDidMount map to it, and hooks keep state logic together.",
    "I would write an Express middleware that validates the JWT from the Authorization header, attaches the user to the request and returns 401 otherwise; tokens are verified with the server secret through this API layer.",
    "I would memoize expensive components with React.memo, use useMemo and useCallback for stable props, virtualize long lists, and split bundles with lazy loading. Profiling with the React profiler finds the render hotspots and I would keep state local to avoid re-renders.",
    "A load balancer in front of stateless app servers, Redis for caching and pub/sub, WebSocket connections for live updates, a sharded database with read replicas, and a queue for delivery so the system scales horizontally and stays available under partition.",
];

#[test]
fn completed_interview_is_ranked_and_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::new();
    let (mut controller, report) = boot(&dir, clock.clone());
    assert_eq!(report.source, SnapshotSource::Empty);

    let strong = candidate("Grace Hopper", "grace@navy.mil");
    let strong_id = strong.id.clone();
    assert!(controller.set_profile(strong).is_ok());
    assert_eq!(
        run_interview(&mut controller, &clock, &STRONG),
        Transition::Completed
    );
    assert_eq!(controller.session().status(), SessionStatus::Complete);
    let _ = controller.reset();

    let weak = candidate("Jane Doe", "jane.doe@x.com");
    assert!(controller.set_profile(weak).is_ok());
    assert_eq!(
        run_interview(&mut controller, &clock, &["", "no idea", "", "", "", ""]),
        Transition::Completed
    );
    drop(controller);

    let (mut restored, report) = boot(&dir, clock.clone());
    assert_eq!(report.source, SnapshotSource::Restored);
    assert!(report.resumption.is_none());
    assert_eq!(restored.candidates().count(), 2);

    let ranked = restored.candidates().filtered_and_sorted();
    assert_eq!(ranked[0].id, strong_id);
    assert!(ranked[0].score_percentage > ranked[1].score_percentage);
    assert_eq!(ranked[1].rating, Rating::NeedsImprovement);

    restored.update_candidate_view(CandidateViewUpdate {
        search: Some("jane".to_string()),
        ..CandidateViewUpdate::default()
    });
    let hits = restored.candidates().filtered_and_sorted();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Jane Doe");

    restored.update_candidate_view(CandidateViewUpdate {
        search: Some(String::new()),
        sort_by: Some(SortField::Name),
        order: Some(SortOrder::Asc),
        ..CandidateViewUpdate::default()
    });
    drop(restored);

    let (reopened, _) = boot(&dir, clock);
    let view = reopened.candidates().current_query();
    assert_eq!(view.sort_by, SortField::Name);
    assert_eq!(view.order, SortOrder::Asc);
    let names: Vec<&str> = reopened
        .candidates()
        .filtered_and_sorted()
        .iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(names, vec!["Grace Hopper", "Jane Doe"]);
}

#[test]
fn restart_mid_question_charges_the_downtime_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::new();
    let (mut controller, _) = boot(&dir, clock.clone());
    assert!(controller.set_profile(candidate("Ada Lovelace", "ada@example.org")).is_ok());
    assert_eq!(controller.start(), Ok(Transition::Applied));
    let generation = controller.generation();
    for _ in 0..4 {
        clock.advance(1);
        assert!(matches!(
            controller.tick(generation),
            TickOutcome::Counted { .. }
        ));
    }
    let _ = controller.update_draft("components");
    drop(controller);

    clock.advance(6);
    let (restored, report) = boot(&dir, clock.clone());
    let resumption = report.resumption.expect("active session resumes");
    assert_eq!(
        resumption.recovery,
        TimerRecovery::Resumed {
            elapsed_seconds: 6,
            remaining_seconds: 10
        }
    );
    assert_eq!(restored.session().current_draft(), "components");
    drop(restored);

    let (again, report) = boot(&dir, clock);
    let resumption = report.resumption.expect("still active");
    assert_eq!(resumption.recovery.remaining_seconds(), 10);
    assert_eq!(again.session().time_remaining_seconds(), 10);
}

#[test]
fn restart_after_an_hour_auto_submits_the_current_question() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::new();
    let (mut controller, _) = boot(&dir, clock.clone());
    assert!(controller.set_profile(candidate("Ada Lovelace", "ada@example.org")).is_ok());
    assert_eq!(controller.start(), Ok(Transition::Applied));
    drop(controller);

    clock.advance(2 * 3600);
    let (restored, report) = boot(&dir, clock);
    let resumption = report.resumption.expect("active session resumes");
    assert!(matches!(resumption.recovery, TimerRecovery::Expired { .. }));
    assert_eq!(
        resumption.auto_submitted,
        Some(Transition::Advanced { index: 1 })
    );
    assert_eq!(restored.session().answers().len(), 1);
    assert_eq!(restored.session().answers()[0].time_spent_seconds, 20);
}

#[test]
fn corrupt_snapshot_boots_fresh_with_a_warning() {
    let dir = tempfile::tempdir().expect("tempdir");
    FileStore::new(dir.path())
        .put("root", "{\"version\":1,\"interview\":{\"status\":\"active\"")
        .expect("seed file");

    let (controller, report) = boot(&dir, ManualClock::new());
    assert_eq!(report.source, SnapshotSource::Discarded);
    assert_eq!(
        report.warning.as_deref(),
        Some("Saved data is corrupted. Starting fresh session.")
    );
    assert_eq!(controller.session().status(), SessionStatus::NotStarted);
    assert_eq!(controller.candidates().count(), 0);
}
