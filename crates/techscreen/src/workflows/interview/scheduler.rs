use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::controller::{SharedController, TickOutcome};
use crate::persistence::KeyValueStore;

/// Drives the countdown of the active session once per `period`.
///
/// `generation` must be read under the same lock that started or resumed the session. The
/// task exits on the first tick that is stale, finds the session inactive, or completes the
/// interview. Returns `None` when the session is not active or `generation` is already stale.
pub fn spawn_ticker<K>(
    controller: SharedController<K>,
    generation: u64,
    period: Duration,
) -> Option<JoinHandle<()>>
where
    K: KeyValueStore + 'static,
{
    {
        let guard = controller.lock().expect("controller mutex poisoned");
        if !guard.session().is_active() || guard.generation() != generation {
            debug!(
                generation,
                current = guard.generation(),
                "no ticker spawned"
            );
            return None;
        }
    }

    Some(tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let outcome = controller
                .lock()
                .expect("controller mutex poisoned")
                .tick(generation);
            if !outcome.keeps_ticking() {
                debug!(generation, ?outcome, "ticker stopped");
                break;
            }
            if let TickOutcome::AutoSubmitted { transition } = outcome {
                debug!(generation, ?transition, "question timed out");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::persistence::{MemoryStore, SnapshotStore};
    use crate::workflows::interview::controller::{InterviewController, SystemClock};
    use crate::workflows::interview::domain::{SessionStatus, Transition};
    use crate::workflows::profile::CandidateProfile;

    fn jane() -> CandidateProfile {
        CandidateProfile::new()
            .with_name("Jane Doe")
            .with_email("jane@example.com")
            .with_phone("5551234567")
    }

    fn started() -> (SharedController<MemoryStore>, u64) {
        let (mut controller, _) = InterviewController::boot(
            SnapshotStore::new(MemoryStore::new(), "root"),
            Arc::new(SystemClock),
        );
        assert!(controller.set_profile(jane()).is_ok());
        assert_eq!(controller.start(), Ok(Transition::Applied));
        let generation = controller.generation();
        (Arc::new(Mutex::new(controller)), generation)
    }

    #[tokio::test(start_paused = true)]
    async fn first_question_times_out_after_its_limit() {
        let (controller, generation) = started();
        let handle =
            spawn_ticker(controller.clone(), generation, Duration::from_secs(1)).expect("active");

        tokio::time::sleep(Duration::from_millis(20_500)).await;
        {
            let guard = controller.lock().unwrap();
            assert_eq!(guard.session().answers().len(), 1);
            assert!(guard.session().answers()[0].auto_submitted);
            assert_eq!(guard.session().time_remaining_seconds(), 20);
        }
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_exits_once_the_session_is_reset() {
        let (controller, generation) = started();
        let handle =
            spawn_ticker(controller.clone(), generation, Duration::from_secs(1)).expect("active");

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let _ = controller.lock().unwrap().reset();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(handle.is_finished());
        let guard = controller.lock().unwrap();
        assert_eq!(guard.session().status(), SessionStatus::NotStarted);
    }

    #[test]
    fn nothing_to_drive_without_an_active_session() {
        let (controller, _) = InterviewController::boot(
            SnapshotStore::new(MemoryStore::new(), "root"),
            Arc::new(SystemClock),
        );
        let generation = controller.generation();
        let shared = Arc::new(Mutex::new(controller));
        assert!(spawn_ticker(shared, generation, Duration::from_secs(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn late_spawn_for_a_replaced_session_does_not_double_the_countdown() {
        let (controller, first_generation) = started();

        let second_generation = {
            let mut guard = controller.lock().unwrap();
            let _ = guard.reset();
            assert!(guard.set_profile(jane()).is_ok());
            assert_eq!(guard.start(), Ok(Transition::Applied));
            guard.generation()
        };
        let current = spawn_ticker(controller.clone(), second_generation, Duration::from_secs(1))
            .expect("current session ticks");
        let late = spawn_ticker(controller.clone(), first_generation, Duration::from_secs(1));
        assert!(late.is_none());

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(
            controller.lock().unwrap().session().time_remaining_seconds(),
            15
        );
        current.abort();
    }
}
