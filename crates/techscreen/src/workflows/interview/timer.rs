//! Reconciles the per-question countdown with wall-clock time after a restart.
//!
//! The session persists `timer_started_at` alongside the remaining seconds. On the
//! one-time resumption event the difference between that checkpoint and "now" is charged
//! against the remaining time, after which the checkpoint moves to "now" so a later
//! resumption does not charge the same interval twice.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sessions idle for longer than this are treated as expired.
pub const SESSION_EXPIRY_SECONDS: i64 = 3600;

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TimerRecovery {
    /// Elapsed time was charged; the checkpoint moves to `now`.
    Resumed {
        elapsed_seconds: u32,
        remaining_seconds: u32,
    },
    /// The session sat idle past the expiry window; no time remains.
    Expired { elapsed_seconds: i64 },
    /// No checkpoint was stored, so elapsed time is unknown; no time remains.
    MissingCheckpoint,
}

impl TimerRecovery {
    pub fn remaining_seconds(self) -> u32 {
        match self {
            Self::Resumed {
                remaining_seconds, ..
            } => remaining_seconds,
            Self::Expired { .. } | Self::MissingCheckpoint => 0,
        }
    }

    pub fn is_exhausted(self) -> bool {
        self.remaining_seconds() == 0
    }
}

/// Computes the corrected remaining time. Negative elapsed time (clock skew) counts as zero.
pub fn reconcile(
    timer_started_at: Option<DateTime<Utc>>,
    remaining_seconds: u32,
    now: DateTime<Utc>,
) -> TimerRecovery {
    let Some(started_at) = timer_started_at else {
        return TimerRecovery::MissingCheckpoint;
    };

    let elapsed = (now - started_at).num_seconds().max(0);
    if elapsed > SESSION_EXPIRY_SECONDS {
        return TimerRecovery::Expired {
            elapsed_seconds: elapsed,
        };
    }

    let elapsed_seconds = elapsed as u32;
    TimerRecovery::Resumed {
        elapsed_seconds,
        remaining_seconds: remaining_seconds.saturating_sub(elapsed_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn checkpoint() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn zero_elapsed_keeps_remaining_time() {
        let recovery = reconcile(Some(checkpoint()), 42, checkpoint());
        assert_eq!(
            recovery,
            TimerRecovery::Resumed {
                elapsed_seconds: 0,
                remaining_seconds: 42
            }
        );
    }

    #[test]
    fn elapsed_time_is_charged_and_floored() {
        let now = checkpoint() + Duration::seconds(15);
        assert_eq!(reconcile(Some(checkpoint()), 60, now).remaining_seconds(), 45);
        assert_eq!(reconcile(Some(checkpoint()), 10, now).remaining_seconds(), 0);
    }

    #[test]
    fn clock_skew_counts_as_no_elapsed_time() {
        let now = checkpoint() - Duration::seconds(30);
        assert_eq!(
            reconcile(Some(checkpoint()), 20, now),
            TimerRecovery::Resumed {
                elapsed_seconds: 0,
                remaining_seconds: 20
            }
        );
    }

    #[test]
    fn more_than_an_hour_expires_the_session() {
        let exactly_an_hour = checkpoint() + Duration::seconds(SESSION_EXPIRY_SECONDS);
        assert!(matches!(
            reconcile(Some(checkpoint()), 120, exactly_an_hour),
            TimerRecovery::Resumed { .. }
        ));

        let past_expiry = exactly_an_hour + Duration::seconds(1);
        let recovery = reconcile(Some(checkpoint()), 120, past_expiry);
        assert_eq!(
            recovery,
            TimerRecovery::Expired {
                elapsed_seconds: SESSION_EXPIRY_SECONDS + 1
            }
        );
        assert!(recovery.is_exhausted());
    }

    #[test]
    fn missing_checkpoint_is_exhausted() {
        assert!(reconcile(None, 120, checkpoint()).is_exhausted());
    }
}
