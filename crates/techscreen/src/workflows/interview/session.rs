use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::bank::QuestionBank;
use super::domain::{Answer, CandidateId, Question, SessionStatus, SubmitMode, Transition};
use super::scoring::{score_session, ScoreSheet};
use super::timer::{reconcile, TimerRecovery};

/// The single live interview: question sequencing, per-question countdown, answers and,
/// once complete, the score sheet.
///
/// Every operation checks its precondition and reports `Transition::Ignored` instead of
/// failing when called in the wrong state. Time is always passed in by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewSession {
    candidate_id: Option<CandidateId>,
    questions: Vec<Question>,
    current_index: usize,
    answers: Vec<Answer>,
    current_draft: String,
    timer_started_at: Option<DateTime<Utc>>,
    time_remaining_seconds: u32,
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    score_sheet: Option<ScoreSheet>,
}

impl InterviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        candidate_id: CandidateId,
        bank: &QuestionBank,
        now: DateTime<Utc>,
    ) -> Transition {
        if self.status != SessionStatus::NotStarted {
            return Transition::Ignored;
        }
        let Some(first) = bank.questions().first() else {
            return Transition::Ignored;
        };

        self.time_remaining_seconds = first.time_limit_seconds;
        self.candidate_id = Some(candidate_id);
        self.questions = bank.questions().to_vec();
        self.current_index = 0;
        self.answers.clear();
        self.current_draft.clear();
        self.timer_started_at = Some(now);
        self.status = SessionStatus::Active;
        self.started_at = Some(now);
        self.completed_at = None;
        self.score_sheet = None;
        Transition::Applied
    }

    pub fn update_draft(&mut self, text: impl Into<String>) -> Transition {
        if self.status != SessionStatus::Active {
            return Transition::Ignored;
        }
        self.current_draft = text.into();
        Transition::Applied
    }

    /// One second of countdown, floored at zero.
    ///
    /// The timer checkpoint moves forward with every counted second, so
    /// `timer_started_at + time_remaining_seconds` (the question deadline) stays fixed and a
    /// later `resume_timer` only charges time that no tick has counted yet.
    pub fn tick(&mut self) -> Transition {
        if self.status != SessionStatus::Active {
            return Transition::Ignored;
        }
        if self.time_remaining_seconds > 0 {
            self.time_remaining_seconds -= 1;
            self.timer_started_at = self
                .timer_started_at
                .map(|checkpoint| checkpoint + Duration::seconds(1));
        }
        Transition::Applied
    }

    /// Finalizes the current answer and either moves to the next question or completes the
    /// session, scoring every answer.
    pub fn submit(&mut self, mode: SubmitMode, now: DateTime<Utc>) -> Transition {
        if self.status != SessionStatus::Active {
            return Transition::Ignored;
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return Transition::Ignored;
        };

        let (time_spent_seconds, auto_submitted) = match mode {
            SubmitMode::Explicit => (
                question
                    .time_limit_seconds
                    .saturating_sub(self.time_remaining_seconds),
                false,
            ),
            SubmitMode::Auto => (question.time_limit_seconds, true),
        };

        let answer = Answer {
            question_id: question.id.clone(),
            text: std::mem::take(&mut self.current_draft),
            time_spent_seconds,
            submitted_at: now,
            difficulty: question.difficulty,
            question_text: question.text.clone(),
            category: question.category,
            time_limit_seconds: question.time_limit_seconds,
            auto_submitted,
        };

        self.complete_or_advance(answer, now)
    }

    fn complete_or_advance(&mut self, answer: Answer, now: DateTime<Utc>) -> Transition {
        self.answers.push(answer);
        self.current_index += 1;
        self.current_draft.clear();

        if let Some(next) = self.questions.get(self.current_index) {
            self.timer_started_at = Some(now);
            self.time_remaining_seconds = next.time_limit_seconds;
            return Transition::Advanced {
                index: self.current_index,
            };
        }

        self.status = SessionStatus::Complete;
        self.completed_at = Some(now);
        self.timer_started_at = None;
        self.time_remaining_seconds = 0;
        self.score_sheet = Some(score_session(&self.questions, &self.answers));
        Transition::Completed
    }

    /// Recomputes the score sheet of a completed session. Idempotent.
    pub fn rescore(&mut self) -> Transition {
        if self.status != SessionStatus::Complete || self.answers.is_empty() {
            return Transition::Ignored;
        }
        self.score_sheet = Some(score_session(&self.questions, &self.answers));
        Transition::Applied
    }

    /// Charges wall-clock time lost across a restart against the current question.
    ///
    /// Never touches status or answers: when the returned recovery is exhausted the caller
    /// is expected to auto-submit. Returns `None` when the session is not active.
    pub fn resume_timer(&mut self, now: DateTime<Utc>) -> Option<TimerRecovery> {
        if self.status != SessionStatus::Active {
            return None;
        }

        let recovery = reconcile(self.timer_started_at, self.time_remaining_seconds, now);
        self.time_remaining_seconds = recovery.remaining_seconds();
        if let TimerRecovery::Resumed { .. } = recovery {
            self.timer_started_at = Some(now);
        }
        Some(recovery)
    }

    pub fn reset(&mut self) -> Transition {
        *self = Self::default();
        Transition::Applied
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn candidate_id(&self) -> Option<&CandidateId> {
        self.candidate_id.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.status {
            SessionStatus::Active => self.questions.get(self.current_index),
            _ => None,
        }
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn current_draft(&self) -> &str {
        &self.current_draft
    }

    pub fn timer_started_at(&self) -> Option<DateTime<Utc>> {
        self.timer_started_at
    }

    pub fn time_remaining_seconds(&self) -> u32 {
        self.time_remaining_seconds
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn score_sheet(&self) -> Option<&ScoreSheet> {
        self.score_sheet.as_ref()
    }

    /// `(question number, total)` with a 1-based question number, capped at the total.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.questions.len();
        ((self.current_index + 1).min(total), total)
    }

    /// First broken structural rule, if any. Used to vet rehydrated sessions.
    pub(crate) fn invariant_violation(&self) -> Option<&'static str> {
        let total = self.questions.len();
        if self.current_index > total {
            return Some("question index beyond question list");
        }
        if self.answers.len() != self.current_index {
            return Some("answer count does not match question index");
        }
        if !self.current_draft.is_empty() && self.status != SessionStatus::Active {
            return Some("draft answer outside an active session");
        }

        match self.status {
            SessionStatus::NotStarted => {
                if total != 0 || self.candidate_id.is_some() || self.score_sheet.is_some() {
                    return Some("unstarted session carries interview data");
                }
            }
            SessionStatus::Active => {
                if self.candidate_id.is_none() || self.started_at.is_none() {
                    return Some("active session without candidate or start time");
                }
                let Some(question) = self.questions.get(self.current_index) else {
                    return Some("active session past the last question");
                };
                if self.time_remaining_seconds > question.time_limit_seconds {
                    return Some("remaining time exceeds the question limit");
                }
                if self.score_sheet.is_some() {
                    return Some("active session already scored");
                }
            }
            SessionStatus::Complete => {
                if total == 0 || self.current_index != total {
                    return Some("complete session has unanswered questions");
                }
                if self.completed_at.is_none() {
                    return Some("complete session without completion time");
                }
                if self.score_sheet.is_none() {
                    return Some("complete session without scores");
                }
            }
        }

        if let Some(sheet) = &self.score_sheet {
            let negative = !sheet.total_score.is_finite()
                || sheet.total_score < 0.0
                || sheet
                    .scores
                    .iter()
                    .any(|score| !score.weighted_score.is_finite() || score.weighted_score < 0.0);
            if negative {
                return Some("negative or non-finite score");
            }
            if sheet.scores.len() != self.answers.len() {
                return Some("score count does not match answer count");
            }
        }

        None
    }
}
