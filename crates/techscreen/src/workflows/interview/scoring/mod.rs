//! Deterministic answer scoring and session aggregation.
//!
//! Scores are a length/keyword/speed heuristic, not an assessment of meaning. Every function
//! here is pure so a completed session can be rescored and compared bit for bit.

mod rubric;
mod rules;
mod summary;

pub use rules::evaluate_answer;
pub use summary::{
    generate_interview_summary, score_percentage, CategoryScore, InterviewSummary, Rating,
    Recommendation, TimeManagement, UnknownRating,
};

use super::domain::{Answer, Question};
use serde::{Deserialize, Serialize};

/// Per-answer score with the feedback trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub raw_score: u8,
    pub weighted_score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Everything scoring produces for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub scores: Vec<ScoreRecord>,
    pub total_score: f64,
    pub max_score: u32,
    pub summary: InterviewSummary,
}

impl ScoreSheet {
    pub fn percentage(&self) -> u32 {
        score_percentage(self.total_score, self.max_score)
    }
}

/// Maximum attainable weighted score: `Σ round(10 × weight)`.
pub fn calculate_max_score(questions: &[Question]) -> u32 {
    questions
        .iter()
        .map(|question| (10.0 * question.difficulty.weight()).round() as u32)
        .sum()
}

/// Scores every answer against its question and aggregates the result.
///
/// Questions are looked up by id; an answer whose question is not in `questions` is scored
/// against the question data recorded on the answer itself.
pub fn score_session(questions: &[Question], answers: &[Answer]) -> ScoreSheet {
    let scores: Vec<ScoreRecord> = answers
        .iter()
        .map(|answer| {
            let question = questions
                .iter()
                .find(|question| question.id == answer.question_id)
                .cloned()
                .unwrap_or_else(|| answer.question());
            evaluate_answer(
                &question,
                &answer.text,
                answer.time_spent_seconds,
                answer.difficulty,
            )
        })
        .collect();

    let total_score = round_tenths(scores.iter().map(|score| score.weighted_score).sum());
    let max_score = calculate_max_score(questions);
    let summary = generate_interview_summary(answers, &scores, total_score, max_score);

    ScoreSheet {
        scores,
        total_score,
        max_score,
        summary,
    }
}

pub(crate) fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
