use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{CandidateId, Category, Difficulty, Question, SessionStatus};
use super::scoring::{CategoryScore, Rating, ScoreRecord, ScoreSheet};
use super::session::InterviewSession;
use crate::workflows::profile::CandidateProfile;

/// Read model of the live interview for HTTP and terminal front ends.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub status_label: &'static str,
    pub generation: u64,
    pub candidate_id: Option<CandidateId>,
    pub candidate_name: Option<String>,
    pub question: Option<QuestionView>,
    pub answered: usize,
    pub total_questions: usize,
    pub time_remaining_seconds: u32,
    pub draft: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<ScoreView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_warning: Option<String>,
}

impl SessionView {
    pub fn new(
        session: &InterviewSession,
        profile: Option<&CandidateProfile>,
        generation: u64,
        storage_warning: Option<String>,
    ) -> Self {
        let (number, total) = session.progress();
        Self {
            status: session.status(),
            status_label: session.status().label(),
            generation,
            candidate_id: session.candidate_id().cloned(),
            candidate_name: profile.and_then(|profile| profile.name.clone()),
            question: session
                .current_question()
                .map(|question| QuestionView::new(question, number, total)),
            answered: session.answers().len(),
            total_questions: total,
            time_remaining_seconds: session.time_remaining_seconds(),
            draft: session.current_draft().to_string(),
            started_at: session.started_at(),
            completed_at: session.completed_at(),
            score: session.score_sheet().map(ScoreView::from),
            storage_warning,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub difficulty: Difficulty,
    pub difficulty_label: &'static str,
    pub category: Category,
    pub time_limit_seconds: u32,
}

impl QuestionView {
    fn new(question: &Question, number: usize, total: usize) -> Self {
        Self {
            id: question.id.clone(),
            number,
            total,
            text: question.text.clone(),
            difficulty: question.difficulty,
            difficulty_label: question.difficulty.label(),
            category: question.category,
            time_limit_seconds: question.time_limit_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreView {
    pub total_score: f64,
    pub max_score: u32,
    pub percentage: u32,
    pub rating: Rating,
    pub recommendation: &'static str,
    pub time_management: &'static str,
    pub top_strengths: Vec<String>,
    pub top_weaknesses: Vec<String>,
    pub category_breakdown: Vec<CategoryScore>,
    pub scores: Vec<ScoreRecord>,
}

impl From<&ScoreSheet> for ScoreView {
    fn from(sheet: &ScoreSheet) -> Self {
        Self {
            total_score: sheet.total_score,
            max_score: sheet.max_score,
            percentage: sheet.percentage(),
            rating: sheet.summary.rating,
            recommendation: sheet.summary.recommendation.text(),
            time_management: sheet.summary.time_management.text(),
            top_strengths: sheet.summary.top_strengths.clone(),
            top_weaknesses: sheet.summary.top_weaknesses.clone(),
            category_breakdown: sheet.summary.category_breakdown.clone(),
            scores: sheet.scores.clone(),
        }
    }
}
