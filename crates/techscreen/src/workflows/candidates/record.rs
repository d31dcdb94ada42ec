use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::interview::domain::{Answer, CandidateId, Question};
use crate::workflows::interview::scoring::{
    InterviewSummary, Rating, Recommendation, ScoreRecord,
};
use crate::workflows::interview::InterviewSession;
use crate::workflows::profile::CandidateProfile;

/// Snapshot of a completed interview, owned by the results store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub resume_file_name: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    pub interview_completed_at: DateTime<Utc>,
    pub final_score: f64,
    pub max_score: u32,
    pub score_percentage: u32,
    pub rating: Rating,
    pub recommendation: Recommendation,
    pub summary: InterviewSummary,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub scores: Vec<ScoreRecord>,
}

impl CandidateRecord {
    /// Builds the record for a scored, completed session. `None` while the session is still
    /// running or has not been scored.
    pub fn from_session(profile: &CandidateProfile, session: &InterviewSession) -> Option<Self> {
        let sheet = session.score_sheet()?;
        let completed_at = session.completed_at()?;

        Some(Self {
            id: profile.id.clone(),
            name: profile.name.clone().unwrap_or_default(),
            email: profile.email.clone().unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            resume_file_name: profile.resume_file_name.clone(),
            uploaded_at: profile.uploaded_at,
            interview_completed_at: completed_at,
            final_score: sheet.total_score,
            max_score: sheet.max_score,
            score_percentage: sheet.percentage(),
            rating: sheet.summary.rating,
            recommendation: sheet.summary.recommendation,
            summary: sheet.summary.clone(),
            questions: session.questions().to_vec(),
            answers: session.answers().to_vec(),
            scores: sheet.scores.clone(),
        })
    }

    pub fn row_view(&self) -> CandidateRowView {
        CandidateRowView {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            final_score: self.final_score,
            max_score: self.max_score,
            score_percentage: self.score_percentage,
            rating: self.rating,
            rating_label: self.rating.label(),
            recommendation: self.recommendation.text(),
            interview_completed_at: self.interview_completed_at,
        }
    }
}

/// Table row for listings; the full record carries the question/answer history.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRowView {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub final_score: f64,
    pub max_score: u32,
    pub score_percentage: u32,
    pub rating: Rating,
    pub rating_label: &'static str,
    pub recommendation: &'static str,
    pub interview_completed_at: DateTime<Utc>,
}
