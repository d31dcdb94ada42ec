use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for interviewed candidates (UUID v4 text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Question difficulty. Fixes both the time budget and the scoring weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn time_limit_seconds(self) -> u32 {
        match self {
            Self::Easy => 20,
            Self::Medium => 60,
            Self::Hard => 120,
        }
    }

    pub const fn weight(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.5,
            Self::Hard => 2.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Topic a question belongs to; drives keyword scoring and the category breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    React,
    #[serde(rename = "Node.js")]
    NodeJs,
    #[serde(rename = "System Design")]
    SystemDesign,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Self::React => "React",
            Self::NodeJs => "Node.js",
            Self::SystemDesign => "System Design",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub difficulty: Difficulty,
    pub time_limit_seconds: u32,
    pub text: String,
    pub category: Category,
}

/// A finalized answer. Created once per question and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub text: String,
    pub time_spent_seconds: u32,
    pub submitted_at: DateTime<Utc>,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub category: Category,
    pub time_limit_seconds: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_submitted: bool,
}

impl Answer {
    /// Rebuilds the question this answer was given for, from the data recorded on the answer.
    pub fn question(&self) -> Question {
        Question {
            id: self.question_id.clone(),
            difficulty: self.difficulty,
            time_limit_seconds: self.time_limit_seconds,
            text: self.question_text.clone(),
            category: self.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    Active,
    Complete,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Active => "Active",
            Self::Complete => "Complete",
        }
    }
}

/// How an answer was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// The candidate pressed submit.
    Explicit,
    /// The question timer ran out.
    Auto,
}

/// Result of asking the state machine to perform a transition.
///
/// Transitions requested in the wrong state are not errors: they come back as `Ignored`
/// and leave the session untouched.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    Applied,
    Advanced { index: usize },
    Completed,
    Ignored,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}
