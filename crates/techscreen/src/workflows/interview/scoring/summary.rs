use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::super::domain::{Answer, Category};
use super::rubric::SUMMARY_TOP_TAGS;
use super::{round_tenths, ScoreRecord};

/// Overall rating bucket derived from the percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Rating {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Self::Excellent,
            75..=89 => Self::Good,
            60..=74 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    /// Higher is better; used when sorting candidates by rating.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Excellent => 3,
            Self::Good => 2,
            Self::Fair => 1,
            Self::NeedsImprovement => 0,
        }
    }

    pub const fn all() -> [Rating; 4] {
        [
            Self::Excellent,
            Self::Good,
            Self::Fair,
            Self::NeedsImprovement,
        ]
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rating '{0}' (expected Excellent, Good, Fair or Needs Improvement)")]
pub struct UnknownRating(pub String);

impl FromStr for Rating {
    type Err = UnknownRating;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "fair" => Ok(Self::Fair),
            "needsimprovement" => Ok(Self::NeedsImprovement),
            _ => Err(UnknownRating(raw.to_string())),
        }
    }
}

/// Hiring recommendation derived from the percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongHire,
    Hire,
    Maybe,
    NoHire,
}

impl Recommendation {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => Self::StrongHire,
            65..=79 => Self::Hire,
            50..=64 => Self::Maybe,
            _ => Self::NoHire,
        }
    }

    pub const fn text(self) -> &'static str {
        match self {
            Self::StrongHire => "Strong Hire - Candidate demonstrates excellent technical knowledge",
            Self::Hire => "Hire - Candidate shows good understanding with minor gaps",
            Self::Maybe => "Maybe - Candidate has potential but needs development",
            Self::NoHire => "No Hire - Significant gaps in technical knowledge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeManagement {
    Excellent,
    Good,
    CouldImprove,
}

impl TimeManagement {
    pub const fn text(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent time management",
            Self::Good => "Good time management",
            Self::CouldImprove => "Could improve time management",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub average_score: f64,
}

/// Aggregate view over a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSummary {
    pub rating: Rating,
    pub percentage: u32,
    pub top_strengths: Vec<String>,
    pub top_weaknesses: Vec<String>,
    pub category_breakdown: Vec<CategoryScore>,
    pub recommendation: Recommendation,
    pub time_management: TimeManagement,
}

pub fn score_percentage(total_score: f64, max_score: u32) -> u32 {
    if max_score == 0 {
        return 0;
    }
    (100.0 * total_score / f64::from(max_score)).round().max(0.0) as u32
}

/// Builds the session summary. Pure: the same inputs always yield the same summary.
pub fn generate_interview_summary(
    answers: &[Answer],
    scores: &[ScoreRecord],
    total_score: f64,
    max_score: u32,
) -> InterviewSummary {
    let percentage = score_percentage(total_score, max_score);

    let top_strengths = first_unique(scores.iter().flat_map(|score| score.strengths.iter()));
    let top_weaknesses = first_unique(scores.iter().flat_map(|score| score.improvements.iter()));

    InterviewSummary {
        rating: Rating::from_percentage(percentage),
        percentage,
        top_strengths,
        top_weaknesses,
        category_breakdown: category_breakdown(answers, scores),
        recommendation: Recommendation::from_percentage(percentage),
        time_management: time_management(answers),
    }
}

fn first_unique<'a>(tags: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for tag in tags.filter(|tag| !tag.is_empty()) {
        if unique.len() == SUMMARY_TOP_TAGS {
            break;
        }
        if !unique.contains(tag) {
            unique.push(tag.clone());
        }
    }
    unique
}

/// Mean weighted score per category, in order of first appearance.
fn category_breakdown(answers: &[Answer], scores: &[ScoreRecord]) -> Vec<CategoryScore> {
    let mut totals: Vec<(Category, f64, u32)> = Vec::new();
    for (index, answer) in answers.iter().enumerate() {
        let weighted = scores
            .get(index)
            .map(|score| score.weighted_score)
            .unwrap_or(0.0);
        match totals
            .iter_mut()
            .find(|(category, _, _)| *category == answer.category)
        {
            Some(entry) => {
                entry.1 += weighted;
                entry.2 += 1;
            }
            None => totals.push((answer.category, weighted, 1)),
        }
    }

    totals
        .into_iter()
        .map(|(category, total, count)| CategoryScore {
            category,
            average_score: round_tenths(total / f64::from(count)),
        })
        .collect()
}

fn time_management(answers: &[Answer]) -> TimeManagement {
    let (average_spent, average_limit) = if answers.is_empty() {
        (0.0, 0.0)
    } else {
        let count = answers.len() as f64;
        let spent: f64 = answers
            .iter()
            .map(|answer| f64::from(answer.time_spent_seconds))
            .sum();
        let limit: f64 = answers
            .iter()
            .map(|answer| f64::from(answer.time_limit_seconds))
            .sum();
        ((spent / count).round(), (limit / count).round())
    };

    if average_spent < average_limit * 0.7 {
        TimeManagement::Excellent
    } else if average_spent < average_limit {
        TimeManagement::Good
    } else {
        TimeManagement::CouldImprove
    }
}
