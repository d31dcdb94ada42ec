use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::record::CandidateRecord;
use crate::workflows::interview::domain::CandidateId;
use crate::workflows::interview::scoring::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Email,
    FinalScore,
    #[default]
    ScorePercentage,
    Rating,
    CompletedAt,
}

impl SortField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::FinalScore => "final_score",
            Self::ScorePercentage => "score_percentage",
            Self::Rating => "rating",
            Self::CompletedAt => "completed_at",
        }
    }

    fn compare(self, left: &CandidateRecord, right: &CandidateRecord) -> Ordering {
        match self {
            Self::Name => left
                .name
                .to_lowercase()
                .cmp(&right.name.to_lowercase()),
            Self::Email => left.email.cmp(&right.email),
            Self::FinalScore => left
                .final_score
                .partial_cmp(&right.final_score)
                .unwrap_or(Ordering::Equal),
            Self::ScorePercentage => left.score_percentage.cmp(&right.score_percentage),
            Self::Rating => left.rating.rank().cmp(&right.rating.rank()),
            Self::CompletedAt => left
                .interview_completed_at
                .cmp(&right.interview_completed_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key '{0}'")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortField {
    type Err = UnknownSortKey;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "final_score" | "score" => Ok(Self::FinalScore),
            "score_percentage" | "percentage" => Ok(Self::ScorePercentage),
            "rating" => Ok(Self::Rating),
            "completed_at" | "completed" => Ok(Self::CompletedAt),
            _ => Err(UnknownSortKey(raw.to_string())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = UnknownSortKey;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(UnknownSortKey(raw.to_string())),
        }
    }
}

/// Search text, rating filter and sort applied on read. Saved with the results so the
/// table reopens the way it was left.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateQuery {
    pub search: String,
    pub rating: Option<Rating>,
    pub sort_by: SortField,
    pub order: SortOrder,
}

impl CandidateQuery {
    fn matches(&self, record: &CandidateRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        let text_match = needle.is_empty()
            || [&record.name, &record.email, &record.phone]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
        let rating_match = self.rating.map_or(true, |rating| record.rating == rating);
        text_match && rating_match
    }

    fn compare(&self, left: &CandidateRecord, right: &CandidateRecord) -> Ordering {
        let ordering = self.sort_by.compare(left, right);
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Partial change to the stored view. `None` keeps the current value; `rating: Some(None)`
/// drops the rating filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateViewUpdate {
    pub search: Option<String>,
    pub rating: Option<Option<Rating>>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl CandidateViewUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Completed interviews keyed by candidate id. The stored order always follows the current
/// sort; search and rating filters are applied by [`CandidateResultsStore::filtered_and_sorted`].
#[derive(Debug, Clone, Default)]
pub struct CandidateResultsStore {
    candidates: Vec<CandidateRecord>,
    query: CandidateQuery,
}

impl CandidateResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store from saved records and the saved view.
    pub fn restore(records: Vec<CandidateRecord>, query: CandidateQuery) -> Self {
        let mut store = Self {
            candidates: records,
            query,
        };
        store.resort();
        store
    }

    pub fn upsert(&mut self, record: CandidateRecord) -> UpsertOutcome {
        let outcome = match self
            .candidates
            .iter_mut()
            .find(|existing| existing.id == record.id)
        {
            Some(existing) => {
                *existing = record;
                UpsertOutcome::Replaced
            }
            None => {
                self.candidates.push(record);
                UpsertOutcome::Inserted
            }
        };
        self.resort();
        outcome
    }

    pub fn set_sort_by(&mut self, field: SortField) {
        if self.query.sort_by != field {
            self.query.sort_by = field;
            self.resort();
        }
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        if self.query.order != order {
            self.query.order = order;
            self.resort();
        }
    }

    pub fn set_search_query(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_filter_rating(&mut self, rating: Option<Rating>) {
        self.query.rating = rating;
    }

    /// Routes each present field through its setter. Returns whether the stored view changed.
    pub fn apply_view(&mut self, update: CandidateViewUpdate) -> bool {
        let before = self.query.clone();
        if let Some(search) = update.search {
            self.set_search_query(search);
        }
        if let Some(rating) = update.rating {
            self.set_filter_rating(rating);
        }
        if let Some(field) = update.sort_by {
            self.set_sort_by(field);
        }
        if let Some(order) = update.order {
            self.set_sort_order(order);
        }
        self.query != before
    }

    pub fn current_query(&self) -> &CandidateQuery {
        &self.query
    }

    /// Records matching the stored search and rating filter, in the stored sort order.
    pub fn filtered_and_sorted(&self) -> Vec<&CandidateRecord> {
        self.candidates
            .iter()
            .filter(|record| self.query.matches(record))
            .collect()
    }

    pub fn get(&self, id: &CandidateId) -> Option<&CandidateRecord> {
        self.candidates.iter().find(|record| &record.id == id)
    }

    pub fn remove(&mut self, id: &CandidateId) -> Option<CandidateRecord> {
        let position = self.candidates.iter().position(|record| &record.id == id)?;
        Some(self.candidates.remove(position))
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }

    pub fn count(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Highest percentage; the earliest stored record wins a tie.
    pub fn top_candidate(&self) -> Option<&CandidateRecord> {
        self.candidates.iter().fold(None, |best, record| match best {
            Some(current) if current.score_percentage >= record.score_percentage => Some(current),
            _ => Some(record),
        })
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.candidates
    }

    fn resort(&mut self) {
        let query = &self.query;
        self.candidates.sort_by(|left, right| query.compare(left, right));
    }
}
