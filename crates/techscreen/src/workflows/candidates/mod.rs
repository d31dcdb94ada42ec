//! Completed-interview results: one record per candidate, with search, rating filter and
//! sorting computed on read.

mod record;
mod store;

pub use record::{CandidateRecord, CandidateRowView};
pub use store::{
    CandidateQuery, CandidateResultsStore, CandidateViewUpdate, SortField, SortOrder,
    UnknownSortKey, UpsertOutcome,
};
