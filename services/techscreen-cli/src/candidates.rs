use clap::{Args, Subcommand};
use techscreen::config::AppConfig;
use techscreen::error::AppError;
use techscreen::workflows::candidates::{CandidateViewUpdate, SortField, SortOrder};
use techscreen::workflows::interview::scoring::Rating;
use techscreen::workflows::interview::CandidateId;

use crate::infra::open_controller;
use crate::terminal::{render_candidate_detail, render_candidate_table, render_view_header};

#[derive(Subcommand, Debug)]
pub(crate) enum CandidatesCommand {
    /// List results; search, rating and sort options are remembered for the next listing
    List(ListArgs),
    /// Show one candidate's answers and scores
    Show {
        id: String,
        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one candidate's result
    Remove { id: String },
    /// Delete every stored result
    Clear,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Case-insensitive match on name, email or phone
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Only show one rating (Excellent, Good, Fair, "Needs Improvement")
    #[arg(long, conflicts_with = "all_ratings")]
    pub(crate) rating: Option<Rating>,
    /// Drop a remembered rating filter
    #[arg(long)]
    pub(crate) all_ratings: bool,
    /// name, email, final_score, score_percentage, rating or completed_at
    #[arg(long)]
    pub(crate) sort_by: Option<SortField>,
    /// asc or desc
    #[arg(long)]
    pub(crate) order: Option<SortOrder>,
    /// Print rows as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl ListArgs {
    fn view_update(&self) -> CandidateViewUpdate {
        let rating = match (self.rating, self.all_ratings) {
            (Some(rating), _) => Some(Some(rating)),
            (None, true) => Some(None),
            (None, false) => None,
        };
        CandidateViewUpdate {
            search: self.search.clone(),
            rating,
            sort_by: self.sort_by,
            order: self.order,
        }
    }
}

pub(crate) fn run_candidates(command: CandidatesCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (mut controller, report) = open_controller(&config);
    if let Some(warning) = &report.warning {
        eprintln!("warning: {warning}");
    }

    match command {
        CandidatesCommand::List(args) => {
            controller.update_candidate_view(args.view_update());
            let store = controller.candidates();
            let rows = store.filtered_and_sorted();
            if args.json {
                let views: Vec<_> = rows.iter().map(|record| record.row_view()).collect();
                print_json(&views);
            } else {
                render_view_header(store.current_query(), rows.len(), store.count());
                render_candidate_table(&rows);
                if let Some(top) = store.top_candidate() {
                    println!("\nTop candidate: {} ({}%)", top.name, top.score_percentage);
                }
            }
        }
        CandidatesCommand::Show { id, json } => {
            let id = CandidateId(id);
            match controller.candidates().get(&id) {
                Some(record) if json => print_json(record),
                Some(record) => render_candidate_detail(record),
                None => println!("No candidate with id {id}"),
            }
        }
        CandidatesCommand::Remove { id } => {
            let id = CandidateId(id);
            match controller.remove_candidate(&id) {
                Some(record) => println!("Removed {} ({})", record.name, record.id),
                None => println!("No candidate with id {id}"),
            }
        }
        CandidatesCommand::Clear => {
            let removed = controller.clear_candidates();
            println!("Removed {removed} candidate result(s)");
        }
    }

    if let Some(warning) = controller.storage_warning() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

pub(crate) fn run_purge() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (mut controller, _) = open_controller(&config);
    controller.purge()?;
    println!(
        "Cleared saved state in {}",
        config.storage.data_dir.display()
    );
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("could not encode output: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_flags_only_touch_what_was_given() {
        let args = ListArgs {
            sort_by: Some(SortField::Name),
            ..ListArgs::default()
        };
        assert_eq!(
            args.view_update(),
            CandidateViewUpdate {
                sort_by: Some(SortField::Name),
                ..CandidateViewUpdate::default()
            }
        );

        let clear_rating = ListArgs {
            all_ratings: true,
            order: Some(SortOrder::Asc),
            ..ListArgs::default()
        };
        let update = clear_rating.view_update();
        assert_eq!(update.rating, Some(None));
        assert_eq!(update.order, Some(SortOrder::Asc));
        assert_eq!(update.search, None);
    }
}
