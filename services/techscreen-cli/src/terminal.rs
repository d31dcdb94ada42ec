use chrono::Local;
use techscreen::workflows::candidates::{CandidateQuery, CandidateRecord, SortOrder};
use techscreen::workflows::interview::scoring::Rating;
use techscreen::workflows::interview::{QuestionView, ScoreView};

pub(crate) fn render_question(question: &QuestionView) {
    println!(
        "\nQuestion {}/{} [{} | {}] ({}s)",
        question.number,
        question.total,
        question.difficulty_label,
        question.category.label(),
        question.time_limit_seconds
    );
    println!("{}", question.text);
    println!("Type your answer; an empty line submits it.");
}

pub(crate) fn render_score(score: &ScoreView) {
    println!("\nInterview complete");
    println!(
        "- Score {:.1} / {} ({}%) -> {}",
        score.total_score, score.max_score, score.percentage, score.rating
    );
    println!("- Recommendation: {}", score.recommendation);
    println!("- Time management: {}", score.time_management);
    if !score.category_breakdown.is_empty() {
        println!("Category averages:");
        for category in &score.category_breakdown {
            println!(
                "  - {}: {:.1}",
                category.category.label(),
                category.average_score
            );
        }
    }
    if !score.top_strengths.is_empty() {
        println!("Strengths: {}", score.top_strengths.join("; "));
    }
    if !score.top_weaknesses.is_empty() {
        println!("To improve: {}", score.top_weaknesses.join("; "));
    }
}

pub(crate) fn render_view_header(view: &CandidateQuery, shown: usize, total: usize) {
    let rating = view.rating.map_or("all ratings", Rating::label);
    let search = if view.search.trim().is_empty() {
        String::new()
    } else {
        format!(", matching \"{}\"", view.search.trim())
    };
    println!(
        "{shown} of {total} candidate(s), {rating}{search}, sorted by {} {}",
        view.sort_by,
        match view.order {
            SortOrder::Asc => "ascending",
            SortOrder::Desc => "descending",
        }
    );
}

pub(crate) fn render_candidate_table(rows: &[&CandidateRecord]) {
    if rows.is_empty() {
        println!("No candidates match.");
        return;
    }
    println!(
        "{:<36}  {:<24}  {:<28}  {:>7}  {:>4}  {:<17}  {}",
        "ID", "NAME", "EMAIL", "SCORE", "%", "RATING", "COMPLETED"
    );
    for record in rows {
        println!(
            "{:<36}  {:<24}  {:<28}  {:>7.1}  {:>4}  {:<17}  {}",
            record.id.as_str(),
            truncate(&record.name, 24),
            truncate(&record.email, 28),
            record.final_score,
            record.score_percentage,
            record.rating.label(),
            record
                .interview_completed_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        );
    }
}

pub(crate) fn render_candidate_detail(record: &CandidateRecord) {
    println!("{} <{}> {}", record.name, record.email, record.phone);
    if let Some(file_name) = &record.resume_file_name {
        println!("Resume: {file_name}");
    }
    println!(
        "Score {:.1} / {} ({}%) -> {} | {}",
        record.final_score,
        record.max_score,
        record.score_percentage,
        record.rating,
        record.recommendation.text()
    );
    for (index, answer) in record.answers.iter().enumerate() {
        println!(
            "\n{}. [{}] {}",
            index + 1,
            answer.difficulty.label(),
            answer.question_text
        );
        let text = if answer.text.trim().is_empty() {
            "(no answer)"
        } else {
            answer.text.as_str()
        };
        println!("   Answer: {text}");
        let timing = if answer.auto_submitted {
            "timed out"
        } else {
            "submitted"
        };
        println!(
            "   {} after {}s of {}s",
            timing, answer.time_spent_seconds, answer.time_limit_seconds
        );
        if let Some(score) = record.scores.get(index) {
            println!(
                "   Score {}/10 (weighted {:.1}): {}",
                score.raw_score, score.weighted_score, score.feedback
            );
        }
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}
