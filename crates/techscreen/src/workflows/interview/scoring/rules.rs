use super::super::domain::{Category, Difficulty, Question};
use super::rubric::{
    keywords_for, DEFAULT_TIME_LIMIT_SECONDS, FEEDBACK_EXCELLENT, FEEDBACK_FAIR, FEEDBACK_GOOD,
    FEEDBACK_POOR, IMPROVE_CORE, IMPROVE_DETAIL, IMPROVE_REASONING, IMPROVE_TERMS,
    MAX_KEYWORD_BONUS, MAX_RAW_SCORE, STRENGTH_CLEAR, STRENGTH_DETAILED, STRENGTH_KEY_CONCEPTS,
    STRENGTH_QUICK,
};
use super::{round_tenths, ScoreRecord};

/// Scores one answer. The answer is trimmed and its length counted in UTF-16 code units, so a
/// character outside the Basic Multilingual Plane counts twice.
pub fn evaluate_answer(
    question: &Question,
    answer_text: &str,
    time_spent_seconds: u32,
    difficulty: Difficulty,
) -> ScoreRecord {
    let answer = answer_text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let length = answer.encode_utf16().count();
    let keyword_hits = keyword_hits(question.category, answer);

    let mut score = length_score(length);
    score += keyword_hits.min(MAX_KEYWORD_BONUS) as u32;
    if question.time_limit_seconds > 0 && is_quick(time_spent_seconds, question.time_limit_seconds)
    {
        score += 1;
    }
    let raw_score = score.min(MAX_RAW_SCORE);
    let weighted_score = round_tenths(f64::from(raw_score) * difficulty.weight());

    let quick_for_strength = is_quick(
        time_spent_seconds,
        match question.time_limit_seconds {
            0 => DEFAULT_TIME_LIMIT_SECONDS,
            limit => limit,
        },
    );

    let mut strengths = Vec::new();
    if keyword_hits > 0 {
        strengths.push(STRENGTH_KEY_CONCEPTS.to_string());
    }
    if length > 100 {
        strengths.push(STRENGTH_DETAILED.to_string());
    }
    if quick_for_strength {
        strengths.push(STRENGTH_QUICK.to_string());
    }
    if raw_score >= 7 {
        strengths.push(STRENGTH_CLEAR.to_string());
    }

    let mut improvements = Vec::new();
    if keyword_hits == 0 {
        improvements.push(IMPROVE_TERMS.to_string());
    }
    if length < 50 {
        improvements.push(IMPROVE_DETAIL.to_string());
    }
    if raw_score < 7 {
        improvements.push(IMPROVE_REASONING.to_string());
    }
    if raw_score < 4 {
        improvements.push(IMPROVE_CORE.to_string());
    }

    ScoreRecord {
        raw_score: raw_score as u8,
        weighted_score,
        feedback: feedback_for(raw_score).to_string(),
        strengths,
        improvements,
    }
}

/// Base points awarded for answer length, before bonuses.
pub(crate) fn length_score(length: usize) -> u32 {
    let points = match length {
        0..=9 => 1 + length / 10,
        10..=49 => 3 + length / 10,
        50..=149 => 5 + length / 25,
        _ => 7 + (length / 100).min(3),
    };
    points as u32
}

pub(crate) fn keyword_hits(category: Category, answer: &str) -> usize {
    let answer = answer.to_lowercase();
    keywords_for(category)
        .iter()
        .filter(|keyword| answer.contains(&keyword.to_lowercase()))
        .count()
}

/// Strictly under half the limit.
fn is_quick(time_spent_seconds: u32, time_limit_seconds: u32) -> bool {
    u64::from(time_spent_seconds) * 2 < u64::from(time_limit_seconds)
}

fn feedback_for(raw_score: u32) -> &'static str {
    match raw_score {
        0..=3 => FEEDBACK_POOR,
        4..=6 => FEEDBACK_FAIR,
        7..=8 => FEEDBACK_GOOD,
        _ => FEEDBACK_EXCELLENT,
    }
}
