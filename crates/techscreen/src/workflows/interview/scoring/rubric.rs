use super::super::domain::Category;

/// Keywords credited for a category. Matching is case-insensitive.
pub(crate) fn keywords_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::React => &[
            "component",
            "state",
            "props",
            "hook",
            "useEffect",
            "render",
            "virtual",
            "memo",
        ],
        Category::NodeJs => &[
            "server",
            "async",
            "middleware",
            "express",
            "request",
            "response",
            "event",
        ],
        Category::SystemDesign => &[
            "scalability",
            "database",
            "API",
            "authentication",
            "real-time",
            "storage",
            "message",
        ],
    }
}

pub(crate) const MAX_KEYWORD_BONUS: usize = 2;
pub(crate) const MAX_RAW_SCORE: u32 = 10;
/// Fallback limit for the "quick response" strength when a question has no limit.
pub(crate) const DEFAULT_TIME_LIMIT_SECONDS: u32 = 60;

pub(crate) const FEEDBACK_POOR: &str =
    "Needs significant improvement. Answer lacks depth and key concepts.";
pub(crate) const FEEDBACK_FAIR: &str =
    "Fair answer. Covers some basics but missing important details.";
pub(crate) const FEEDBACK_GOOD: &str =
    "Good answer. Demonstrates solid understanding with room for elaboration.";
pub(crate) const FEEDBACK_EXCELLENT: &str = "Excellent answer. Comprehensive and well-articulated.";

pub(crate) const STRENGTH_KEY_CONCEPTS: &str = "Mentioned key concepts";
pub(crate) const STRENGTH_DETAILED: &str = "Detailed explanation";
pub(crate) const STRENGTH_QUICK: &str = "Quick response";
pub(crate) const STRENGTH_CLEAR: &str = "Clear and concise";

pub(crate) const IMPROVE_TERMS: &str = "Add more relevant technical terms";
pub(crate) const IMPROVE_DETAIL: &str = "Provide more detail/examples";
pub(crate) const IMPROVE_REASONING: &str = "Explain reasoning and trade-offs";
pub(crate) const IMPROVE_CORE: &str = "Review core concepts";

pub(crate) const SUMMARY_TOP_TAGS: usize = 5;
