use super::domain::{Category, Difficulty, Question};

/// Fixed, ordered question set shared by every session.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Full-stack React/Node bank: two Easy, two Medium, two Hard, in that order.
    pub fn standard() -> Self {
        Self {
            questions: standard_questions(),
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn question(id: &str, difficulty: Difficulty, category: Category, text: &str) -> Question {
    Question {
        id: id.to_string(),
        difficulty,
        time_limit_seconds: difficulty.time_limit_seconds(),
        text: text.to_string(),
        category,
    }
}

fn standard_questions() -> Vec<Question> {
    vec![
        question(
            "q1",
            Difficulty::Easy,
            Category::React,
            "What is the difference between state and props in React?",
        ),
        question(
            "q2",
            Difficulty::Easy,
            Category::NodeJs,
            "Explain what Node.js is and why it's used for backend development.",
        ),
        question(
            "q3",
            Difficulty::Medium,
            Category::React,
            "Explain the useEffect hook in React and when you would use it.",
        ),
        question(
            "q4",
            Difficulty::Medium,
            Category::NodeJs,
            "How do you handle errors in Express middleware?",
        ),
        question(
            "q5",
            Difficulty::Hard,
            Category::React,
            "How would you optimize a React application with large lists? Discuss virtualization and memoization.",
        ),
        question(
            "q6",
            Difficulty::Hard,
            Category::SystemDesign,
            "Design a RESTful API for a real-time chat application. Discuss authentication, message storage, and scalability.",
        ),
    ]
}
