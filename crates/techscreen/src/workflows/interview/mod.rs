//! Timed technical interview: question bank, session state machine, timer recovery,
//! scoring, and the controller that ties them to storage and the results store.

pub mod bank;
pub mod controller;
pub mod domain;
pub mod router;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod views;

pub use bank::QuestionBank;
pub use controller::{
    BootReport, Clock, InterviewController, Resumption, SharedController, SystemClock,
    TickOutcome,
};
pub use domain::{
    Answer, CandidateId, Category, Difficulty, Question, SessionStatus, SubmitMode, Transition,
};
pub use router::{interview_router, InterviewApp};
pub use scheduler::spawn_ticker;
pub use session::InterviewSession;
pub use timer::{reconcile, TimerRecovery, SESSION_EXPIRY_SECONDS};
pub use views::{QuestionView, ScoreView, SessionView};
