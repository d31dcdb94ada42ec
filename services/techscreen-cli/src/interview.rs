use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;

use techscreen::config::AppConfig;
use techscreen::error::AppError;
use techscreen::persistence::FileStore;
use techscreen::telemetry::{self, LogSink};
use techscreen::workflows::interview::{
    spawn_ticker, InterviewController, SessionStatus, SessionView, SharedController, TimerRecovery,
    Transition,
};
use techscreen::workflows::profile::{validate_profile, CandidateProfile, ProfileField};

use crate::infra::{load_resume, open_controller};
use crate::terminal::{render_question, render_score};

/// Remaining-time marks announced while a question is open.
const COUNTDOWN_WARNINGS: [u32; 2] = [10, 5];

#[derive(Args, Debug, Default)]
pub(crate) struct InterviewArgs {
    /// Resume to pre-fill contact details (PDF or DOCX)
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) email: Option<String>,
    #[arg(long)]
    pub(crate) phone: Option<String>,
    /// Discard an unfinished or finished session and start over
    #[arg(long)]
    pub(crate) fresh: bool,
}

type Input = Lines<BufReader<Stdin>>;

pub(crate) async fn run_interview(args: InterviewArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, &LogSink::File(config.storage.log_path()))?;

    let (mut controller, report) = open_controller(&config);
    if let Some(warning) = &report.warning {
        println!("Warning: {warning}");
    }
    if let Some(resumption) = &report.resumption {
        match resumption.recovery {
            TimerRecovery::Resumed {
                remaining_seconds, ..
            } if resumption.auto_submitted.is_none() => {
                println!("Welcome back. {remaining_seconds}s left on the current question.")
            }
            _ => println!("Welcome back. Time ran out while you were away; the answer was submitted."),
        }
    }

    if args.fresh {
        let _ = controller.reset();
    }

    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();
    match controller.session().status() {
        SessionStatus::Complete => {
            if let Some(score) = controller.view().score {
                render_score(&score);
            }
            println!("\nRun `techscreen interview --fresh` to start another interview.");
            return Ok(());
        }
        SessionStatus::NotStarted => {
            let profile = collect_profile(&args, &mut input).await?;
            let Some(profile) = profile else {
                return Ok(());
            };
            let _ = controller.set_profile(profile)?;
            let _ = controller.start()?;
        }
        SessionStatus::Active => {}
    }

    let tick_period = config.interview.tick_period;
    let generation = controller.generation();
    let controller = Arc::new(Mutex::new(controller));
    let _ticker = spawn_ticker(controller.clone(), generation, tick_period);
    answer_questions(&controller, &mut input, tick_period).await?;

    let view = lock(&controller).view();
    if let Some(score) = &view.score {
        render_score(score);
    }
    if let Some(warning) = &view.storage_warning {
        println!("Warning: {warning}");
    }
    Ok(())
}

fn lock(controller: &SharedController<FileStore>) -> MutexGuard<'_, InterviewController<FileStore>> {
    controller.lock().expect("controller mutex poisoned")
}

/// Starts from the resume (if any), applies flags, then asks for whatever is still invalid.
/// `None` when stdin closes first.
async fn collect_profile(
    args: &InterviewArgs,
    input: &mut Input,
) -> Result<Option<CandidateProfile>, AppError> {
    let mut profile = match &args.resume {
        Some(path) => {
            let parsed = load_resume(path)?;
            println!("Read {} ({})", parsed.file_name, parsed.format);
            CandidateProfile::from_resume(parsed, Utc::now())
        }
        None => CandidateProfile::new(),
    };
    if let Some(name) = &args.name {
        profile.name = Some(name.clone());
    }
    if let Some(email) = &args.email {
        profile.email = Some(email.clone());
    }
    if let Some(phone) = &args.phone {
        profile.phone = Some(phone.clone());
    }

    while let Err(errors) = validate_profile(&profile) {
        for (field, message) in &errors.fields {
            println!("{message}");
            let prompt = match field {
                ProfileField::Name => "Full name: ",
                ProfileField::Email => "Email: ",
                ProfileField::Phone => "Phone: ",
            };
            println!("{prompt}");
            let Some(line) = input.next_line().await? else {
                return Ok(None);
            };
            let value = Some(line.trim().to_string());
            match field {
                ProfileField::Name => profile.name = value,
                ProfileField::Email => profile.email = value,
                ProfileField::Phone => profile.phone = value,
            }
        }
    }
    Ok(Some(profile))
}

/// Reads answer lines until the session completes. Auto-submissions from the ticker are
/// noticed on the next poll and the following question is shown.
async fn answer_questions(
    controller: &SharedController<FileStore>,
    input: &mut Input,
    tick_period: Duration,
) -> Result<(), AppError> {
    let mut shown = lock(controller).view();
    if let Some(question) = &shown.question {
        render_question(question);
    }
    let mut draft = shown.draft.clone();
    if !draft.is_empty() {
        println!("(restored draft)\n{draft}");
    }

    let mut poll = tokio::time::interval(tick_period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = input.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    println!("Input closed; the timer keeps running.");
                    continue;
                };
                let mut guard = lock(controller);
                if guard.session().answers().len() > shown.answered {
                    draft.clear();
                }
                let transition = if line.trim().is_empty() {
                    guard.submit()
                } else {
                    if !draft.is_empty() {
                        draft.push('\n');
                    }
                    draft.push_str(&line);
                    guard.update_draft(draft.clone())
                };
                let view = guard.view();
                drop(guard);

                if matches!(transition, Transition::Advanced { .. } | Transition::Completed) {
                    draft.clear();
                }
                if show_progress(&shown, &view) {
                    return Ok(());
                }
                shown = view;
            }
            _ = poll.tick() => {
                let view = lock(controller).view();
                if view.answered > shown.answered {
                    draft.clear();
                    println!("\nTime is up; your answer was submitted.");
                } else if view.status == SessionStatus::Active
                    && view.time_remaining_seconds != shown.time_remaining_seconds
                    && COUNTDOWN_WARNINGS.contains(&view.time_remaining_seconds)
                {
                    println!("{}s left", view.time_remaining_seconds);
                }
                if show_progress(&shown, &view) {
                    return Ok(());
                }
                shown = view;
            }
        }
    }
}

/// Prints the next question when it changed. Returns true once the interview is over.
fn show_progress(previous: &SessionView, current: &SessionView) -> bool {
    if current.status != SessionStatus::Active {
        return true;
    }
    let previous_id = previous.question.as_ref().map(|question| question.id.as_str());
    if let Some(question) = &current.question {
        if Some(question.id.as_str()) != previous_id {
            render_question(question);
        }
    }
    false
}
