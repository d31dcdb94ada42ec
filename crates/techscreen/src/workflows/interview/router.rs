use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::controller::SharedController;
use super::domain::{CandidateId, Transition};
use super::scheduler::spawn_ticker;
use super::views::SessionView;
use crate::error::AppError;
use crate::persistence::KeyValueStore;
use crate::workflows::candidates::{CandidateRowView, CandidateViewUpdate, SortField, SortOrder};
use crate::workflows::interview::scoring::Rating;
use crate::workflows::profile::CandidateProfile;

/// Shared state behind the interview routes.
pub struct InterviewApp<K> {
    pub controller: SharedController<K>,
    pub tick_period: Duration,
}

impl<K> Clone for InterviewApp<K> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            tick_period: self.tick_period,
        }
    }
}

/// Routes for the single local interview session and the candidate results.
pub fn interview_router<K>(app: InterviewApp<K>) -> Router
where
    K: KeyValueStore + 'static,
{
    Router::new()
        .route("/api/v1/interview", get(session_handler::<K>))
        .route("/api/v1/interview/profile", post(profile_handler::<K>))
        .route("/api/v1/interview/start", post(start_handler::<K>))
        .route("/api/v1/interview/draft", put(draft_handler::<K>))
        .route("/api/v1/interview/submit", post(submit_handler::<K>))
        .route("/api/v1/interview/reset", post(reset_handler::<K>))
        .route("/api/v1/interview/rescore", post(rescore_handler::<K>))
        .route("/api/v1/candidates", get(list_candidates_handler::<K>))
        .route(
            "/api/v1/candidates/:candidate_id",
            get(candidate_handler::<K>).delete(remove_candidate_handler::<K>),
        )
        .with_state(app)
}

#[derive(Debug, Serialize)]
struct TransitionResponse {
    #[serde(flatten)]
    transition: Transition,
    session: SessionView,
}

fn transition_response(transition: Transition, session: SessionView) -> Response {
    (
        StatusCode::OK,
        Json(TransitionResponse {
            transition,
            session,
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub resume_file_name: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateListParams {
    pub search: Option<String>,
    pub rating: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl CandidateListParams {
    /// Present parameters replace the saved view; `rating=all` (or empty) drops the filter.
    fn into_update(self) -> Result<CandidateViewUpdate, String> {
        let rating = match self.rating.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(raw) if raw.eq_ignore_ascii_case("all") => Some(None),
            Some(raw) => Some(Some(
                raw.parse::<Rating>().map_err(|err| err.to_string())?,
            )),
        };
        let sort_by = self
            .sort_by
            .map(|raw| raw.parse::<SortField>())
            .transpose()
            .map_err(|err| err.to_string())?;
        let order = self
            .order
            .map(|raw| raw.parse::<SortOrder>())
            .transpose()
            .map_err(|err| err.to_string())?;
        Ok(CandidateViewUpdate {
            search: self.search,
            rating,
            sort_by,
            order,
        })
    }
}

pub(crate) async fn session_handler<K>(State(app): State<InterviewApp<K>>) -> Response
where
    K: KeyValueStore + 'static,
{
    let view = app.controller.lock().expect("controller mutex poisoned").view();
    (StatusCode::OK, Json(view)).into_response()
}

pub(crate) async fn profile_handler<K>(
    State(app): State<InterviewApp<K>>,
    Json(request): Json<ProfileRequest>,
) -> Response
where
    K: KeyValueStore + 'static,
{
    let profile = CandidateProfile {
        name: request.name,
        email: request.email,
        phone: request.phone,
        resume_file_name: request.resume_file_name,
        resume_text: request.resume_text,
        ..CandidateProfile::new()
    };

    let mut controller = app.controller.lock().expect("controller mutex poisoned");
    match controller.set_profile(profile) {
        Ok(transition) => transition_response(transition, controller.view()),
        Err(errors) => AppError::from(errors).into_response(),
    }
}

pub(crate) async fn start_handler<K>(State(app): State<InterviewApp<K>>) -> Response
where
    K: KeyValueStore + 'static,
{
    let (result, generation, view) = {
        let mut controller = app.controller.lock().expect("controller mutex poisoned");
        let result = controller.start();
        (result, controller.generation(), controller.view())
    };

    match result {
        Ok(transition) => {
            if transition.is_applied() {
                let _ticker = spawn_ticker(app.controller.clone(), generation, app.tick_period);
            }
            transition_response(transition, view)
        }
        Err(errors) => AppError::from(errors).into_response(),
    }
}

pub(crate) async fn draft_handler<K>(
    State(app): State<InterviewApp<K>>,
    Json(request): Json<DraftRequest>,
) -> Response
where
    K: KeyValueStore + 'static,
{
    let mut controller = app.controller.lock().expect("controller mutex poisoned");
    let transition = controller.update_draft(request.text);
    transition_response(transition, controller.view())
}

pub(crate) async fn submit_handler<K>(State(app): State<InterviewApp<K>>) -> Response
where
    K: KeyValueStore + 'static,
{
    let mut controller = app.controller.lock().expect("controller mutex poisoned");
    let transition = controller.submit();
    transition_response(transition, controller.view())
}

pub(crate) async fn reset_handler<K>(State(app): State<InterviewApp<K>>) -> Response
where
    K: KeyValueStore + 'static,
{
    let mut controller = app.controller.lock().expect("controller mutex poisoned");
    let transition = controller.reset();
    transition_response(transition, controller.view())
}

pub(crate) async fn rescore_handler<K>(State(app): State<InterviewApp<K>>) -> Response
where
    K: KeyValueStore + 'static,
{
    let mut controller = app.controller.lock().expect("controller mutex poisoned");
    let transition = controller.rescore();
    transition_response(transition, controller.view())
}

pub(crate) async fn list_candidates_handler<K>(
    State(app): State<InterviewApp<K>>,
    Query(params): Query<CandidateListParams>,
) -> Response
where
    K: KeyValueStore + 'static,
{
    let update = match params.into_update() {
        Ok(update) => update,
        Err(message) => {
            let payload = json!({ "error": message });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    let mut controller = app.controller.lock().expect("controller mutex poisoned");
    if !update.is_empty() {
        controller.update_candidate_view(update);
    }
    let store = controller.candidates();
    let rows: Vec<CandidateRowView> = store
        .filtered_and_sorted()
        .into_iter()
        .map(|record| record.row_view())
        .collect();
    let payload = json!({
        "count": rows.len(),
        "total": store.count(),
        "view": store.current_query(),
        "top_candidate": store.top_candidate().map(|record| &record.id),
        "candidates": rows,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn candidate_handler<K>(
    State(app): State<InterviewApp<K>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    K: KeyValueStore + 'static,
{
    let id = CandidateId(candidate_id);
    let controller = app.controller.lock().expect("controller mutex poisoned");
    match controller.candidates().get(&id) {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => candidate_not_found(&id),
    }
}

pub(crate) async fn remove_candidate_handler<K>(
    State(app): State<InterviewApp<K>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    K: KeyValueStore + 'static,
{
    let id = CandidateId(candidate_id);
    let removed = app
        .controller
        .lock()
        .expect("controller mutex poisoned")
        .remove_candidate(&id);
    match removed {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => candidate_not_found(&id),
    }
}

fn candidate_not_found(id: &CandidateId) -> Response {
    let payload = json!({
        "error": "candidate not found",
        "candidate_id": id,
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}
