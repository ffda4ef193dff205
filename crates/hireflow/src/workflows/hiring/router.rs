use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, HrId, JobId, WorkflowStage};
use super::engine::{HiringWorkflowEngine, WorkflowError};
use super::repository::StoreError;

/// Router builder exposing the workflow operations over HTTP.
pub fn workflow_router(engine: Arc<HiringWorkflowEngine>) -> Router {
    Router::new()
        .route(
            "/api/v1/workflow/applications/:application_id/initiate",
            post(initiate_handler),
        )
        .route(
            "/api/v1/workflow/applications/:application_id/advance",
            post(advance_handler),
        )
        .route("/api/v1/workflow/overview", get(overview_handler))
        .route(
            "/api/v1/workflow/pending-actions",
            get(pending_actions_handler),
        )
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvanceRequest {
    pub(crate) stage: WorkflowStage,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    #[serde(default = "default_auto_schedule")]
    pub(crate) auto_schedule: bool,
}

fn default_auto_schedule() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverviewQuery {
    pub(crate) job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PendingActionsQuery {
    pub(crate) hr_id: Option<String>,
}

pub(crate) async fn initiate_handler(
    State(engine): State<Arc<HiringWorkflowEngine>>,
    Path(application_id): Path<String>,
) -> Response {
    let id = ApplicationId(application_id);
    match engine.initiate(&id) {
        Ok(outcome) => (StatusCode::CREATED, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler(
    State(engine): State<Arc<HiringWorkflowEngine>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<AdvanceRequest>,
) -> Response {
    let id = ApplicationId(application_id);
    match engine.advance(&id, request.stage, request.notes, request.auto_schedule) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn overview_handler(
    State(engine): State<Arc<HiringWorkflowEngine>>,
    Query(query): Query<OverviewQuery>,
) -> Response {
    let job_id = query.job_id.map(JobId);
    match engine.overview(job_id.as_ref()) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pending_actions_handler(
    State(engine): State<Arc<HiringWorkflowEngine>>,
    Query(query): Query<PendingActionsQuery>,
) -> Response {
    let hr_id = query.hr_id.map(HrId);
    match engine.pending_actions(hr_id.as_ref()) {
        Ok(actions) => (StatusCode::OK, axum::Json(actions)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: WorkflowError) -> Response {
    let status = match &err {
        WorkflowError::NotFound => StatusCode::NOT_FOUND,
        WorkflowError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
