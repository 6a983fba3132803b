use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{EmployeeId, EmployeeRecord, ReviewPeriodId};
use super::hierarchy::{CandidatePicker, ResolverError};
use super::population::{CancellationFlag, PopulationScope};
use super::repository::{Organisation, ProfileRepository, ReviewRepository};
use super::service::{ProfileLeg, Relation, ReviewAgentService, ReviewServiceError};

/// Router builder exposing counterpart selection, population, scoring, and matching.
pub fn review_router<O, S, K>(service: Arc<ReviewAgentService<O, S, K>>) -> Router
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
    K: CandidatePicker + 'static,
{
    Router::new()
        .route(
            "/api/v1/reviews/employees/:employee_id/:relation",
            get(counterpart_handler::<O, S, K>),
        )
        .route("/api/v1/reviews/populate", post(populate_handler::<O, S, K>))
        .route(
            "/api/v1/reviews/profiles/:employee_id/:period_id",
            get(gap_report_handler::<O, S, K>),
        )
        .route(
            "/api/v1/reviews/profiles/:employee_id/:period_id/:leg",
            post(calculate_handler::<O, S, K>),
        )
        .route(
            "/api/v1/reviews/partial-match",
            post(partial_match_handler::<O, S, K>),
        )
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub(crate) struct CounterpartResponse {
    pub(crate) employee_id: EmployeeId,
    pub(crate) relation: Relation,
    pub(crate) employee: Option<EmployeeRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PopulateRequest {
    /// Absent scope populates the whole organisation.
    #[serde(default)]
    pub(crate) scope: Option<PopulationScope>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartialMatchRequest {
    pub(crate) left: String,
    pub(crate) right: String,
}

pub(crate) async fn counterpart_handler<O, S, K>(
    State(service): State<Arc<ReviewAgentService<O, S, K>>>,
    Path((employee_id, relation)): Path<(String, Relation)>,
) -> Response
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
    K: CandidatePicker + 'static,
{
    let employee_id = EmployeeId(employee_id);
    match service.counterpart(&employee_id, relation) {
        Ok(employee) => {
            let body = CounterpartResponse {
                employee_id,
                relation,
                employee,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(ReviewServiceError::Resolver(ResolverError::UnknownEmployee(id))) => {
            let payload = json!({
                "error": format!("employee {id} not found"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn populate_handler<O, S, K>(
    State(service): State<Arc<ReviewAgentService<O, S, K>>>,
    axum::Json(request): axum::Json<PopulateRequest>,
) -> Response
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
    K: CandidatePicker + 'static,
{
    let scope = request.scope.unwrap_or(PopulationScope::Organisation);
    match service.populate(&scope, &CancellationFlag::new()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn calculate_handler<O, S, K>(
    State(service): State<Arc<ReviewAgentService<O, S, K>>>,
    Path((employee_id, period_id, leg)): Path<(String, u32, ProfileLeg)>,
) -> Response
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
    K: CandidatePicker + 'static,
{
    let employee_id = EmployeeId(employee_id);
    match service.calculate(&employee_id, ReviewPeriodId(period_id), leg) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn gap_report_handler<O, S, K>(
    State(service): State<Arc<ReviewAgentService<O, S, K>>>,
    Path((employee_id, period_id)): Path<(String, u32)>,
) -> Response
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
    K: CandidatePicker + 'static,
{
    let employee_id = EmployeeId(employee_id);
    match service.gap_report(&employee_id, ReviewPeriodId(period_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn partial_match_handler<O, S, K>(
    State(service): State<Arc<ReviewAgentService<O, S, K>>>,
    axum::Json(request): axum::Json<PartialMatchRequest>,
) -> Response
where
    O: Organisation + 'static,
    S: ReviewRepository + ProfileRepository + 'static,
    K: CandidatePicker + 'static,
{
    let outcome = service.partial_match(&request.left, &request.right);
    (StatusCode::OK, axum::Json(outcome)).into_response()
}

fn internal_error(error: ReviewServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
