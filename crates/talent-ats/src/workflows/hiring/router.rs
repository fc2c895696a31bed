use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::catalog::{Stage, SubStage};
use super::domain::{Actor, ApplicationId, Candidate, JobId};
use super::error::PipelineError;
use super::service::{HiringPipelineService, NewJob};

pub const USER_HEADER: &str = "x-user-id";
pub const COMPANY_HEADER: &str = "x-company-id";

/// Catalog codes arrive as plain strings so unknown values surface as validation errors.
#[derive(Debug, Deserialize)]
pub(crate) struct MoveStageRequest {
    pub(crate) stage: String,
    #[serde(default)]
    pub(crate) sub_stage: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateSubStageRequest {
    pub(crate) sub_stage: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReopenRequest {
    pub(crate) additional_vacancies: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VacanciesRequest {
    pub(crate) total_vacancies: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkMoveRequest {
    pub(crate) application_ids: Vec<ApplicationId>,
    pub(crate) stage: String,
}

/// Router builder exposing the hiring pipeline over HTTP.
pub fn pipeline_router(service: Arc<HiringPipelineService>) -> Router {
    Router::new()
        .route("/api/v1/ats/jobs", post(post_job_handler))
        .route("/api/v1/ats/jobs/:job_id", get(job_handler))
        .route("/api/v1/ats/jobs/:job_id/board", get(board_handler))
        .route(
            "/api/v1/ats/jobs/:job_id/applications",
            post(submit_handler),
        )
        .route("/api/v1/ats/jobs/:job_id/close", post(close_handler))
        .route("/api/v1/ats/jobs/:job_id/reopen", post(reopen_handler))
        .route(
            "/api/v1/ats/jobs/:job_id/vacancies",
            post(vacancies_handler),
        )
        .route(
            "/api/v1/ats/applications/bulk-stage",
            post(bulk_move_handler),
        )
        .route(
            "/api/v1/ats/applications/:application_id",
            get(application_handler),
        )
        .route(
            "/api/v1/ats/applications/:application_id/stage",
            post(move_stage_handler),
        )
        .route(
            "/api/v1/ats/applications/:application_id/sub-stage",
            post(sub_stage_handler),
        )
        .route(
            "/api/v1/ats/applications/:application_id/hire",
            post(hire_handler),
        )
        .with_state(service)
}

pub(crate) fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, PipelineError> {
    let read = |name: &'static str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(PipelineError::MissingActor(name))
    };

    Ok(Actor::new(read(USER_HEADER)?, read(COMPANY_HEADER)?))
}

pub(crate) async fn post_job_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Json(new_job): Json<NewJob>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let job = service.post_job(new_job, &actor)?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

pub(crate) async fn job_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let job = service.get_job(&JobId(job_id), &actor)?;
    Ok(Json(job).into_response())
}

pub(crate) async fn board_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let board = service.pipeline_board(&JobId(job_id), &actor)?;
    Ok(Json(board).into_response())
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<HiringPipelineService>>,
    Path(job_id): Path<String>,
    Json(candidate): Json<Candidate>,
) -> Result<Response, PipelineError> {
    let application = service.submit_application(&JobId(job_id), candidate)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn close_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let outcome = service.close_job(&JobId(job_id), &actor)?;
    Ok(Json(outcome).into_response())
}

pub(crate) async fn reopen_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(request): Json<ReopenRequest>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let job = service.reopen_job(&JobId(job_id), request.additional_vacancies, &actor)?;
    Ok(Json(job).into_response())
}

pub(crate) async fn vacancies_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(request): Json<VacanciesRequest>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let job = service.update_total_vacancies(&JobId(job_id), request.total_vacancies, &actor)?;
    Ok(Json(job).into_response())
}

pub(crate) async fn application_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let application = service.get_application(&ApplicationId(application_id), &actor)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn move_stage_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<MoveStageRequest>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let stage: Stage = request.stage.parse()?;
    let sub_stage = request
        .sub_stage
        .as_deref()
        .map(str::parse::<SubStage>)
        .transpose()?;
    let application =
        service.move_stage(&ApplicationId(application_id), stage, sub_stage, &actor)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn sub_stage_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<UpdateSubStageRequest>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let sub_stage: SubStage = request.sub_stage.parse()?;
    let application =
        service.update_sub_stage(&ApplicationId(application_id), sub_stage, &actor)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn hire_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let outcome = service.mark_hired(&ApplicationId(application_id), &actor)?;
    Ok(Json(outcome).into_response())
}

pub(crate) async fn bulk_move_handler(
    State(service): State<Arc<HiringPipelineService>>,
    headers: HeaderMap,
    Json(request): Json<BulkMoveRequest>,
) -> Result<Response, PipelineError> {
    let actor = actor_from_headers(&headers)?;
    let stage: Stage = request.stage.parse()?;
    let report = service.bulk_move(&request.application_ids, stage, &actor);
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(report)).into_response())
}
