use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::catalog::{Stage, SubStage, UnknownCatalogEntry};
use super::domain::{ClosureType, CompanyId, JobStatus};
use super::repository::RepositoryError;

/// Failures raised by the transition engines and the vacancy lifecycle.
///
/// Every variant is raised before any write, so a failed single-item operation never
/// leaves partial state behind.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("company '{actor}' cannot act on resources owned by company '{owner}'")]
    Authorization { actor: CompanyId, owner: CompanyId },
    #[error("missing actor header '{0}'")]
    MissingActor(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PipelineError {
    pub(crate) fn application_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "application",
            id: id.to_string(),
        }
    }

    pub(crate) fn job_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "job",
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Authorization { .. } => StatusCode::FORBIDDEN,
            PipelineError::MissingActor(_) => StatusCode::UNAUTHORIZED,
            PipelineError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            PipelineError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UnknownCatalogEntry> for PipelineError {
    fn from(value: UnknownCatalogEntry) -> Self {
        Self::Validation(ValidationError::UnknownCatalogEntry(value))
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Business-rule violations; each maps to one distinct rejection reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("stage {stage} is not enabled for this job")]
    StageNotEnabled { stage: Stage },
    #[error("cannot move backward from {from} to {to}; stages only advance")]
    BackwardMove { from: Stage, to: Stage },
    #[error("sub-stage {sub_stage} does not belong to stage {stage}")]
    SubStageNotInCatalog { stage: Stage, sub_stage: SubStage },
    #[error("sub-stage {sub_stage} is not allowed for stage {stage} on this job")]
    SubStageNotAllowed { stage: Stage, sub_stage: SubStage },
    #[error("application already hired")]
    AlreadyHired,
    #[error("candidates reach HIRED only through mark-hired")]
    HireRequiresLifecycle,
    #[error("cannot hire into a closed job")]
    HireIntoClosedJob,
    #[error("job is closed and no longer accepts applications")]
    JobClosed,
    #[error("no open vacancies remain ({filled} of {total} filled)")]
    NoOpenVacancies { filled: u32, total: u32 },
    #[error("job is already closed")]
    AlreadyClosed,
    #[error("only auto-closed jobs can be reopened (status {status:?}, closure {closure:?})")]
    NotReopenable {
        status: JobStatus,
        closure: Option<ClosureType>,
    },
    #[error("vacancies can only be edited while the job is active (status {status:?})")]
    JobNotActive { status: JobStatus },
    #[error("total vacancies {requested} would fall below {filled} filled")]
    VacanciesBelowFilled { requested: u32, filled: u32 },
    #[error("vacancy count must be at least 1 (got {0})")]
    InvalidVacancyCount(u64),
    #[error(transparent)]
    UnknownCatalogEntry(#[from] UnknownCatalogEntry),
}
