use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{Stage, SubStage};
use super::domain::{
    Actor, ApplicationId, JobApplication, JobClosure, JobId, JobPosting, JobStatus,
};

/// Partial write for an application. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationPatch {
    pub stage: Option<Stage>,
    pub sub_stage: Option<Option<SubStage>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApplicationPatch {
    pub fn stage(stage: Stage, sub_stage: Option<SubStage>, now: DateTime<Utc>) -> Self {
        Self {
            stage: Some(stage),
            sub_stage: Some(sub_stage),
            updated_at: Some(now),
        }
    }

    pub fn sub_stage(sub_stage: SubStage, now: DateTime<Utc>) -> Self {
        Self {
            stage: None,
            sub_stage: Some(Some(sub_stage)),
            updated_at: Some(now),
        }
    }

    pub fn apply_to(&self, application: &mut JobApplication) {
        if let Some(stage) = self.stage {
            application.stage = stage;
        }
        if let Some(sub_stage) = self.sub_stage {
            application.sub_stage = sub_stage;
        }
        if let Some(updated_at) = self.updated_at {
            application.updated_at = updated_at;
        }
    }
}

/// Partial write for a job posting. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub closure: Option<Option<JobClosure>>,
    pub total_vacancies: Option<u32>,
    pub filled_vacancies: Option<u32>,
}

impl JobPatch {
    pub fn apply_to(&self, job: &mut JobPosting) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(closure) = self.closure {
            job.closure = closure;
        }
        if let Some(total) = self.total_vacancies {
            job.total_vacancies = total;
        }
        if let Some(filled) = self.filled_vacancies {
            job.filled_vacancies = filled;
        }
    }
}

/// Storage abstraction for applications so the engines can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: JobApplication) -> Result<JobApplication, RepositoryError>;
    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<JobApplication>, RepositoryError>;
    fn update(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<JobApplication, RepositoryError>;
    fn find_by_job_id(&self, job_id: &JobId) -> Result<Vec<JobApplication>, RepositoryError>;
}

/// Storage abstraction for job postings.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
    fn find_by_id(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
    fn update(&self, id: &JobId, patch: JobPatch) -> Result<JobPosting, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Audit entry written for every stage move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChangeEntry {
    pub application_id: ApplicationId,
    pub previous_stage: Stage,
    pub previous_sub_stage: Option<SubStage>,
    pub next_stage: Stage,
    pub next_sub_stage: Option<SubStage>,
    pub actor: Actor,
}

/// Audit entry for a sub-stage change; `stage` is unchanged by definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubStageChangeEntry {
    pub application_id: ApplicationId,
    pub stage: Stage,
    pub previous_sub_stage: Option<SubStage>,
    pub next_sub_stage: SubStage,
    pub actor: Actor,
}

pub trait ActivityLogger: Send + Sync {
    fn log_stage_change(&self, entry: StageChangeEntry) -> Result<(), ActivityLogError>;
    fn log_sub_stage_change(&self, entry: SubStageChangeEntry) -> Result<(), ActivityLogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ActivityLogError {
    #[error("activity log unavailable: {0}")]
    Unavailable(String),
}

/// Outbound mail used for the rejection fan-out.
pub trait Mailer: Send + Sync {
    fn send_mail(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}

/// Push payload delivered to the affected candidate after a pipeline change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChangeEvent {
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub stage: Stage,
    pub sub_stage: Option<SubStage>,
}

impl StageChangeEvent {
    pub fn for_application(application: &JobApplication) -> Self {
        Self {
            application_id: application.id.clone(),
            job_id: application.job_id.clone(),
            stage: application.stage,
            sub_stage: application.sub_stage,
        }
    }
}

/// Fire-and-forget push channel; failures never affect pipeline state.
pub trait NotificationService: Send + Sync {
    fn notify(&self, event: StageChangeEvent) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Shared handles to every collaborator the pipeline touches.
#[derive(Clone)]
pub struct Collaborators {
    pub applications: Arc<dyn ApplicationRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub activity: Arc<dyn ActivityLogger>,
    pub mailer: Arc<dyn Mailer>,
    pub notifications: Arc<dyn NotificationService>,
}
