//! Applicant tracking pipeline and job vacancy lifecycle.
//!
//! Applications advance through a fixed stage catalog, restricted per job by a
//! [`PipelineConfig`]. The transition engines validate and apply moves; the vacancy
//! lifecycle owns hiring, auto-close, and the rejection fan-out that follows a closure.

pub mod bulk;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod router;
pub mod service;
pub mod sub_stage;
pub mod transition;
pub mod vacancy;

#[cfg(test)]
mod tests;

pub use bulk::{BulkItemError, BulkMode, BulkMoveReport, BulkStageUpdater};
pub use catalog::{
    default_sub_stage_of, is_valid_sub_stage_for_stage, valid_sub_stages_of, Stage, SubStage,
    UnknownCatalogEntry,
};
pub use config::PipelineConfig;
pub use domain::{
    Actor, ApplicationId, Candidate, ClosureType, CompanyId, JobApplication, JobClosure, JobId,
    JobPosting, JobStatus,
};
pub use error::{PipelineError, ValidationError};
pub use repository::{
    ActivityLogError, ActivityLogger, ApplicationPatch, ApplicationRepository, Collaborators,
    JobPatch, JobRepository, MailError, Mailer, NotificationError, NotificationService,
    RepositoryError, StageChangeEntry, StageChangeEvent, SubStageChangeEntry,
};
pub use router::pipeline_router;
pub use service::{BoardColumn, HiringPipelineService, NewJob, PipelineBoard};
pub use sub_stage::SubStageTransitionEngine;
pub use transition::{StageMove, StageTransitionEngine};
pub use vacancy::{ClosureOutcome, FanOutReport, HireOutcome, RejectionMail, VacancyLifecycleManager};
