use chrono::Utc;
use tracing::{debug, info, warn};

use super::catalog::{is_valid_sub_stage_for_stage, Stage, SubStage};
use super::config::PipelineConfig;
use super::domain::{Actor, ApplicationId, JobApplication, JobId, JobPosting};
use super::error::{PipelineError, ValidationError};
use super::repository::{
    ApplicationPatch, Collaborators, StageChangeEntry, StageChangeEvent,
};

/// Validated target of a stage move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageMove {
    pub stage: Stage,
    pub sub_stage: Option<SubStage>,
}

/// Validate a move of `application` to `next_stage` against the job's pipeline.
///
/// Checks run in a fixed order so each rejection reports the first rule broken. When the
/// application's current stage is no longer enabled (the job's pipeline changed after it
/// entered) the forward-only rule is skipped so the application can be recovered.
pub fn plan_stage_move(
    pipeline: &PipelineConfig,
    application: &JobApplication,
    next_stage: Stage,
    sub_stage: Option<SubStage>,
) -> Result<StageMove, ValidationError> {
    if application.is_hired() {
        return Err(ValidationError::AlreadyHired);
    }
    if next_stage.is_terminal() {
        return Err(ValidationError::HireRequiresLifecycle);
    }

    let Some(target) = pipeline.position_of(next_stage) else {
        return Err(ValidationError::StageNotEnabled { stage: next_stage });
    };

    if let Some(current) = pipeline.position_of(application.stage) {
        if target < current {
            return Err(ValidationError::BackwardMove {
                from: application.stage,
                to: next_stage,
            });
        }
    }

    let sub_stage = match sub_stage {
        Some(requested) => {
            if !is_valid_sub_stage_for_stage(next_stage, requested) {
                return Err(ValidationError::SubStageNotInCatalog {
                    stage: next_stage,
                    sub_stage: requested,
                });
            }
            if !pipeline.permits_sub_stage(next_stage, requested) {
                return Err(ValidationError::SubStageNotAllowed {
                    stage: next_stage,
                    sub_stage: requested,
                });
            }
            Some(requested)
        }
        None => pipeline.resolve_default_sub_stage(next_stage),
    };

    Ok(StageMove {
        stage: next_stage,
        sub_stage,
    })
}

/// Applies validated stage moves and emits the activity log and candidate push.
#[derive(Clone)]
pub struct StageTransitionEngine {
    collaborators: Collaborators,
}

impl StageTransitionEngine {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    pub fn move_stage(
        &self,
        application_id: &ApplicationId,
        next_stage: Stage,
        sub_stage: Option<SubStage>,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        let application = load_application(&self.collaborators, application_id)?;
        let job = load_job(&self.collaborators, &application.job_id)?;
        ensure_owner(&job, actor)?;

        let planned = plan_stage_move(&job.pipeline, &application, next_stage, sub_stage)
            .inspect_err(|err| {
                debug!(
                    application_id = %application.id,
                    from = %application.stage,
                    to = %next_stage,
                    reason = %err,
                    "stage move rejected"
                );
            })?;

        self.commit(&application, planned, actor)
    }

    /// Move straight to HIRED. Only the vacancy lifecycle calls this, after it has
    /// checked the job can take another hire; HIRED is always reachable.
    pub(crate) fn commit_hire(
        &self,
        application: &JobApplication,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        let planned = StageMove {
            stage: Stage::Hired,
            sub_stage: None,
        };
        self.commit(application, planned, actor)
    }

    pub(crate) fn commit(
        &self,
        application: &JobApplication,
        planned: StageMove,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        let patch = ApplicationPatch::stage(planned.stage, planned.sub_stage, Utc::now());
        let updated = self
            .collaborators
            .applications
            .update(&application.id, patch)?;

        info!(
            application_id = %updated.id,
            job_id = %updated.job_id,
            from = %application.stage,
            to = %updated.stage,
            actor = %actor.user_id,
            "application stage changed"
        );

        let entry = StageChangeEntry {
            application_id: updated.id.clone(),
            previous_stage: application.stage,
            previous_sub_stage: application.sub_stage,
            next_stage: updated.stage,
            next_sub_stage: updated.sub_stage,
            actor: actor.clone(),
        };
        if let Err(err) = self.collaborators.activity.log_stage_change(entry) {
            warn!(application_id = %updated.id, error = %err, "failed to record stage change");
        }

        publish_change(&self.collaborators, &updated);
        Ok(updated)
    }
}

pub(crate) fn load_application(
    collaborators: &Collaborators,
    id: &ApplicationId,
) -> Result<JobApplication, PipelineError> {
    collaborators
        .applications
        .find_by_id(id)?
        .ok_or_else(|| PipelineError::application_not_found(id))
}

pub(crate) fn load_job(
    collaborators: &Collaborators,
    id: &JobId,
) -> Result<JobPosting, PipelineError> {
    collaborators
        .jobs
        .find_by_id(id)?
        .ok_or_else(|| PipelineError::job_not_found(id))
}

pub(crate) fn ensure_owner(job: &JobPosting, actor: &Actor) -> Result<(), PipelineError> {
    if job.company_id == actor.company_id {
        Ok(())
    } else {
        Err(PipelineError::Authorization {
            actor: actor.company_id.clone(),
            owner: job.company_id.clone(),
        })
    }
}

pub(crate) fn publish_change(collaborators: &Collaborators, application: &JobApplication) {
    let event = StageChangeEvent::for_application(application);
    if let Err(err) = collaborators.notifications.notify(event) {
        warn!(
            application_id = %application.id,
            error = %err,
            "stage change notification dropped"
        );
    }
}
