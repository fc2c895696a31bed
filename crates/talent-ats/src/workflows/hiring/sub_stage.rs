use chrono::Utc;
use tracing::{debug, info, warn};

use super::catalog::{is_valid_sub_stage_for_stage, SubStage};
use super::config::PipelineConfig;
use super::domain::{Actor, ApplicationId, JobApplication};
use super::error::{PipelineError, ValidationError};
use super::repository::{ApplicationPatch, Collaborators, SubStageChangeEntry};
use super::transition::{ensure_owner, load_application, load_job, publish_change};

/// Validate a sub-stage change within the application's current stage.
pub fn plan_sub_stage_change(
    pipeline: &PipelineConfig,
    application: &JobApplication,
    sub_stage: SubStage,
) -> Result<SubStage, ValidationError> {
    if application.is_hired() {
        return Err(ValidationError::AlreadyHired);
    }

    let stage = application.stage;
    if !is_valid_sub_stage_for_stage(stage, sub_stage) {
        return Err(ValidationError::SubStageNotInCatalog { stage, sub_stage });
    }
    if !pipeline.permits_sub_stage(stage, sub_stage) {
        return Err(ValidationError::SubStageNotAllowed { stage, sub_stage });
    }

    Ok(sub_stage)
}

/// Changes only the sub-stage; never moves an application between stages.
#[derive(Clone)]
pub struct SubStageTransitionEngine {
    collaborators: Collaborators,
}

impl SubStageTransitionEngine {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    pub fn update_sub_stage(
        &self,
        application_id: &ApplicationId,
        sub_stage: SubStage,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        let application = load_application(&self.collaborators, application_id)?;
        let job = load_job(&self.collaborators, &application.job_id)?;
        ensure_owner(&job, actor)?;

        let sub_stage = plan_sub_stage_change(&job.pipeline, &application, sub_stage)
            .inspect_err(|err| {
                debug!(
                    application_id = %application.id,
                    stage = %application.stage,
                    requested = %sub_stage,
                    reason = %err,
                    "sub-stage change rejected"
                );
            })?;

        let updated = self
            .collaborators
            .applications
            .update(&application.id, ApplicationPatch::sub_stage(sub_stage, Utc::now()))?;

        info!(
            application_id = %updated.id,
            stage = %updated.stage,
            sub_stage = %sub_stage,
            actor = %actor.user_id,
            "application sub-stage changed"
        );

        let entry = SubStageChangeEntry {
            application_id: updated.id.clone(),
            stage: application.stage,
            previous_sub_stage: application.sub_stage,
            next_sub_stage: sub_stage,
            actor: actor.clone(),
        };
        if let Err(err) = self.collaborators.activity.log_sub_stage_change(entry) {
            warn!(application_id = %updated.id, error = %err, "failed to record sub-stage change");
        }

        publish_change(&self.collaborators, &updated);
        Ok(updated)
    }
}
