use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::catalog::{default_sub_stage_of, Stage};
use super::domain::{Actor, ApplicationId, JobApplication};
use super::error::{PipelineError, ValidationError};
use super::repository::Collaborators;
use super::transition::{load_application, load_job, StageMove, StageTransitionEngine};

/// How strictly a batch move validates each item.
///
/// `Lenient` only checks company ownership and that the target is a movable catalog
/// stage. The sub-stage follows the job's default for the target, or the catalog default
/// when the job has not enabled it; a move onto the current stage keeps the sub-stage.
/// `Strict` sends every item through
/// [`StageTransitionEngine::move_stage`], so pipeline membership, forward-only order and
/// per-job sub-stage configuration all apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkMode {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemError {
    pub application_id: ApplicationId,
    pub error: String,
}

/// Per-item report of a batch move. The batch only counts as failed when nothing moved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkMoveReport {
    pub success: bool,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<BulkItemError>,
}

impl BulkMoveReport {
    fn record(&mut self, application_id: &ApplicationId, result: Result<JobApplication, PipelineError>) {
        match result {
            Ok(_) => self.updated += 1,
            Err(err) => {
                warn!(application_id = %application_id, error = %err, "bulk stage move skipped item");
                self.failed += 1;
                self.errors.push(BulkItemError {
                    application_id: application_id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    fn finish(mut self) -> Self {
        self.success = !(self.updated == 0 && self.failed > 0);
        self
    }
}

#[derive(Clone)]
pub struct BulkStageUpdater {
    collaborators: Collaborators,
    transitions: StageTransitionEngine,
    mode: BulkMode,
}

impl BulkStageUpdater {
    pub fn new(collaborators: Collaborators, transitions: StageTransitionEngine, mode: BulkMode) -> Self {
        Self {
            collaborators,
            transitions,
            mode,
        }
    }

    /// Move every application to `target_stage`; one failure never stops the rest.
    pub fn bulk_move(
        &self,
        application_ids: &[ApplicationId],
        target_stage: Stage,
        actor: &Actor,
    ) -> BulkMoveReport {
        let mut report = BulkMoveReport::default();

        for application_id in application_ids {
            let result = match self.mode {
                BulkMode::Lenient => self.move_lenient(application_id, target_stage, actor),
                BulkMode::Strict => {
                    self.transitions
                        .move_stage(application_id, target_stage, None, actor)
                }
            };
            report.record(application_id, result);
        }

        let report = report.finish();
        info!(
            target_stage = %target_stage,
            mode = ?self.mode,
            updated = report.updated,
            failed = report.failed,
            "bulk stage move finished"
        );
        report
    }

    fn move_lenient(
        &self,
        application_id: &ApplicationId,
        target_stage: Stage,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        let application = load_application(&self.collaborators, application_id)?;
        if application.company_id != actor.company_id {
            return Err(PipelineError::Authorization {
                actor: actor.company_id.clone(),
                owner: application.company_id.clone(),
            });
        }
        if application.is_hired() {
            return Err(ValidationError::AlreadyHired.into());
        }
        if target_stage.is_terminal() {
            return Err(ValidationError::HireRequiresLifecycle.into());
        }

        let sub_stage = if application.stage == target_stage {
            application.sub_stage
        } else {
            let job = load_job(&self.collaborators, &application.job_id)?;
            if job.pipeline.is_enabled(target_stage) {
                job.pipeline.resolve_default_sub_stage(target_stage)
            } else {
                default_sub_stage_of(target_stage)
            }
        };

        let planned = StageMove {
            stage: target_stage,
            sub_stage,
        };
        self.transitions.commit(&application, planned, actor)
    }
}
