use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineSettings;

use super::bulk::{BulkMoveReport, BulkStageUpdater};
use super::catalog::{Stage, SubStage};
use super::config::PipelineConfig;
use super::domain::{
    Actor, ApplicationId, Candidate, JobApplication, JobId, JobPosting, JobStatus,
};
use super::error::{PipelineError, ValidationError};
use super::repository::Collaborators;
use super::sub_stage::SubStageTransitionEngine;
use super::transition::{ensure_owner, load_application, load_job, StageTransitionEngine};
use super::vacancy::{ClosureOutcome, HireOutcome, RejectionMail, VacancyLifecycleManager};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Request to post a new job. Omitting `pipeline` selects [`PipelineConfig::standard`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub total_vacancies: u32,
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardColumn {
    pub stage: Stage,
    pub label: &'static str,
    pub count: usize,
}

/// Application counts per stage for the hiring board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineBoard {
    pub job_id: JobId,
    pub status: &'static str,
    pub open_vacancies: u32,
    pub columns: Vec<BoardColumn>,
}

/// Service composing the transition engines, vacancy lifecycle and bulk updater behind
/// one facade for the HTTP layer.
#[derive(Clone)]
pub struct HiringPipelineService {
    collaborators: Collaborators,
    transitions: StageTransitionEngine,
    sub_stages: SubStageTransitionEngine,
    vacancies: VacancyLifecycleManager,
    bulk: BulkStageUpdater,
}

impl HiringPipelineService {
    pub fn new(collaborators: Collaborators, settings: &PipelineSettings) -> Self {
        let transitions = StageTransitionEngine::new(collaborators.clone());
        let sub_stages = SubStageTransitionEngine::new(collaborators.clone());
        let vacancies = VacancyLifecycleManager::new(
            collaborators.clone(),
            transitions.clone(),
            RejectionMail::new(settings.rejection_subject.clone()),
        );
        let bulk = BulkStageUpdater::new(collaborators.clone(), transitions.clone(), settings.bulk_mode);

        Self {
            collaborators,
            transitions,
            sub_stages,
            vacancies,
            bulk,
        }
    }

    pub fn post_job(&self, new_job: NewJob, actor: &Actor) -> Result<JobPosting, PipelineError> {
        if new_job.total_vacancies < 1 {
            return Err(ValidationError::InvalidVacancyCount(new_job.total_vacancies.into()).into());
        }

        let job = JobPosting {
            id: next_job_id(),
            company_id: actor.company_id.clone(),
            title: new_job.title,
            status: JobStatus::Active,
            closure: None,
            total_vacancies: new_job.total_vacancies,
            filled_vacancies: 0,
            pipeline: new_job.pipeline.unwrap_or_default(),
            created_at: Utc::now(),
        };

        let stored = self.collaborators.jobs.insert(job)?;
        info!(job_id = %stored.id, company_id = %stored.company_id, "job posted");
        Ok(stored)
    }

    /// Candidate-facing intake; closed jobs take no new applications.
    pub fn submit_application(
        &self,
        job_id: &JobId,
        candidate: Candidate,
    ) -> Result<JobApplication, PipelineError> {
        let job = load_job(&self.collaborators, job_id)?;
        if job.is_closed() {
            return Err(ValidationError::JobClosed.into());
        }

        let application = JobApplication::new(next_application_id(), &job, candidate, Utc::now());
        let stored = self.collaborators.applications.insert(application)?;
        info!(application_id = %stored.id, job_id = %stored.job_id, "application received");
        Ok(stored)
    }

    pub fn get_application(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        let application = load_application(&self.collaborators, application_id)?;
        if application.company_id != actor.company_id {
            return Err(PipelineError::Authorization {
                actor: actor.company_id.clone(),
                owner: application.company_id,
            });
        }
        Ok(application)
    }

    pub fn get_job(&self, job_id: &JobId, actor: &Actor) -> Result<JobPosting, PipelineError> {
        let job = load_job(&self.collaborators, job_id)?;
        ensure_owner(&job, actor)?;
        Ok(job)
    }

    pub fn pipeline_board(&self, job_id: &JobId, actor: &Actor) -> Result<PipelineBoard, PipelineError> {
        let job = self.get_job(job_id, actor)?;
        let applications = self.collaborators.applications.find_by_job_id(job_id)?;

        let mut counts: BTreeMap<Stage, usize> = job
            .pipeline
            .enabled_stages()
            .iter()
            .map(|stage| (*stage, 0))
            .collect();
        counts.insert(Stage::Hired, 0);
        for application in &applications {
            *counts.entry(application.stage).or_insert(0) += 1;
        }

        Ok(PipelineBoard {
            job_id: job.id.clone(),
            status: job.status.label(),
            open_vacancies: job.open_vacancies(),
            columns: counts
                .into_iter()
                .map(|(stage, count)| BoardColumn {
                    stage,
                    label: stage.label(),
                    count,
                })
                .collect(),
        })
    }

    pub fn move_stage(
        &self,
        application_id: &ApplicationId,
        next_stage: Stage,
        sub_stage: Option<SubStage>,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        self.transitions
            .move_stage(application_id, next_stage, sub_stage, actor)
    }

    pub fn update_sub_stage(
        &self,
        application_id: &ApplicationId,
        sub_stage: SubStage,
        actor: &Actor,
    ) -> Result<JobApplication, PipelineError> {
        self.sub_stages
            .update_sub_stage(application_id, sub_stage, actor)
    }

    pub fn mark_hired(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<HireOutcome, PipelineError> {
        self.vacancies.mark_hired(application_id, actor)
    }

    pub fn close_job(&self, job_id: &JobId, actor: &Actor) -> Result<ClosureOutcome, PipelineError> {
        self.vacancies.close_manually(job_id, actor)
    }

    pub fn reopen_job(
        &self,
        job_id: &JobId,
        additional_vacancies: u32,
        actor: &Actor,
    ) -> Result<JobPosting, PipelineError> {
        self.vacancies.reopen(job_id, additional_vacancies, actor)
    }

    pub fn update_total_vacancies(
        &self,
        job_id: &JobId,
        new_total: u32,
        actor: &Actor,
    ) -> Result<JobPosting, PipelineError> {
        self.vacancies
            .update_total_vacancies(job_id, new_total, actor)
    }

    pub fn bulk_move(
        &self,
        application_ids: &[ApplicationId],
        target_stage: Stage,
        actor: &Actor,
    ) -> BulkMoveReport {
        self.bulk.bulk_move(application_ids, target_stage, actor)
    }
}
