use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Actor, ApplicationId, ClosureType, JobApplication, JobClosure, JobId, JobPosting, JobStatus,
};
use super::error::{PipelineError, ValidationError};
use super::repository::{Collaborators, JobPatch};
use super::transition::{ensure_owner, load_application, load_job, StageTransitionEngine};

/// Subject and body template for the rejection mail sent when a job closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionMail {
    pub subject: String,
}

impl RejectionMail {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    pub fn render(&self, job: &JobPosting, application: &JobApplication) -> String {
        format!(
            "<p>Hi {name},</p>\
             <p>Thank you for your interest in the {title} position. The role has now been \
             filled and we will not be moving forward with your application.</p>\
             <p>We wish you the best in your search.</p>",
            name = escape_html(&application.candidate.name),
            title = escape_html(&job.title),
        )
    }
}

impl Default for RejectionMail {
    fn default() -> Self {
        Self::new("Update on your application")
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Per-recipient tally of a rejection fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HireOutcome {
    pub application: JobApplication,
    pub job: JobPosting,
    pub auto_closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejections: Option<FanOutReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosureOutcome {
    pub job: JobPosting,
    pub rejections: FanOutReport,
}

/// Owns vacancy accounting: hires, auto-close, manual close, reopen, and headcount edits.
///
/// Fill counts are read-modify-write against the job repository with no version check,
/// so concurrent hires on one job race at the storage layer (last write wins).
#[derive(Clone)]
pub struct VacancyLifecycleManager {
    collaborators: Collaborators,
    transitions: StageTransitionEngine,
    rejection: RejectionMail,
}

impl VacancyLifecycleManager {
    pub fn new(
        collaborators: Collaborators,
        transitions: StageTransitionEngine,
        rejection: RejectionMail,
    ) -> Self {
        Self {
            collaborators,
            transitions,
            rejection,
        }
    }

    pub fn mark_hired(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<HireOutcome, PipelineError> {
        let application = load_application(&self.collaborators, application_id)?;
        let job = load_job(&self.collaborators, &application.job_id)?;
        ensure_owner(&job, actor)?;

        if application.is_hired() {
            return Err(ValidationError::AlreadyHired.into());
        }
        if job.is_closed() {
            return Err(ValidationError::HireIntoClosedJob.into());
        }
        if job.is_fully_staffed() {
            return Err(ValidationError::NoOpenVacancies {
                filled: job.filled_vacancies,
                total: job.total_vacancies,
            }
            .into());
        }

        let hired = self.transitions.commit_hire(&application, actor)?;

        let filled = job.filled_vacancies + 1;
        let auto_closed = filled >= job.total_vacancies;
        let mut patch = JobPatch {
            filled_vacancies: Some(filled),
            ..JobPatch::default()
        };
        if auto_closed {
            patch.status = Some(JobStatus::Closed);
            patch.closure = Some(Some(JobClosure {
                closure_type: ClosureType::AutoFilled,
                closed_at: Utc::now(),
            }));
        }
        let job = self.collaborators.jobs.update(&job.id, patch)?;

        info!(
            application_id = %hired.id,
            job_id = %job.id,
            filled = job.filled_vacancies,
            total = job.total_vacancies,
            auto_closed,
            "candidate hired"
        );

        let rejections = if auto_closed {
            info!(job_id = %job.id, "job auto-closed after final vacancy filled");
            Some(self.reject_open_applications(&job, Some(&hired.id)))
        } else {
            None
        };

        Ok(HireOutcome {
            application: hired,
            job,
            auto_closed,
            rejections,
        })
    }

    pub fn close_manually(
        &self,
        job_id: &JobId,
        actor: &Actor,
    ) -> Result<ClosureOutcome, PipelineError> {
        let job = load_job(&self.collaborators, job_id)?;
        ensure_owner(&job, actor)?;

        if job.is_closed() {
            return Err(ValidationError::AlreadyClosed.into());
        }

        let patch = JobPatch {
            status: Some(JobStatus::Closed),
            closure: Some(Some(JobClosure {
                closure_type: ClosureType::Manual,
                closed_at: Utc::now(),
            })),
            ..JobPatch::default()
        };
        let job = self.collaborators.jobs.update(&job.id, patch)?;
        info!(job_id = %job.id, actor = %actor.user_id, "job closed manually");

        let rejections = self.reject_open_applications(&job, None);
        Ok(ClosureOutcome { job, rejections })
    }

    /// Reopen an auto-closed job with extra headcount. Manually closed jobs stay closed.
    pub fn reopen(
        &self,
        job_id: &JobId,
        additional_vacancies: u32,
        actor: &Actor,
    ) -> Result<JobPosting, PipelineError> {
        let job = load_job(&self.collaborators, job_id)?;
        ensure_owner(&job, actor)?;

        if !job.is_closed() || job.closure_type() != Some(ClosureType::AutoFilled) {
            return Err(ValidationError::NotReopenable {
                status: job.status,
                closure: job.closure_type(),
            }
            .into());
        }
        if additional_vacancies < 1 {
            return Err(ValidationError::InvalidVacancyCount(additional_vacancies.into()).into());
        }

        let new_total = job
            .total_vacancies
            .checked_add(additional_vacancies)
            .ok_or_else(|| {
                ValidationError::InvalidVacancyCount(
                    u64::from(job.total_vacancies) + u64::from(additional_vacancies),
                )
            })?;
        if new_total < job.filled_vacancies {
            return Err(ValidationError::VacanciesBelowFilled {
                requested: new_total,
                filled: job.filled_vacancies,
            }
            .into());
        }

        let patch = JobPatch {
            status: Some(JobStatus::Active),
            closure: Some(None),
            total_vacancies: Some(new_total),
            ..JobPatch::default()
        };
        let job = self.collaborators.jobs.update(&job.id, patch)?;
        info!(
            job_id = %job.id,
            total = job.total_vacancies,
            filled = job.filled_vacancies,
            "job reopened"
        );
        Ok(job)
    }

    pub fn update_total_vacancies(
        &self,
        job_id: &JobId,
        new_total: u32,
        actor: &Actor,
    ) -> Result<JobPosting, PipelineError> {
        let job = load_job(&self.collaborators, job_id)?;
        ensure_owner(&job, actor)?;

        if job.status != JobStatus::Active {
            return Err(ValidationError::JobNotActive { status: job.status }.into());
        }
        if new_total < 1 {
            return Err(ValidationError::InvalidVacancyCount(new_total.into()).into());
        }
        if new_total < job.filled_vacancies {
            return Err(ValidationError::VacanciesBelowFilled {
                requested: new_total,
                filled: job.filled_vacancies,
            }
            .into());
        }

        let patch = JobPatch {
            total_vacancies: Some(new_total),
            ..JobPatch::default()
        };
        let job = self.collaborators.jobs.update(&job.id, patch)?;
        info!(job_id = %job.id, total = job.total_vacancies, "job vacancies updated");
        Ok(job)
    }

    /// Best-effort rejection mail to every non-hired applicant; one failed send is logged
    /// and skipped without affecting the closure.
    fn reject_open_applications(
        &self,
        job: &JobPosting,
        exclude: Option<&ApplicationId>,
    ) -> FanOutReport {
        let applications = match self.collaborators.applications.find_by_job_id(&job.id) {
            Ok(applications) => applications,
            Err(err) => {
                warn!(job_id = %job.id, error = %err, "could not load applicants for rejection mail");
                return FanOutReport::default();
            }
        };

        let mut report = FanOutReport::default();
        for application in applications
            .iter()
            .filter(|application| !application.is_hired())
            .filter(|application| Some(&application.id) != exclude)
        {
            let html = self.rejection.render(job, application);
            match self.collaborators.mailer.send_mail(
                &application.candidate.email,
                &self.rejection.subject,
                &html,
            ) {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        job_id = %job.id,
                        application_id = %application.id,
                        error = %err,
                        "rejection mail not sent"
                    );
                }
            }
        }

        info!(
            job_id = %job.id,
            sent = report.sent,
            failed = report.failed,
            "rejection fan-out finished"
        );
        report
    }
}
