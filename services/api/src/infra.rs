use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use talent_ats::config::PipelineSettings;
use talent_ats::workflows::hiring::{
    ActivityLogError, ActivityLogger, ApplicationId, ApplicationPatch, ApplicationRepository,
    Collaborators, JobApplication, JobId, JobPatch, JobPosting, JobRepository, MailError, Mailer,
    NotificationError, NotificationService, RepositoryError, StageChangeEntry, StageChangeEvent,
    SubStageChangeEntry,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, JobApplication>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: JobApplication) -> Result<JobApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn find_by_id(&self, id: &ApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<JobApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        patch.apply_to(record);
        Ok(record.clone())
    }

    fn find_by_job_id(&self, job_id: &JobId) -> Result<Vec<JobApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut applications: Vec<JobApplication> = guard
            .values()
            .filter(|application| &application.job_id == job_id)
            .cloned()
            .collect();
        applications.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(applications)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    records: Arc<Mutex<HashMap<JobId, JobPosting>>>,
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn find_by_id(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, id: &JobId, patch: JobPatch) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        patch.apply_to(record);
        Ok(record.clone())
    }
}

/// Activity log that emits tracing events and keeps the stage history in memory.
#[derive(Default, Clone)]
pub(crate) struct TracingActivityLog {
    stage_changes: Arc<Mutex<Vec<StageChangeEntry>>>,
}

impl TracingActivityLog {
    pub(crate) fn stage_changes(&self) -> Vec<StageChangeEntry> {
        self.stage_changes
            .lock()
            .expect("activity mutex poisoned")
            .clone()
    }
}

impl ActivityLogger for TracingActivityLog {
    fn log_stage_change(&self, entry: StageChangeEntry) -> Result<(), ActivityLogError> {
        info!(
            application_id = %entry.application_id,
            previous_stage = %entry.previous_stage,
            next_stage = %entry.next_stage,
            actor = %entry.actor.user_id,
            "activity: stage changed"
        );
        self.stage_changes
            .lock()
            .expect("activity mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn log_sub_stage_change(&self, entry: SubStageChangeEntry) -> Result<(), ActivityLogError> {
        info!(
            application_id = %entry.application_id,
            stage = %entry.stage,
            next_sub_stage = %entry.next_sub_stage,
            actor = %entry.actor.user_id,
            "activity: sub-stage changed"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutboundMail {
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) subject: String,
}

/// Mailer that records the envelope of each message instead of delivering it.
#[derive(Clone)]
pub(crate) struct OutboxMailer {
    from: String,
    outbox: Arc<Mutex<Vec<OutboundMail>>>,
}

impl OutboxMailer {
    pub(crate) fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            outbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn outbox(&self) -> Vec<OutboundMail> {
        self.outbox.lock().expect("outbox mutex poisoned").clone()
    }
}

impl Mailer for OutboxMailer {
    fn send_mail(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if !to.contains('@') {
            return Err(MailError::Rejected(to.to_string()));
        }
        info!(from = %self.from, %to, %subject, bytes = html.len(), "mail queued");
        self.outbox
            .lock()
            .expect("outbox mutex poisoned")
            .push(OutboundMail {
                from: self.from.clone(),
                to: to.to_string(),
                subject: subject.to_string(),
            });
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct TracingNotifier;

impl NotificationService for TracingNotifier {
    fn notify(&self, event: StageChangeEvent) -> Result<(), NotificationError> {
        info!(
            application_id = %event.application_id,
            job_id = %event.job_id,
            stage = %event.stage,
            "stage change broadcast"
        );
        Ok(())
    }
}

/// Handles kept alongside the collaborator bundle so callers can inspect side effects.
pub(crate) struct InMemoryBackends {
    pub(crate) collaborators: Collaborators,
    pub(crate) activity: Arc<TracingActivityLog>,
    pub(crate) mailer: Arc<OutboxMailer>,
}

pub(crate) fn in_memory_backends(settings: &PipelineSettings) -> InMemoryBackends {
    let activity = Arc::new(TracingActivityLog::default());
    let mailer = Arc::new(OutboxMailer::new(settings.mail_from.clone()));
    let collaborators = Collaborators {
        applications: Arc::new(InMemoryApplicationRepository::default()),
        jobs: Arc::new(InMemoryJobRepository::default()),
        activity: activity.clone(),
        mailer: mailer.clone(),
        notifications: Arc::new(TracingNotifier),
    };

    InMemoryBackends {
        collaborators,
        activity,
        mailer,
    }
}
