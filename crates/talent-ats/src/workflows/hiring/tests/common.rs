use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::config::PipelineSettings;
use crate::workflows::hiring::catalog::{Stage, SubStage};
use crate::workflows::hiring::config::PipelineConfig;
use crate::workflows::hiring::domain::{
    Actor, ApplicationId, Candidate, JobApplication, JobId, JobPosting,
};
use crate::workflows::hiring::repository::{
    ActivityLogError, ActivityLogger, ApplicationPatch, ApplicationRepository, Collaborators,
    JobPatch, JobRepository, MailError, Mailer, NotificationError, NotificationService,
    RepositoryError, StageChangeEntry, StageChangeEvent, SubStageChangeEntry,
};
use crate::workflows::hiring::service::{HiringPipelineService, NewJob};

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    records: Arc<Mutex<BTreeMap<ApplicationId, JobApplication>>>,
}

impl ApplicationRepository for MemoryApplications {
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
        Ok(guard
            .values()
            .filter(|application| &application.job_id == job_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryJobs {
    records: Arc<Mutex<BTreeMap<JobId, JobPosting>>>,
}

impl MemoryJobs {
    pub(super) fn get(&self, id: &JobId) -> JobPosting {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("job present")
    }
}

impl JobRepository for MemoryJobs {
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

#[derive(Default, Clone)]
pub(super) struct MemoryActivity {
    stage_changes: Arc<Mutex<Vec<StageChangeEntry>>>,
    sub_stage_changes: Arc<Mutex<Vec<SubStageChangeEntry>>>,
}

impl MemoryActivity {
    pub(super) fn stage_changes(&self) -> Vec<StageChangeEntry> {
        self.stage_changes.lock().expect("activity mutex poisoned").clone()
    }

    pub(super) fn sub_stage_changes(&self) -> Vec<SubStageChangeEntry> {
        self.sub_stage_changes
            .lock()
            .expect("activity mutex poisoned")
            .clone()
    }
}

impl ActivityLogger for MemoryActivity {
    fn log_stage_change(&self, entry: StageChangeEntry) -> Result<(), ActivityLogError> {
        self.stage_changes
            .lock()
            .expect("activity mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn log_sub_stage_change(&self, entry: SubStageChangeEntry) -> Result<(), ActivityLogError> {
        self.sub_stage_changes
            .lock()
            .expect("activity mutex poisoned")
            .push(entry);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SentMail {
    pub(super) to: String,
    pub(super) subject: String,
    pub(super) html: String,
}

#[derive(Default, Clone)]
pub(super) struct MemoryMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MemoryMailer {
    pub(super) fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }

    pub(super) fn fail_for(&self, email: &str) {
        self.failing
            .lock()
            .expect("mailer mutex poisoned")
            .insert(email.to_string());
    }
}

impl Mailer for MemoryMailer {
    fn send_mail(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if self.failing.lock().expect("mailer mutex poisoned").contains(to) {
            return Err(MailError::Rejected(to.to_string()));
        }
        self.sent.lock().expect("mailer mutex poisoned").push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<StageChangeEvent>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<StageChangeEvent> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationService for MemoryNotifications {
    fn notify(&self, event: StageChangeEvent) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct OfflineNotifications;

impl NotificationService for OfflineNotifications {
    fn notify(&self, _event: StageChangeEvent) -> Result<(), NotificationError> {
        Err(NotificationError::Unavailable("socket gateway down".to_string()))
    }
}

pub(super) struct OfflineActivity;

impl ActivityLogger for OfflineActivity {
    fn log_stage_change(&self, _entry: StageChangeEntry) -> Result<(), ActivityLogError> {
        Err(ActivityLogError::Unavailable("audit store down".to_string()))
    }

    fn log_sub_stage_change(&self, _entry: SubStageChangeEntry) -> Result<(), ActivityLogError> {
        Err(ActivityLogError::Unavailable("audit store down".to_string()))
    }
}

pub(super) struct Harness {
    pub(super) service: HiringPipelineService,
    pub(super) collaborators: Collaborators,
    pub(super) applications: Arc<MemoryApplications>,
    pub(super) jobs: Arc<MemoryJobs>,
    pub(super) activity: Arc<MemoryActivity>,
    pub(super) mailer: Arc<MemoryMailer>,
    pub(super) notifications: Arc<MemoryNotifications>,
}

pub(super) fn harness() -> Harness {
    harness_with(PipelineSettings::default())
}

pub(super) fn harness_with(settings: PipelineSettings) -> Harness {
    let applications = Arc::new(MemoryApplications::default());
    let jobs = Arc::new(MemoryJobs::default());
    let activity = Arc::new(MemoryActivity::default());
    let mailer = Arc::new(MemoryMailer::default());
    let notifications = Arc::new(MemoryNotifications::default());

    let collaborators = Collaborators {
        applications: applications.clone(),
        jobs: jobs.clone(),
        activity: activity.clone(),
        mailer: mailer.clone(),
        notifications: notifications.clone(),
    };
    let service = HiringPipelineService::new(collaborators.clone(), &settings);

    Harness {
        service,
        collaborators,
        applications,
        jobs,
        activity,
        mailer,
        notifications,
    }
}

pub(super) fn recruiter() -> Actor {
    Actor::new("recruiter-1", "acme")
}

pub(super) fn outsider() -> Actor {
    Actor::new("recruiter-9", "globex")
}

/// IN_REVIEW, SHORTLISTED, INTERVIEW, OFFER with OFFER limited to NOT_SENT/OFFER_SENT.
pub(super) fn compact_pipeline() -> PipelineConfig {
    let mut allowed = BTreeMap::new();
    allowed.insert(Stage::InReview, vec![SubStage::PendingReview, SubStage::Reviewed]);
    allowed.insert(
        Stage::Shortlisted,
        vec![SubStage::NotContacted, SubStage::Contacted],
    );
    allowed.insert(
        Stage::Interview,
        vec![SubStage::NotScheduled, SubStage::Scheduled, SubStage::Completed],
    );
    allowed.insert(Stage::Offer, vec![SubStage::NotSent, SubStage::OfferSent]);
    PipelineConfig::new(
        [Stage::InReview, Stage::Shortlisted, Stage::Interview, Stage::Offer],
        allowed,
    )
}

pub(super) fn post_job(harness: &Harness, total_vacancies: u32, pipeline: PipelineConfig) -> JobPosting {
    harness
        .service
        .post_job(
            NewJob {
                title: "Backend Engineer".to_string(),
                total_vacancies,
                pipeline: Some(pipeline),
            },
            &recruiter(),
        )
        .expect("job posts")
}

pub(super) fn apply(harness: &Harness, job: &JobPosting, name: &str) -> JobApplication {
    harness
        .service
        .submit_application(
            &job.id,
            Candidate {
                name: name.to_string(),
                email: format!("{}@candidates.test", name.to_ascii_lowercase()),
            },
        )
        .expect("application submits")
}

/// Put an application at an arbitrary position without going through the engines.
pub(super) fn place(
    harness: &Harness,
    application: &JobApplication,
    stage: Stage,
    sub_stage: Option<SubStage>,
) -> JobApplication {
    harness
        .applications
        .update(
            &application.id,
            ApplicationPatch::stage(stage, sub_stage, Utc::now()),
        )
        .expect("application placed")
}

pub(super) fn stored(harness: &Harness, application: &JobApplication) -> JobApplication {
    harness
        .applications
        .find_by_id(&application.id)
        .expect("fetch succeeds")
        .expect("application present")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
