use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::catalog::{default_sub_stage_of, Stage, SubStage};
use super::config::PipelineConfig;

/// Identifier wrapper for candidate applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for hiring companies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Company user performing an operation. Authentication happens upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub company_id: CompanyId,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: CompanyId(company_id.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Active,
    Unlisted,
    Expired,
    Blocked,
    Closed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Unlisted => "unlisted",
            JobStatus::Expired => "expired",
            JobStatus::Blocked => "blocked",
            JobStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureType {
    Manual,
    AutoFilled,
}

/// Present on a job exactly while its status is CLOSED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobClosure {
    pub closure_type: ClosureType,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub company_id: CompanyId,
    pub title: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closure: Option<JobClosure>,
    pub total_vacancies: u32,
    pub filled_vacancies: u32,
    pub pipeline: PipelineConfig,
    pub created_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn is_closed(&self) -> bool {
        self.status == JobStatus::Closed
    }

    pub fn closure_type(&self) -> Option<ClosureType> {
        self.closure.map(|closure| closure.closure_type)
    }

    pub fn open_vacancies(&self) -> u32 {
        self.total_vacancies.saturating_sub(self.filled_vacancies)
    }

    pub fn is_fully_staffed(&self) -> bool {
        self.filled_vacancies >= self.total_vacancies
    }
}

/// Contact details needed for candidate-facing mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub company_id: CompanyId,
    pub candidate: Candidate,
    pub stage: Stage,
    /// `None` only once the application reaches HIRED.
    pub sub_stage: Option<SubStage>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobApplication {
    /// New applications always enter at IN_REVIEW with its default sub-stage.
    pub fn new(id: ApplicationId, job: &JobPosting, candidate: Candidate, now: DateTime<Utc>) -> Self {
        Self {
            id,
            job_id: job.id.clone(),
            company_id: job.company_id.clone(),
            candidate,
            stage: Stage::InReview,
            sub_stage: default_sub_stage_of(Stage::InReview),
            submitted_at: now,
            updated_at: now,
        }
    }

    pub fn is_hired(&self) -> bool {
        self.stage.is_terminal()
    }
}
