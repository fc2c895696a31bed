use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hiring pipeline stages in the only order an application may travel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    InReview,
    Shortlisted,
    Interview,
    TechnicalTask,
    Compensation,
    Offer,
    Hired,
}

impl Stage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::InReview,
            Self::Shortlisted,
            Self::Interview,
            Self::TechnicalTask,
            Self::Compensation,
            Self::Offer,
            Self::Hired,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::InReview => "IN_REVIEW",
            Self::Shortlisted => "SHORTLISTED",
            Self::Interview => "INTERVIEW",
            Self::TechnicalTask => "TECHNICAL_TASK",
            Self::Compensation => "COMPENSATION",
            Self::Offer => "OFFER",
            Self::Hired => "HIRED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InReview => "In Review",
            Self::Shortlisted => "Shortlisted",
            Self::Interview => "Interview",
            Self::TechnicalTask => "Technical Task",
            Self::Compensation => "Compensation",
            Self::Offer => "Offer",
            Self::Hired => "Hired",
        }
    }

    /// HIRED closes the pipeline: no sub-stages, no further moves.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Hired)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Stage {
    type Err = UnknownCatalogEntry;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|stage| stage.code().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownCatalogEntry::new("stage", raw))
    }
}

/// Finer-grained status, each variant scoped to exactly one [`Stage`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubStage {
    PendingReview,
    Reviewed,
    NotContacted,
    Contacted,
    AwaitingResponse,
    NotScheduled,
    Scheduled,
    Rescheduled,
    Completed,
    TaskPending,
    TaskSent,
    TaskSubmitted,
    TaskReviewed,
    DiscussionPending,
    Negotiating,
    Agreed,
    NotSent,
    OfferSent,
    OfferAccepted,
    OfferDeclined,
}

const IN_REVIEW_SUB_STAGES: &[SubStage] = &[SubStage::PendingReview, SubStage::Reviewed];
const SHORTLISTED_SUB_STAGES: &[SubStage] = &[
    SubStage::NotContacted,
    SubStage::Contacted,
    SubStage::AwaitingResponse,
];
const INTERVIEW_SUB_STAGES: &[SubStage] = &[
    SubStage::NotScheduled,
    SubStage::Scheduled,
    SubStage::Rescheduled,
    SubStage::Completed,
];
const TECHNICAL_TASK_SUB_STAGES: &[SubStage] = &[
    SubStage::TaskPending,
    SubStage::TaskSent,
    SubStage::TaskSubmitted,
    SubStage::TaskReviewed,
];
const COMPENSATION_SUB_STAGES: &[SubStage] = &[
    SubStage::DiscussionPending,
    SubStage::Negotiating,
    SubStage::Agreed,
];
const OFFER_SUB_STAGES: &[SubStage] = &[
    SubStage::NotSent,
    SubStage::OfferSent,
    SubStage::OfferAccepted,
    SubStage::OfferDeclined,
];

impl SubStage {
    pub const fn stage(self) -> Stage {
        match self {
            Self::PendingReview | Self::Reviewed => Stage::InReview,
            Self::NotContacted | Self::Contacted | Self::AwaitingResponse => Stage::Shortlisted,
            Self::NotScheduled | Self::Scheduled | Self::Rescheduled | Self::Completed => {
                Stage::Interview
            }
            Self::TaskPending | Self::TaskSent | Self::TaskSubmitted | Self::TaskReviewed => {
                Stage::TechnicalTask
            }
            Self::DiscussionPending | Self::Negotiating | Self::Agreed => Stage::Compensation,
            Self::NotSent | Self::OfferSent | Self::OfferAccepted | Self::OfferDeclined => {
                Stage::Offer
            }
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::PendingReview => "PENDING_REVIEW",
            Self::Reviewed => "REVIEWED",
            Self::NotContacted => "NOT_CONTACTED",
            Self::Contacted => "CONTACTED",
            Self::AwaitingResponse => "AWAITING_RESPONSE",
            Self::NotScheduled => "NOT_SCHEDULED",
            Self::Scheduled => "SCHEDULED",
            Self::Rescheduled => "RESCHEDULED",
            Self::Completed => "COMPLETED",
            Self::TaskPending => "TASK_PENDING",
            Self::TaskSent => "TASK_SENT",
            Self::TaskSubmitted => "TASK_SUBMITTED",
            Self::TaskReviewed => "TASK_REVIEWED",
            Self::DiscussionPending => "DISCUSSION_PENDING",
            Self::Negotiating => "NEGOTIATING",
            Self::Agreed => "AGREED",
            Self::NotSent => "NOT_SENT",
            Self::OfferSent => "OFFER_SENT",
            Self::OfferAccepted => "OFFER_ACCEPTED",
            Self::OfferDeclined => "OFFER_DECLINED",
        }
    }
}

impl fmt::Display for SubStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SubStage {
    type Err = UnknownCatalogEntry;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Stage::ordered()
            .into_iter()
            .flat_map(|stage| valid_sub_stages_of(stage).iter().copied())
            .find(|sub_stage| sub_stage.code().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownCatalogEntry::new("sub-stage", raw))
    }
}

/// The catalog's closed sub-stage set for `stage`; empty for HIRED.
pub const fn valid_sub_stages_of(stage: Stage) -> &'static [SubStage] {
    match stage {
        Stage::InReview => IN_REVIEW_SUB_STAGES,
        Stage::Shortlisted => SHORTLISTED_SUB_STAGES,
        Stage::Interview => INTERVIEW_SUB_STAGES,
        Stage::TechnicalTask => TECHNICAL_TASK_SUB_STAGES,
        Stage::Compensation => COMPENSATION_SUB_STAGES,
        Stage::Offer => OFFER_SUB_STAGES,
        Stage::Hired => &[],
    }
}

/// Sub-stage used when a transition names none. `None` only for HIRED.
pub const fn default_sub_stage_of(stage: Stage) -> Option<SubStage> {
    match stage {
        Stage::InReview => Some(SubStage::PendingReview),
        Stage::Shortlisted => Some(SubStage::NotContacted),
        Stage::Interview => Some(SubStage::NotScheduled),
        Stage::TechnicalTask => Some(SubStage::TaskPending),
        Stage::Compensation => Some(SubStage::DiscussionPending),
        Stage::Offer => Some(SubStage::NotSent),
        Stage::Hired => None,
    }
}

/// Membership against the global catalog, not a job's configuration.
pub fn is_valid_sub_stage_for_stage(stage: Stage, sub_stage: SubStage) -> bool {
    valid_sub_stages_of(stage).contains(&sub_stage)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownCatalogEntry {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownCatalogEntry {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
