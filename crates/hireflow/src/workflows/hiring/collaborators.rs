//! Records and trait boundaries for the collaborators the workflow engine
//! orchestrates: assessment tests, interviews, offers, and e-mail
//! notifications. Each collaborator owns its own persistence; the engine
//! treats them as opaque stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationSummary, CandidateId, HrId, JobId, WorkflowStage};
use super::repository::StoreError;

/// Assessment test attached to a job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTest {
    pub id: String,
    pub job_id: JobId,
    pub title: String,
    pub duration_minutes: u32,
    pub passing_score: u32,
    pub status: TestStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Draft,
    Active,
    Archived,
}

/// A candidate's attempt at a job test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSubmission {
    pub id: String,
    pub test_id: String,
    pub application_id: ApplicationId,
    pub candidate_id: CandidateId,
    pub status: SubmissionStatus,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    InProgress,
    Submitted,
    Evaluated,
}

/// Draft offer created when a candidate reaches the Offer stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOffer {
    pub id: String,
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub hr_id: HrId,
    pub status: OfferStatus,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Expired,
}

/// A booked interview on an HR calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: String,
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub hr_id: HrId,
    pub kind: InterviewKind,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: InterviewStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewKind {
    Phone,
    Video,
    InPerson,
    Technical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    /// Whether the interview still occupies its calendar slot.
    pub const fn blocks_slot(self) -> bool {
        matches!(self, Self::Scheduled | Self::InProgress)
    }
}

pub trait TestStore: Send + Sync {
    /// The Active test for a job, if one has been published.
    fn active_test_for_job(&self, job_id: &JobId) -> Result<Option<JobTest>, StoreError>;
    fn start_submission(
        &self,
        test_id: &str,
        application_id: &ApplicationId,
        candidate_id: &CandidateId,
    ) -> Result<TestSubmission, StoreError>;
}

pub trait InterviewStore: Send + Sync {
    fn schedule(&self, interview: Interview) -> Result<Interview, StoreError>;
    /// Interviews that still occupy the HR's calendar: Scheduled or
    /// In Progress only.
    fn booked_for_hr(&self, hr_id: &HrId) -> Result<Vec<Interview>, StoreError>;
}

pub trait OfferStore: Send + Sync {
    fn create_draft(&self, offer: JobOffer) -> Result<JobOffer, StoreError>;
}

/// E-mail boundary. Implementations must not panic past this interface;
/// delivery failures surface as [`NotificationError`] and the engine
/// records them without aborting the transition that triggered them.
pub trait Notifier: Send + Sync {
    fn send_application_confirmation(
        &self,
        application: &ApplicationSummary,
    ) -> Result<(), NotificationError>;
    fn send_test_invitation(
        &self,
        application: &ApplicationSummary,
        test: &JobTest,
    ) -> Result<(), NotificationError>;
    fn send_interview_invitation(
        &self,
        application: &ApplicationSummary,
        interview: &Interview,
    ) -> Result<(), NotificationError>;
    fn send_stage_update(
        &self,
        application: &ApplicationSummary,
        stage: WorkflowStage,
        message: &str,
    ) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
