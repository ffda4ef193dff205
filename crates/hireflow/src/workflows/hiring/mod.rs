//! Hiring workflow engine: a fixed stage state machine over candidate
//! pipelines, with auto-scheduling of screenings, tests, interviews, and
//! offers, plus notification side effects.

pub mod collaborators;
pub mod domain;
pub mod engine;
pub mod repository;
pub mod router;
pub mod scheduling;

#[cfg(test)]
mod tests;

pub use collaborators::{
    Interview, InterviewKind, InterviewStatus, InterviewStore, JobOffer, JobTest,
    NotificationError, Notifier, OfferStatus, OfferStore, SubmissionStatus, TestStatus, TestStore,
    TestSubmission,
};
pub use domain::{
    next_action_for, ApplicationId, ApplicationSummary, CandidateId, CandidatePipeline,
    EventStatus, HrId, JobId, PendingAction, PipelineOverview, ScheduleEvent, ScheduleEventKind,
    StageRecord, WorkflowStage,
};
pub use engine::{HiringWorkflowEngine, SideEffectFailure, StageOutcome, WorkflowError};
pub use repository::{ApplicationStore, EventStore, PipelineStore, StoreError};
pub use router::workflow_router;
pub use scheduling::find_open_slot;
