use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Identifier wrapper for candidate accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for HR accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HrId(pub String);

/// One discrete step in the hiring funnel. `Hired` and `Rejected` are
/// terminal; every other stage can move forward or to `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStage {
    Applied,
    Screening,
    Test,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl WorkflowStage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Applied,
            Self::Screening,
            Self::Test,
            Self::Interview,
            Self::Offer,
            Self::Hired,
            Self::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Screening => "Screening",
            Self::Test => "Test",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
            Self::Hired => "Hired",
            Self::Rejected => "Rejected",
        }
    }

    /// The directed edge set of the pipeline state machine.
    pub const fn allowed_transitions(self) -> &'static [WorkflowStage] {
        match self {
            Self::Applied => &[Self::Screening, Self::Rejected],
            Self::Screening => &[Self::Test, Self::Interview, Self::Rejected],
            Self::Test => &[Self::Interview, Self::Rejected],
            Self::Interview => &[Self::Offer, Self::Rejected],
            Self::Offer => &[Self::Hired, Self::Rejected],
            Self::Hired | Self::Rejected => &[],
        }
    }

    pub fn can_advance_to(self, target: WorkflowStage) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Candidate-facing message sent when the pipeline enters this stage.
    pub const fn candidate_message(self) -> &'static str {
        match self {
            Self::Applied => "Your application has been received",
            Self::Screening => "Your application is under initial screening",
            Self::Test => "You have been selected for the assessment test",
            Self::Interview => "Congratulations! You have been selected for an interview",
            Self::Offer => "Great news! We would like to extend a job offer",
            Self::Hired => "Welcome aboard! You have been hired",
            Self::Rejected => "Thank you for your interest, but we will not be proceeding",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Advisory next step for HR, recomputed on every transition.
pub fn next_action_for(stage: WorkflowStage, now: DateTime<Utc>) -> (&'static str, DateTime<Utc>) {
    match stage {
        WorkflowStage::Applied => ("Initial screening", now + Duration::days(1)),
        WorkflowStage::Screening => ("Schedule assessment test", now + Duration::days(2)),
        WorkflowStage::Test => ("Schedule interview", now + Duration::days(3)),
        WorkflowStage::Interview => ("Prepare job offer", now + Duration::days(2)),
        WorkflowStage::Offer => ("Await candidate response", now + Duration::days(7)),
        WorkflowStage::Hired => ("Onboarding preparation", now + Duration::days(1)),
        WorkflowStage::Rejected => ("Send rejection notification", now + Duration::hours(24)),
    }
}

/// One append-only entry in a pipeline's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: WorkflowStage,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

/// Per-application record tracking the current hiring stage and its history.
///
/// Invariant: `current_stage` always equals the stage of the last history
/// entry. The constructor establishes it and [`CandidatePipeline::record`]
/// is the only mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePipeline {
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub current_stage: WorkflowStage,
    pub stage_history: Vec<StageRecord>,
    pub next_action: String,
    pub next_action_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CandidatePipeline {
    pub fn new(
        application_id: ApplicationId,
        job_id: JobId,
        candidate_id: CandidateId,
        now: DateTime<Utc>,
    ) -> Self {
        let (next_action, next_action_date) = next_action_for(WorkflowStage::Applied, now);
        Self {
            application_id,
            job_id,
            candidate_id,
            current_stage: WorkflowStage::Applied,
            stage_history: vec![StageRecord {
                stage: WorkflowStage::Applied,
                timestamp: now,
                notes: "Application received".to_string(),
            }],
            next_action: next_action.to_string(),
            next_action_date: Some(next_action_date),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a history entry and mirror the stage, keeping the invariant.
    pub fn record(&mut self, stage: WorkflowStage, notes: String, now: DateTime<Utc>) {
        self.stage_history.push(StageRecord {
            stage,
            timestamp: now,
            notes,
        });
        self.current_stage = stage;
        let (next_action, next_action_date) = next_action_for(stage, now);
        self.next_action = next_action.to_string();
        self.next_action_date = Some(next_action_date);
        self.updated_at = now;
    }
}

/// Kind of auto-scheduled step created as a candidate advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEventKind {
    Screening,
    Test,
    Interview,
    Offer,
}

impl ScheduleEventKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Screening => "Screening",
            Self::Test => "Test",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// Side-effect record created by the engine and read by dashboard queries.
/// Not guaranteed consistent with the entities its metadata references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub job_id: JobId,
    pub kind: ScheduleEventKind,
    pub title: String,
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub participants: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub status: EventStatus,
}

/// The slice of the application document the workflow engine reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub hr_id: HrId,
    pub applicant_name: String,
    pub email: String,
    pub status: String,
}

/// Aggregate funnel statistics across pipelines.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOverview {
    pub total_candidates: usize,
    pub by_stage: BTreeMap<String, usize>,
    pub conversion_rates: BTreeMap<String, f64>,
}

/// A scheduled event joined with its application, for HR dashboards. The
/// join is best-effort; a dangling metadata reference yields `None`.
#[derive(Debug, Clone, Serialize)]
pub struct PendingAction {
    pub event: ScheduleEvent,
    pub application: Option<ApplicationSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_stages_have_no_outgoing_edges() {
        assert!(WorkflowStage::Hired.allowed_transitions().is_empty());
        assert!(WorkflowStage::Rejected.allowed_transitions().is_empty());
        assert!(WorkflowStage::Hired.is_terminal());
    }

    #[test]
    fn every_non_terminal_stage_can_reject() {
        for stage in WorkflowStage::ordered() {
            if !stage.is_terminal() {
                assert!(
                    stage.can_advance_to(WorkflowStage::Rejected),
                    "{stage} should allow rejection"
                );
            }
        }
    }

    #[test]
    fn self_transitions_are_never_allowed() {
        for stage in WorkflowStage::ordered() {
            assert!(!stage.can_advance_to(stage), "{stage} must not loop");
        }
    }

    #[test]
    fn new_pipeline_satisfies_history_invariant() {
        let now = Utc::now();
        let pipeline = CandidatePipeline::new(
            ApplicationId("app1".into()),
            JobId("job1".into()),
            CandidateId("cand1".into()),
            now,
        );
        assert_eq!(pipeline.current_stage, WorkflowStage::Applied);
        assert_eq!(pipeline.stage_history.len(), 1);
        assert_eq!(
            pipeline.stage_history.last().map(|record| record.stage),
            Some(pipeline.current_stage)
        );
        assert_eq!(pipeline.next_action, "Initial screening");
    }

    #[test]
    fn record_appends_and_mirrors() {
        let now = Utc::now();
        let mut pipeline = CandidatePipeline::new(
            ApplicationId("app1".into()),
            JobId("job1".into()),
            CandidateId("cand1".into()),
            now,
        );
        pipeline.record(WorkflowStage::Screening, "moved".into(), now);
        assert_eq!(pipeline.stage_history.len(), 2);
        assert_eq!(pipeline.current_stage, WorkflowStage::Screening);
        assert_eq!(
            pipeline.stage_history.last().map(|record| record.stage),
            Some(WorkflowStage::Screening)
        );
    }

    #[test]
    fn stage_serializes_to_its_label() {
        let encoded = serde_json::to_string(&WorkflowStage::Screening).expect("serializes");
        assert_eq!(encoded, "\"Screening\"");
    }
}
