use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WorkflowConfig;

use super::collaborators::{
    Interview, InterviewKind, InterviewStatus, InterviewStore, JobOffer, Notifier, OfferStatus,
    OfferStore, TestStore,
};
use super::domain::{
    ApplicationId, ApplicationSummary, CandidatePipeline, EventStatus, HrId, JobId, PendingAction,
    PipelineOverview, ScheduleEvent, ScheduleEventKind, WorkflowStage,
};
use super::repository::{ApplicationStore, EventStore, PipelineStore, StoreError};
use super::scheduling::find_open_slot;

/// Error taxonomy for the public workflow operations. Scheduling and
/// notification failures after a committed transition travel inside
/// [`StageOutcome::side_effects`] instead, because the stage change itself
/// succeeded.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("application or pipeline not found")]
    NotFound,
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: WorkflowStage,
        to: WorkflowStage,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A collaborator call that failed after the pipeline write committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SideEffectFailure {
    SchedulingFailed { reason: String },
    NotificationFailed { channel: String, reason: String },
}

/// Result of a committed pipeline operation: the updated pipeline, the event
/// that was auto-scheduled (if any), and every best-effort side effect that
/// did not land.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub pipeline: CandidatePipeline,
    pub scheduled: Option<ScheduleEvent>,
    pub side_effects: Vec<SideEffectFailure>,
}

/// Drives candidate pipelines through the hiring funnel, auto-scheduling
/// downstream events and triggering notifications as candidates advance.
pub struct HiringWorkflowEngine {
    pipelines: Arc<dyn PipelineStore>,
    applications: Arc<dyn ApplicationStore>,
    events: Arc<dyn EventStore>,
    tests: Arc<dyn TestStore>,
    interviews: Arc<dyn InterviewStore>,
    offers: Arc<dyn OfferStore>,
    notifier: Arc<dyn Notifier>,
    config: WorkflowConfig,
}

impl HiringWorkflowEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pipelines: Arc<dyn PipelineStore>,
        applications: Arc<dyn ApplicationStore>,
        events: Arc<dyn EventStore>,
        tests: Arc<dyn TestStore>,
        interviews: Arc<dyn InterviewStore>,
        offers: Arc<dyn OfferStore>,
        notifier: Arc<dyn Notifier>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            pipelines,
            applications,
            events,
            tests,
            interviews,
            offers,
            notifier,
            config,
        }
    }

    /// Entry point invoked once per new application: creates the pipeline at
    /// `Applied`, schedules the initial screening 24 hours out, and sends the
    /// confirmation e-mail.
    pub fn initiate(&self, application_id: &ApplicationId) -> Result<StageOutcome, WorkflowError> {
        self.initiate_at(application_id, Utc::now())
    }

    pub fn initiate_at(
        &self,
        application_id: &ApplicationId,
        now: DateTime<Utc>,
    ) -> Result<StageOutcome, WorkflowError> {
        let application = self
            .applications
            .fetch(application_id)?
            .ok_or(WorkflowError::NotFound)?;

        let pipeline = CandidatePipeline::new(
            application_id.clone(),
            application.job_id.clone(),
            application.candidate_id.clone(),
            now,
        );
        let pipeline = self.pipelines.insert(pipeline)?;

        let mut side_effects = Vec::new();
        let scheduled = self.schedule_screening(&application, now, &mut side_effects);

        if let Err(err) = self.notifier.send_application_confirmation(&application) {
            warn!(%application_id, error = %err, "application confirmation not sent");
            side_effects.push(SideEffectFailure::NotificationFailed {
                channel: "application_confirmation".to_string(),
                reason: err.to_string(),
            });
        }

        info!(%application_id, "hiring workflow initiated");
        Ok(StageOutcome {
            pipeline,
            scheduled,
            side_effects,
        })
    }

    /// Advance the candidate to `target`. Rejects transitions outside the
    /// stage edge table without touching state; on success the history gains
    /// exactly one entry and the application record mirrors the new stage.
    pub fn advance(
        &self,
        application_id: &ApplicationId,
        target: WorkflowStage,
        notes: Option<String>,
        auto_schedule: bool,
    ) -> Result<StageOutcome, WorkflowError> {
        self.advance_at(application_id, target, notes, auto_schedule, Utc::now())
    }

    pub fn advance_at(
        &self,
        application_id: &ApplicationId,
        target: WorkflowStage,
        notes: Option<String>,
        auto_schedule: bool,
        now: DateTime<Utc>,
    ) -> Result<StageOutcome, WorkflowError> {
        let mut pipeline = self
            .pipelines
            .fetch(application_id)?
            .ok_or(WorkflowError::NotFound)?;

        let from = pipeline.current_stage;
        if !from.can_advance_to(target) {
            return Err(WorkflowError::InvalidTransition { from, to: target });
        }

        let notes =
            notes.unwrap_or_else(|| format!("Advanced from {} to {}", from, target));
        pipeline.record(target, notes, now);

        self.pipelines.update(pipeline.clone())?;
        self.applications.set_status(application_id, target.label())?;

        let mut side_effects = Vec::new();
        let mut scheduled = None;

        match self.applications.fetch(application_id) {
            Ok(Some(application)) => {
                if auto_schedule {
                    scheduled =
                        self.schedule_next_step(&application, target, now, &mut side_effects);
                }

                if let Err(err) = self.notifier.send_stage_update(
                    &application,
                    target,
                    target.candidate_message(),
                ) {
                    warn!(%application_id, error = %err, "stage update not sent");
                    side_effects.push(SideEffectFailure::NotificationFailed {
                        channel: "stage_update".to_string(),
                        reason: err.to_string(),
                    });
                }
            }
            Ok(None) => {
                warn!(%application_id, "application record missing after transition");
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: "application record missing".to_string(),
                });
            }
            Err(err) => {
                warn!(%application_id, error = %err, "application lookup failed after transition");
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: err.to_string(),
                });
            }
        }

        info!(%application_id, stage = %target, "candidate stage advanced");
        Ok(StageOutcome {
            pipeline,
            scheduled,
            side_effects,
        })
    }

    fn schedule_next_step(
        &self,
        application: &ApplicationSummary,
        stage: WorkflowStage,
        now: DateTime<Utc>,
        side_effects: &mut Vec<SideEffectFailure>,
    ) -> Option<ScheduleEvent> {
        match stage {
            WorkflowStage::Screening => self.schedule_screening(application, now, side_effects),
            WorkflowStage::Test => self.schedule_test(application, now, side_effects),
            WorkflowStage::Interview => self.schedule_interview(application, now, side_effects),
            WorkflowStage::Offer => self.prepare_offer(application, now, side_effects),
            _ => None,
        }
    }

    fn schedule_screening(
        &self,
        application: &ApplicationSummary,
        now: DateTime<Utc>,
        side_effects: &mut Vec<SideEffectFailure>,
    ) -> Option<ScheduleEvent> {
        let mut metadata = BTreeMap::new();
        metadata.insert("application_id".to_string(), application.id.0.clone());

        let event = ScheduleEvent {
            job_id: application.job_id.clone(),
            kind: ScheduleEventKind::Screening,
            title: "Initial Application Screening".to_string(),
            description: "Review application and resume for initial qualifications".to_string(),
            scheduled_at: now + Duration::hours(24),
            participants: vec![application.hr_id.0.clone()],
            metadata,
            status: EventStatus::Scheduled,
        };

        self.insert_event(event, side_effects)
    }

    fn schedule_test(
        &self,
        application: &ApplicationSummary,
        now: DateTime<Utc>,
        side_effects: &mut Vec<SideEffectFailure>,
    ) -> Option<ScheduleEvent> {
        let test = match self.tests.active_test_for_job(&application.job_id) {
            Ok(Some(test)) => test,
            Ok(None) => {
                warn!(application_id = %application.id, "no active test for job");
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: "no active test published for this job".to_string(),
                });
                return None;
            }
            Err(err) => {
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: err.to_string(),
                });
                return None;
            }
        };

        let submission = match self.tests.start_submission(
            &test.id,
            &application.id,
            &application.candidate_id,
        ) {
            Ok(submission) => submission,
            Err(err) => {
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: err.to_string(),
                });
                return None;
            }
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("application_id".to_string(), application.id.0.clone());
        metadata.insert("test_id".to_string(), test.id.clone());
        metadata.insert("submission_id".to_string(), submission.id.clone());

        let event = ScheduleEvent {
            job_id: application.job_id.clone(),
            kind: ScheduleEventKind::Test,
            title: "Assessment Test".to_string(),
            description: format!("Complete assessment test for {}", application.applicant_name),
            scheduled_at: now + Duration::days(2),
            participants: vec![
                application.candidate_id.0.clone(),
                application.hr_id.0.clone(),
            ],
            metadata,
            status: EventStatus::Scheduled,
        };

        let event = self.insert_event(event, side_effects);

        if let Err(err) = self.notifier.send_test_invitation(application, &test) {
            warn!(application_id = %application.id, error = %err, "test invitation not sent");
            side_effects.push(SideEffectFailure::NotificationFailed {
                channel: "test_invitation".to_string(),
                reason: err.to_string(),
            });
        }

        event
    }

    fn schedule_interview(
        &self,
        application: &ApplicationSummary,
        now: DateTime<Utc>,
        side_effects: &mut Vec<SideEffectFailure>,
    ) -> Option<ScheduleEvent> {
        let booked = match self.interviews.booked_for_hr(&application.hr_id) {
            Ok(booked) => booked,
            Err(err) => {
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: err.to_string(),
                });
                return None;
            }
        };

        let duration = self.config.interview_duration_minutes;
        let Some(slot) = find_open_slot(&booked, now, duration, self.config.slot_horizon_days)
        else {
            warn!(application_id = %application.id, "no open interview slot within horizon");
            side_effects.push(SideEffectFailure::SchedulingFailed {
                reason: "no open interview slot within horizon".to_string(),
            });
            return None;
        };

        let interview = Interview {
            id: Uuid::new_v4().to_string(),
            application_id: application.id.clone(),
            job_id: application.job_id.clone(),
            candidate_id: application.candidate_id.clone(),
            hr_id: application.hr_id.clone(),
            kind: InterviewKind::Technical,
            scheduled_at: slot,
            duration_minutes: duration,
            status: InterviewStatus::Scheduled,
        };

        let interview = match self.interviews.schedule(interview) {
            Ok(interview) => interview,
            Err(err) => {
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: err.to_string(),
                });
                return None;
            }
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("application_id".to_string(), application.id.0.clone());
        metadata.insert("interview_id".to_string(), interview.id.clone());

        let event = ScheduleEvent {
            job_id: application.job_id.clone(),
            kind: ScheduleEventKind::Interview,
            title: "Technical Interview".to_string(),
            description: format!("Technical interview with {}", application.applicant_name),
            scheduled_at: slot,
            participants: vec![
                application.candidate_id.0.clone(),
                application.hr_id.0.clone(),
            ],
            metadata,
            status: EventStatus::Scheduled,
        };

        let event = self.insert_event(event, side_effects);

        if let Err(err) = self
            .notifier
            .send_interview_invitation(application, &interview)
        {
            warn!(application_id = %application.id, error = %err, "interview invitation not sent");
            side_effects.push(SideEffectFailure::NotificationFailed {
                channel: "interview_invitation".to_string(),
                reason: err.to_string(),
            });
        }

        event
    }

    fn prepare_offer(
        &self,
        application: &ApplicationSummary,
        now: DateTime<Utc>,
        side_effects: &mut Vec<SideEffectFailure>,
    ) -> Option<ScheduleEvent> {
        let offer = JobOffer {
            id: Uuid::new_v4().to_string(),
            application_id: application.id.clone(),
            job_id: application.job_id.clone(),
            candidate_id: application.candidate_id.clone(),
            hr_id: application.hr_id.clone(),
            status: OfferStatus::Draft,
            expires_at: now + Duration::days(7),
        };

        let offer = match self.offers.create_draft(offer) {
            Ok(offer) => offer,
            Err(err) => {
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: err.to_string(),
                });
                return None;
            }
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("application_id".to_string(), application.id.0.clone());
        metadata.insert("offer_id".to_string(), offer.id.clone());

        let event = ScheduleEvent {
            job_id: application.job_id.clone(),
            kind: ScheduleEventKind::Offer,
            title: "Prepare Job Offer".to_string(),
            description: "Prepare and review job offer package".to_string(),
            scheduled_at: now + Duration::hours(48),
            participants: vec![application.hr_id.0.clone()],
            metadata,
            status: EventStatus::Scheduled,
        };

        self.insert_event(event, side_effects)
    }

    fn insert_event(
        &self,
        event: ScheduleEvent,
        side_effects: &mut Vec<SideEffectFailure>,
    ) -> Option<ScheduleEvent> {
        match self.events.insert(event) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(error = %err, "schedule event not persisted");
                side_effects.push(SideEffectFailure::SchedulingFailed {
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    /// Funnel statistics across all pipelines, optionally scoped to a job.
    pub fn overview(&self, job_id: Option<&JobId>) -> Result<PipelineOverview, WorkflowError> {
        let pipelines = match job_id {
            Some(job_id) => self.pipelines.for_job(job_id)?,
            None => self.pipelines.all()?,
        };

        let mut by_stage: BTreeMap<String, usize> = BTreeMap::new();
        for pipeline in &pipelines {
            *by_stage
                .entry(pipeline.current_stage.label().to_string())
                .or_default() += 1;
        }

        let total_candidates = pipelines.len();
        let mut conversion_rates = BTreeMap::new();
        if total_candidates > 0 {
            for (stage, count) in &by_stage {
                conversion_rates.insert(
                    stage.clone(),
                    (*count as f64 / total_candidates as f64) * 100.0,
                );
            }
        }

        Ok(PipelineOverview {
            total_candidates,
            by_stage,
            conversion_rates,
        })
    }

    /// Upcoming scheduled events joined with their application summaries,
    /// optionally filtered to one HR participant.
    pub fn pending_actions(
        &self,
        hr_id: Option<&HrId>,
    ) -> Result<Vec<PendingAction>, WorkflowError> {
        let events = self
            .events
            .scheduled(hr_id.map(|hr_id| hr_id.0.as_str()))?;

        let mut actions = Vec::with_capacity(events.len());
        for event in events {
            // Best-effort join; a dangling reference simply yields no summary.
            let application = event
                .metadata
                .get("application_id")
                .and_then(|raw| self.applications.fetch(&ApplicationId(raw.clone())).ok())
                .flatten();
            actions.push(PendingAction { event, application });
        }

        Ok(actions)
    }
}
