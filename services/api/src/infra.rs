//! In-memory implementations of the workflow storage and notification traits,
//! suitable for demos and for running the service without external backing
//! stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use hireflow::workflows::hiring::{
    ApplicationId, ApplicationStore, ApplicationSummary, CandidateId, CandidatePipeline,
    EventStore, HrId, Interview, InterviewStore, JobId, JobOffer, JobTest, NotificationError,
    Notifier, OfferStore, PipelineStore, ScheduleEvent, StoreError, SubmissionStatus, TestStatus,
    TestStore, TestSubmission, WorkflowStage,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryPipelineStore {
    records: Mutex<HashMap<ApplicationId, CandidatePipeline>>,
}

impl PipelineStore for InMemoryPipelineStore {
    fn insert(&self, pipeline: CandidatePipeline) -> Result<CandidatePipeline, StoreError> {
        let mut guard = self.records.lock().expect("pipeline mutex poisoned");
        if guard.contains_key(&pipeline.application_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(pipeline.application_id.clone(), pipeline.clone());
        Ok(pipeline)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<CandidatePipeline>, StoreError> {
        let guard = self.records.lock().expect("pipeline mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, pipeline: CandidatePipeline) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("pipeline mutex poisoned");
        if guard.contains_key(&pipeline.application_id) {
            guard.insert(pipeline.application_id.clone(), pipeline);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn all(&self) -> Result<Vec<CandidatePipeline>, StoreError> {
        let guard = self.records.lock().expect("pipeline mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn for_job(&self, job_id: &JobId) -> Result<Vec<CandidatePipeline>, StoreError> {
        let guard = self.records.lock().expect("pipeline mutex poisoned");
        Ok(guard
            .values()
            .filter(|pipeline| &pipeline.job_id == job_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryApplicationStore {
    records: Mutex<HashMap<ApplicationId, ApplicationSummary>>,
}

impl InMemoryApplicationStore {
    pub(crate) fn seed(&self, application: ApplicationSummary) {
        self.records
            .lock()
            .expect("application mutex poisoned")
            .insert(application.id.clone(), application);
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationSummary>, StoreError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn set_status(&self, id: &ApplicationId, status: &str) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("application mutex poisoned");
        match guard.get_mut(id) {
            Some(application) => {
                application.status = status.to_string();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

#[derive(Default)]
pub(crate) struct InMemoryEventStore {
    records: Mutex<Vec<ScheduleEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn insert(&self, event: ScheduleEvent) -> Result<ScheduleEvent, StoreError> {
        self.records
            .lock()
            .expect("event mutex poisoned")
            .push(event.clone());
        Ok(event)
    }

    fn scheduled(&self, participant: Option<&str>) -> Result<Vec<ScheduleEvent>, StoreError> {
        let guard = self.records.lock().expect("event mutex poisoned");
        let mut events: Vec<ScheduleEvent> = guard
            .iter()
            .filter(|event| match participant {
                Some(participant) => event.participants.iter().any(|entry| entry == participant),
                None => true,
            })
            .cloned()
            .collect();
        events.sort_by_key(|event| event.scheduled_at);
        Ok(events)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryTestStore {
    tests: Mutex<Vec<JobTest>>,
    submission_seq: AtomicU64,
}

impl InMemoryTestStore {
    pub(crate) fn publish(&self, test: JobTest) {
        self.tests.lock().expect("test mutex poisoned").push(test);
    }
}

impl TestStore for InMemoryTestStore {
    fn active_test_for_job(&self, job_id: &JobId) -> Result<Option<JobTest>, StoreError> {
        let guard = self.tests.lock().expect("test mutex poisoned");
        Ok(guard
            .iter()
            .find(|test| &test.job_id == job_id && test.status == TestStatus::Active)
            .cloned())
    }

    fn start_submission(
        &self,
        test_id: &str,
        application_id: &ApplicationId,
        candidate_id: &CandidateId,
    ) -> Result<TestSubmission, StoreError> {
        let sequence = self.submission_seq.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(TestSubmission {
            id: format!("submission-{sequence}"),
            test_id: test_id.to_string(),
            application_id: application_id.clone(),
            candidate_id: candidate_id.clone(),
            status: SubmissionStatus::InProgress,
            started_at: Utc::now(),
        })
    }
}

#[derive(Default)]
pub(crate) struct InMemoryInterviewStore {
    records: Mutex<Vec<Interview>>,
}

impl InterviewStore for InMemoryInterviewStore {
    fn schedule(&self, interview: Interview) -> Result<Interview, StoreError> {
        self.records
            .lock()
            .expect("interview mutex poisoned")
            .push(interview.clone());
        Ok(interview)
    }

    fn booked_for_hr(&self, hr_id: &HrId) -> Result<Vec<Interview>, StoreError> {
        let guard = self.records.lock().expect("interview mutex poisoned");
        Ok(guard
            .iter()
            .filter(|interview| &interview.hr_id == hr_id && interview.status.blocks_slot())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryOfferStore {
    records: Mutex<Vec<JobOffer>>,
}

impl OfferStore for InMemoryOfferStore {
    fn create_draft(&self, offer: JobOffer) -> Result<JobOffer, StoreError> {
        self.records
            .lock()
            .expect("offer mutex poisoned")
            .push(offer.clone());
        Ok(offer)
    }
}

/// Notification entry kept for demo output and inspection.
#[derive(Debug, Clone)]
pub(crate) struct SentNotification {
    pub(crate) email: String,
    pub(crate) subject: String,
}

/// Notifier that records every message and surfaces it through tracing
/// instead of an outbound channel.
#[derive(Default)]
pub(crate) struct LoggingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl LoggingNotifier {
    pub(crate) fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    fn record(&self, email: &str, subject: String) {
        info!(email, %subject, "notification dispatched");
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(SentNotification {
                email: email.to_string(),
                subject,
            });
    }
}

impl Notifier for LoggingNotifier {
    fn send_application_confirmation(
        &self,
        application: &ApplicationSummary,
    ) -> Result<(), NotificationError> {
        self.record(&application.email, "Application received".to_string());
        Ok(())
    }

    fn send_test_invitation(
        &self,
        application: &ApplicationSummary,
        test: &JobTest,
    ) -> Result<(), NotificationError> {
        self.record(
            &application.email,
            format!("Assessment invitation: {}", test.title),
        );
        Ok(())
    }

    fn send_interview_invitation(
        &self,
        application: &ApplicationSummary,
        interview: &Interview,
    ) -> Result<(), NotificationError> {
        self.record(
            &application.email,
            format!("Interview scheduled for {}", interview.scheduled_at),
        );
        Ok(())
    }

    fn send_stage_update(
        &self,
        application: &ApplicationSummary,
        stage: WorkflowStage,
        message: &str,
    ) -> Result<(), NotificationError> {
        self.record(
            &application.email,
            format!("{}: {message}", stage.label()),
        );
        Ok(())
    }
}

/// Seed a couple of open applications and an active assessment so the
/// in-memory service is exercisable immediately after boot.
pub(crate) fn seed_sample_data(
    applications: &InMemoryApplicationStore,
    tests: &InMemoryTestStore,
) {
    for (id, name, email) in [
        ("app-1001", "Asha Patel", "asha.patel@example.com"),
        ("app-1002", "Diego Fernandez", "diego.fernandez@example.com"),
    ] {
        applications.seed(ApplicationSummary {
            id: ApplicationId(id.to_string()),
            job_id: JobId("job-backend-01".to_string()),
            candidate_id: CandidateId(format!("cand-{id}")),
            hr_id: HrId("hr-01".to_string()),
            applicant_name: name.to_string(),
            email: email.to_string(),
            status: "Applied".to_string(),
        });
    }

    tests.publish(JobTest {
        id: "test-backend-01".to_string(),
        job_id: JobId("job-backend-01".to_string()),
        title: "Backend take-home exercise".to_string(),
        duration_minutes: 90,
        passing_score: 60,
        status: TestStatus::Active,
    });
}
