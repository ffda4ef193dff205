use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::config::WorkflowConfig;
use crate::workflows::hiring::collaborators::{
    Interview, InterviewStore, JobOffer, JobTest, NotificationError, Notifier, OfferStore,
    SubmissionStatus, TestStatus, TestStore, TestSubmission,
};
use crate::workflows::hiring::domain::{
    ApplicationId, ApplicationSummary, CandidateId, CandidatePipeline, HrId, JobId, ScheduleEvent,
    WorkflowStage,
};
use crate::workflows::hiring::engine::HiringWorkflowEngine;
use crate::workflows::hiring::repository::{
    ApplicationStore, EventStore, PipelineStore, StoreError,
};

#[derive(Default)]
pub(super) struct MemoryPipelines {
    records: Mutex<HashMap<ApplicationId, CandidatePipeline>>,
}

impl PipelineStore for MemoryPipelines {
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
        if !guard.contains_key(&pipeline.application_id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(pipeline.application_id.clone(), pipeline);
        Ok(())
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
pub(super) struct MemoryApplications {
    records: Mutex<HashMap<ApplicationId, ApplicationSummary>>,
}

impl MemoryApplications {
    pub(super) fn seed(&self, application: ApplicationSummary) {
        self.records
            .lock()
            .expect("application mutex poisoned")
            .insert(application.id.clone(), application);
    }

    pub(super) fn status_of(&self, id: &ApplicationId) -> Option<String> {
        self.records
            .lock()
            .expect("application mutex poisoned")
            .get(id)
            .map(|application| application.status.clone())
    }
}

impl ApplicationStore for MemoryApplications {
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
pub(super) struct MemoryEvents {
    records: Mutex<Vec<ScheduleEvent>>,
}

impl MemoryEvents {
    pub(super) fn all(&self) -> Vec<ScheduleEvent> {
        self.records.lock().expect("event mutex poisoned").clone()
    }
}

impl EventStore for MemoryEvents {
    fn insert(&self, event: ScheduleEvent) -> Result<ScheduleEvent, StoreError> {
        let mut guard = self.records.lock().expect("event mutex poisoned");
        guard.push(event.clone());
        Ok(event)
    }

    fn scheduled(&self, participant: Option<&str>) -> Result<Vec<ScheduleEvent>, StoreError> {
        let guard = self.records.lock().expect("event mutex poisoned");
        let mut events: Vec<ScheduleEvent> = guard
            .iter()
            .filter(|event| match participant {
                Some(participant) => event
                    .participants
                    .iter()
                    .any(|entry| entry == participant),
                None => true,
            })
            .cloned()
            .collect();
        events.sort_by_key(|event| event.scheduled_at);
        Ok(events)
    }
}

#[derive(Default)]
pub(super) struct MemoryTests {
    active: Mutex<Option<JobTest>>,
    sequence: AtomicU64,
}

impl MemoryTests {
    pub(super) fn publish(&self, test: JobTest) {
        *self.active.lock().expect("test mutex poisoned") = Some(test);
    }
}

impl TestStore for MemoryTests {
    fn active_test_for_job(&self, job_id: &JobId) -> Result<Option<JobTest>, StoreError> {
        let guard = self.active.lock().expect("test mutex poisoned");
        Ok(guard
            .as_ref()
            .filter(|test| &test.job_id == job_id && test.status == TestStatus::Active)
            .cloned())
    }

    fn start_submission(
        &self,
        test_id: &str,
        application_id: &ApplicationId,
        candidate_id: &CandidateId,
    ) -> Result<TestSubmission, StoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(TestSubmission {
            id: format!("sub-{id:04}"),
            test_id: test_id.to_string(),
            application_id: application_id.clone(),
            candidate_id: candidate_id.clone(),
            status: SubmissionStatus::InProgress,
            started_at: Utc::now(),
        })
    }
}

#[derive(Default)]
pub(super) struct MemoryInterviews {
    records: Mutex<Vec<Interview>>,
}

impl MemoryInterviews {
    pub(super) fn book(&self, interview: Interview) {
        self.records
            .lock()
            .expect("interview mutex poisoned")
            .push(interview);
    }

    pub(super) fn all(&self) -> Vec<Interview> {
        self.records.lock().expect("interview mutex poisoned").clone()
    }
}

impl InterviewStore for MemoryInterviews {
    fn schedule(&self, interview: Interview) -> Result<Interview, StoreError> {
        let mut guard = self.records.lock().expect("interview mutex poisoned");
        guard.push(interview.clone());
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
pub(super) struct MemoryOffers {
    records: Mutex<Vec<JobOffer>>,
}

impl MemoryOffers {
    pub(super) fn all(&self) -> Vec<JobOffer> {
        self.records.lock().expect("offer mutex poisoned").clone()
    }
}

impl OfferStore for MemoryOffers {
    fn create_draft(&self, offer: JobOffer) -> Result<JobOffer, StoreError> {
        let mut guard = self.records.lock().expect("offer mutex poisoned");
        guard.push(offer.clone());
        Ok(offer)
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    pub(super) sent: Mutex<Vec<String>>,
    pub(super) failing: AtomicBool,
}

impl RecordingNotifier {
    fn record(&self, channel: &str) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(NotificationError::Transport("smtp unreachable".to_string()));
        }
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(channel.to_string());
        Ok(())
    }

    pub(super) fn sent_channels(&self) -> Vec<String> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send_application_confirmation(
        &self,
        _application: &ApplicationSummary,
    ) -> Result<(), NotificationError> {
        self.record("application_confirmation")
    }

    fn send_test_invitation(
        &self,
        _application: &ApplicationSummary,
        _test: &JobTest,
    ) -> Result<(), NotificationError> {
        self.record("test_invitation")
    }

    fn send_interview_invitation(
        &self,
        _application: &ApplicationSummary,
        _interview: &Interview,
    ) -> Result<(), NotificationError> {
        self.record("interview_invitation")
    }

    fn send_stage_update(
        &self,
        _application: &ApplicationSummary,
        _stage: WorkflowStage,
        _message: &str,
    ) -> Result<(), NotificationError> {
        self.record("stage_update")
    }
}

pub(super) struct Harness {
    pub(super) engine: Arc<HiringWorkflowEngine>,
    pub(super) pipelines: Arc<MemoryPipelines>,
    pub(super) applications: Arc<MemoryApplications>,
    pub(super) events: Arc<MemoryEvents>,
    pub(super) tests: Arc<MemoryTests>,
    pub(super) interviews: Arc<MemoryInterviews>,
    pub(super) offers: Arc<MemoryOffers>,
    pub(super) notifier: Arc<RecordingNotifier>,
}

pub(super) fn application(id: &str) -> ApplicationSummary {
    ApplicationSummary {
        id: ApplicationId(id.to_string()),
        job_id: JobId("job-1".to_string()),
        candidate_id: CandidateId("cand-1".to_string()),
        hr_id: HrId("hr-1".to_string()),
        applicant_name: "Asha Patel".to_string(),
        email: "asha@example.com".to_string(),
        status: "Applied".to_string(),
    }
}

pub(super) fn active_test() -> JobTest {
    JobTest {
        id: "test-1".to_string(),
        job_id: JobId("job-1".to_string()),
        title: "Backend Fundamentals".to_string(),
        duration_minutes: 45,
        passing_score: 70,
        status: TestStatus::Active,
    }
}

pub(super) fn harness() -> Harness {
    let pipelines = Arc::new(MemoryPipelines::default());
    let applications = Arc::new(MemoryApplications::default());
    let events = Arc::new(MemoryEvents::default());
    let tests = Arc::new(MemoryTests::default());
    let interviews = Arc::new(MemoryInterviews::default());
    let offers = Arc::new(MemoryOffers::default());
    let notifier = Arc::new(RecordingNotifier::default());

    applications.seed(application("app-1"));

    let engine = Arc::new(HiringWorkflowEngine::new(
        pipelines.clone(),
        applications.clone(),
        events.clone(),
        tests.clone(),
        interviews.clone(),
        offers.clone(),
        notifier.clone(),
        WorkflowConfig::default(),
    ));

    Harness {
        engine,
        pipelines,
        applications,
        events,
        tests,
        interviews,
        offers,
        notifier,
    }
}
