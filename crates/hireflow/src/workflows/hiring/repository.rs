use super::domain::{
    ApplicationId, ApplicationSummary, CandidatePipeline, JobId, ScheduleEvent,
};

/// Error enumeration for store failures, shared by every persistence trait
/// in the workflow module.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for candidate pipelines so the engine can be
/// exercised in isolation. Pipelines are never deleted (audit trail).
pub trait PipelineStore: Send + Sync {
    fn insert(&self, pipeline: CandidatePipeline) -> Result<CandidatePipeline, StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<CandidatePipeline>, StoreError>;
    fn update(&self, pipeline: CandidatePipeline) -> Result<(), StoreError>;
    fn all(&self) -> Result<Vec<CandidatePipeline>, StoreError>;
    fn for_job(&self, job_id: &JobId) -> Result<Vec<CandidatePipeline>, StoreError>;
}

/// Read/update access to the application documents owned by the job board.
/// The engine only mirrors stage labels onto them.
pub trait ApplicationStore: Send + Sync {
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationSummary>, StoreError>;
    fn set_status(&self, id: &ApplicationId, status: &str) -> Result<(), StoreError>;
}

/// Store for auto-scheduled events consumed by HR dashboards.
pub trait EventStore: Send + Sync {
    fn insert(&self, event: ScheduleEvent) -> Result<ScheduleEvent, StoreError>;
    /// Scheduled events sorted by `scheduled_at` ascending, optionally
    /// filtered to those listing `participant`.
    fn scheduled(&self, participant: Option<&str>) -> Result<Vec<ScheduleEvent>, StoreError>;
}
