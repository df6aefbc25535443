use crate::core::model::{JobDescriptor, JobId, JobOutcome, JobStatus, ProgressEvent};

#[derive(Debug, Clone)]
pub enum EngineEvent {
    JobAdded { job_id: JobId, descriptor: JobDescriptor },
    JobStatusChanged { job_id: JobId, status: JobStatus },
    Progress { job_id: JobId, event: ProgressEvent },
    /// Sent exactly once per job, always last.
    JobFinished { job_id: JobId, outcome: JobOutcome },
}

impl EngineEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            EngineEvent::JobAdded { job_id, .. }
            | EngineEvent::JobStatusChanged { job_id, .. }
            | EngineEvent::Progress { job_id, .. }
            | EngineEvent::JobFinished { job_id, .. } => *job_id,
        }
    }
}
