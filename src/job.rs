use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a successful submission. Other fields of the job record are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmittedJob {
    #[serde(rename = "jobID")]
    pub(crate) job_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Accepted,
    Running,
    RunningWithErrors,
    Successful,
    CompleteWithErrors,
    Failed,
    Canceled,
    Paused,
    Previewing,
}

impl JobState {
    /// True once the job will make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Successful | JobState::CompleteWithErrors | JobState::Failed | JobState::Canceled
        )
    }
}

/// Normalized snapshot of a job.
///
/// Serializes to exactly `progress, status, message, createdAt, updatedAt, request,
/// numInputGranules`; `username`, `links` and `jobID` of the raw record are dropped.
/// Timestamps are kept exactly as the service sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub progress: u8,
    pub status: JobState,
    pub message: String,
    pub created_at: String,
    pub updated_at: String,
    /// The submission URL as echoed by the service.
    pub request: String,
    pub num_input_granules: u64,
}

impl JobStatus {
    /// `createdAt` as a UTC instant, if it is valid RFC 3339.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_utc(&self.created_at)
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_utc(&self.updated_at)
    }
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Result of a status query: the full record, or just its progress.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusView {
    Record(JobStatus),
    Progress(u8),
}

impl StatusView {
    pub fn progress(&self) -> u8 {
        match self {
            StatusView::Record(s) => s.progress,
            StatusView::Progress(p) => *p,
        }
    }
}

/// Parses a raw job record. Missing fields, unknown states and progress above 100 are errors.
pub(crate) fn parse_job_status(text: &str) -> serde_json::Result<JobStatus> {
    let status: JobStatus = serde_json::from_str(text)?;
    if status.progress > 100 {
        return Err(serde::de::Error::custom(format!(
            "progress {} is outside 0..=100",
            status.progress
        )));
    }
    Ok(status)
}
