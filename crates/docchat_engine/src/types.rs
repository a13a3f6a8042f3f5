use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Answer grounding requested for a task submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Retrieval,
    Baseline,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Retrieval => "retrieval",
            Mode::Baseline => "baseline",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    /// The backend writes `RUNNING` (and historically `PENDING`) before a
    /// terminal status; anything but the two terminal strings keeps polling.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "COMPLETED" => TaskStatus::Completed,
            "FAILED" => TaskStatus::Failed,
            _ => TaskStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Backend acknowledgement of a task submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub task_id: String,
    /// Session correlation id minted by the backend alongside the task.
    pub session_id: Option<String>,
}

/// One observed poll of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    /// Serialized answer payload, present once COMPLETED.
    pub result: Option<String>,
    /// Backend-reported failure detail, present on FAILED.
    pub error: Option<String>,
}

/// A citation into an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub document_id: String,
    #[serde(default)]
    pub pages: Vec<u32>,
}

/// Parsed COMPLETED result payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentAnswer {
    pub text: String,
    pub sources: Vec<SourceRef>,
    pub report: Option<String>,
}

/// How a task run resolved.
///
/// `Failed` is declared by the backend; `Indeterminate` is the client giving
/// up after the poll budget. The two are deliberately distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(AgentAnswer),
    /// COMPLETED, but the result payload was missing or unparseable.
    MalformedResult { message: String },
    Failed { message: Option<String> },
    Indeterminate { attempts: u32 },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task submission failed: http status {0}")]
    SubmissionStatus(u16),
    #[error("task submission failed: {0}")]
    SubmissionTransport(String),
    #[error("task poll failed: http status {0}")]
    PollStatus(u16),
    #[error("task poll failed: {0}")]
    PollTransport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("upload slot request failed for {filename}: http status {status}")]
    SlotStatus { filename: String, status: u16 },
    #[error("upload slot request failed for {filename}: {message}")]
    SlotTransport { filename: String, message: String },
    #[error("upload slot for {filename} has an invalid destination url: {message}")]
    BadSlotUrl { filename: String, message: String },
    #[error("upload rejected for {filename}: http status {status}")]
    TransferStatus { filename: String, status: u16 },
    #[error("upload failed for {filename}: {message}")]
    TransferTransport { filename: String, message: String },
}

impl UploadError {
    /// The file whose step failed the batch.
    pub fn filename(&self) -> &str {
        match self {
            UploadError::SlotStatus { filename, .. }
            | UploadError::SlotTransport { filename, .. }
            | UploadError::BadSlotUrl { filename, .. }
            | UploadError::TransferStatus { filename, .. }
            | UploadError::TransferTransport { filename, .. } => filename,
        }
    }
}

/// Construction of an HTTP client failed before any request went out.
#[derive(Debug, Clone, thiserror::Error)]
#[error("http client setup failed: {0}")]
pub struct ClientBuildError(pub String);

/// A presigned destination for exactly one file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub upload_url: String,
    pub document_id: String,
    /// Extra headers the destination requires on the PUT.
    pub headers: HashMap<String, String>,
    /// Object extension the backend derived from the content type.
    pub extension: Option<String>,
    /// Seconds until the destination url expires.
    pub expires_in: Option<u64>,
}

/// File bytes staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The backend accepted a submission; polling starts.
    TaskAccepted { task_id: String },
    /// One poll attempt finished.
    TaskPolled {
        task_id: String,
        attempt: u32,
        status: TaskStatus,
    },
    /// The run resolved, one way or another.
    TaskSettled {
        result: Result<TaskOutcome, TaskError>,
    },
    /// A file in the current batch started its slot/transfer handoff.
    UploadStarted {
        filename: String,
        index: usize,
        total: usize,
    },
    /// The upload batch resolved.
    UploadSettled {
        result: Result<Vec<String>, UploadError>,
    },
}
