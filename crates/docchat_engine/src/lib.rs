//! Doc-chat engine: backend protocol clients and effect execution.
mod api;
mod backoff;
mod engine;
mod task;
mod types;
mod upload;

pub use backoff::{poll_delay, BackoffSettings};
pub use engine::EngineHandle;
pub use task::{
    run_task, ChannelEventSink, ClientSettings, EventSink, HttpTaskClient, SubmitRequest, TaskApi,
};
pub use types::{
    AgentAnswer, ClientBuildError, EngineEvent, Mode, SourceRef, SubmitReceipt, TaskError,
    TaskOutcome, TaskSnapshot, TaskStatus, UploadError, UploadFile, UploadSlot,
};
pub use upload::{upload_all, HttpUploader, UploadApi};
