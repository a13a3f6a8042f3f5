use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::{PollReply, SubmitTaskBody, SubmitTaskReply};
use crate::backoff::{poll_delay, BackoffSettings};
use crate::{
    AgentAnswer, ClientBuildError, EngineEvent, Mode, SubmitReceipt, TaskError, TaskOutcome,
    TaskSnapshot, TaskStatus,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// API base, e.g. `https://api.example.com/api`.
    pub base_url: String,
    pub user_id: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_poll_attempts: u32,
    pub backoff: BackoffSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            user_id: "demo".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_poll_attempts: 60,
            backoff: BackoffSettings::default(),
        }
    }
}

/// A query submitted against the accumulated documents (or none in baseline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub prompt: String,
    pub document_ids: Vec<String>,
    pub mode: Mode,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait TaskApi: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, TaskError>;
    async fn poll(&self, task_id: &str) -> Result<TaskSnapshot, TaskError>;
}

#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    user_id: String,
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpTaskClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        let endpoint = endpoint_url(&settings.base_url, "agent-task")?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientBuildError(err.to_string()))?;
        Ok(Self {
            user_id: settings.user_id.clone(),
            endpoint,
            client,
        })
    }
}

pub(crate) fn endpoint_url(base_url: &str, path: &str) -> Result<Url, ClientBuildError> {
    let trimmed = base_url.trim_end_matches('/');
    Url::parse(&format!("{trimmed}/{path}")).map_err(|err| ClientBuildError(err.to_string()))
}

#[async_trait::async_trait]
impl TaskApi for HttpTaskClient {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, TaskError> {
        let body = SubmitTaskBody {
            prompt: &request.prompt,
            document_ids: &request.document_ids,
            user_id: &self.user_id,
            mode: request.mode.as_str(),
        };
        let payload = serde_json::to_vec(&body)
            .map_err(|err| TaskError::SubmissionTransport(err.to_string()))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|err| TaskError::SubmissionTransport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaskError::SubmissionStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| TaskError::SubmissionTransport(err.to_string()))?;
        let reply: SubmitTaskReply = serde_json::from_slice(&bytes)
            .map_err(|err| TaskError::SubmissionTransport(err.to_string()))?;
        Ok(SubmitReceipt {
            task_id: reply.task_id,
            session_id: reply.session_id,
        })
    }

    async fn poll(&self, task_id: &str) -> Result<TaskSnapshot, TaskError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("taskId", task_id);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| TaskError::PollTransport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaskError::PollStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| TaskError::PollTransport(err.to_string()))?;
        let reply: PollReply = serde_json::from_slice(&bytes)
            .map_err(|err| TaskError::PollTransport(err.to_string()))?;
        Ok(TaskSnapshot {
            task_id: task_id.to_string(),
            status: TaskStatus::from_wire(&reply.status),
            result: reply.result,
            error: reply.error,
        })
    }
}

/// Submits a query and polls until a terminal status, the attempt budget, or
/// cancellation.
///
/// At most `max_poll_attempts` polls; the backoff suspension runs only
/// between polls and races against the cancellation token. Exhausting the
/// budget yields `Indeterminate`, never `Failed`. The function performs no
/// conversation mutation; progress goes through `sink` and the outcome is
/// returned for the store to apply.
pub async fn run_task(
    api: &dyn TaskApi,
    request: &SubmitRequest,
    max_poll_attempts: u32,
    backoff: &BackoffSettings,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) -> Result<TaskOutcome, TaskError> {
    let receipt = api.submit(request).await?;
    engine_info!(
        "Task {} accepted (session {})",
        receipt.task_id,
        receipt.session_id.as_deref().unwrap_or("-")
    );
    sink.emit(EngineEvent::TaskAccepted {
        task_id: receipt.task_id.clone(),
    });

    let task_id = receipt.task_id;
    let mut attempt = 0;
    while attempt < max_poll_attempts {
        if cancel.is_cancelled() {
            return Ok(TaskOutcome::Cancelled);
        }

        let snapshot = api.poll(&task_id).await?;
        attempt += 1;
        engine_debug!(
            "Task {} poll {} status {:?}",
            task_id,
            attempt,
            snapshot.status
        );
        sink.emit(EngineEvent::TaskPolled {
            task_id: task_id.clone(),
            attempt,
            status: snapshot.status,
        });

        match snapshot.status {
            TaskStatus::Completed => return Ok(parse_completed(&task_id, snapshot.result)),
            TaskStatus::Failed => {
                return Ok(TaskOutcome::Failed {
                    message: snapshot.error,
                })
            }
            TaskStatus::Pending => {}
        }

        if attempt < max_poll_attempts {
            let delay = poll_delay(backoff, attempt - 1);
            tokio::select! {
                _ = cancel.cancelled() => return Ok(TaskOutcome::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Ok(TaskOutcome::Indeterminate { attempts: attempt })
}

fn parse_completed(task_id: &str, result: Option<String>) -> TaskOutcome {
    let Some(raw) = result else {
        engine_warn!("Task {} completed without a result payload", task_id);
        return TaskOutcome::MalformedResult {
            message: "missing result payload".to_string(),
        };
    };
    match serde_json::from_str::<AgentAnswer>(&raw) {
        Ok(answer) => TaskOutcome::Completed(answer),
        Err(err) => {
            engine_warn!("Task {} result payload unparseable: {}", task_id, err);
            TaskOutcome::MalformedResult {
                message: err.to_string(),
            }
        }
    }
}
