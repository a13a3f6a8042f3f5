//! Executes core effects against the engine and pumps engine events back
//! into the message loop.

use std::fs;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use docchat_core::{Effect, Msg, PickedFile, TaskDisposition, UploadFailure};
use docchat_engine::{
    ClientBuildError, ClientSettings, EngineEvent, EngineHandle, SubmitRequest, TaskError,
    TaskOutcome, UploadError, UploadFile,
};
use engine_logging::{engine_debug, engine_info, engine_warn};

pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    msg_tx: mpsc::Sender<Msg>,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings, msg_tx: mpsc::Sender<Msg>) -> Result<Self, ClientBuildError> {
        let engine = Arc::new(EngineHandle::new(settings)?);
        let runner = Self {
            engine,
            msg_tx: msg_tx.clone(),
        };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RunTask {
                    prompt,
                    document_ids,
                    mode,
                } => {
                    engine_info!(
                        "RunTask prompt_len={} documents={} mode={}",
                        prompt.len(),
                        document_ids.len(),
                        map_mode(mode)
                    );
                    self.engine.run(SubmitRequest {
                        prompt,
                        document_ids,
                        mode: map_mode(mode),
                    });
                }
                Effect::UploadFiles { files } => match read_files(&files) {
                    Ok(files) => self.engine.upload(files),
                    Err(failure) => {
                        engine_warn!(
                            "Upload aborted before transfer: {} ({})",
                            failure.filename,
                            failure.message
                        );
                        let _ = self.msg_tx.send(Msg::UploadSettled {
                            result: Err(failure),
                        });
                    }
                },
                Effect::CancelRun => self.engine.cancel(),
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                if let Some(msg) = map_event(event) {
                    if msg_tx.send(msg).is_err() {
                        break;
                    }
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::TaskAccepted { task_id } => Some(Msg::TaskAccepted { task_id }),
        EngineEvent::TaskPolled {
            task_id,
            attempt,
            status,
        } => {
            engine_debug!("Task {} poll {} -> {:?}", task_id, attempt, status);
            None
        }
        EngineEvent::TaskSettled { result } => Some(Msg::TaskSettled {
            disposition: map_outcome(result),
        }),
        EngineEvent::UploadStarted {
            filename,
            index,
            total,
        } => {
            engine_info!("Uploading {} ({}/{})", filename, index + 1, total);
            None
        }
        EngineEvent::UploadSettled { result } => Some(Msg::UploadSettled {
            result: map_upload(result),
        }),
    }
}

fn map_outcome(result: Result<TaskOutcome, TaskError>) -> TaskDisposition {
    match result {
        Ok(TaskOutcome::Completed(answer)) => TaskDisposition::Answered {
            text: answer.text,
            sources: answer.sources.into_iter().map(map_source).collect(),
            report: answer.report,
        },
        Ok(TaskOutcome::MalformedResult { message }) => {
            engine_warn!("Malformed result payload: {}", message);
            TaskDisposition::MalformedAnswer
        }
        Ok(TaskOutcome::Failed { message }) => {
            if let Some(message) = message {
                engine_warn!("Task failed: {}", message);
            }
            TaskDisposition::Failed
        }
        Ok(TaskOutcome::Indeterminate { attempts }) => {
            engine_warn!("Gave up after {} polls", attempts);
            TaskDisposition::TimedOut
        }
        Ok(TaskOutcome::Cancelled) => TaskDisposition::Cancelled,
        Err(err) => TaskDisposition::TransportError {
            detail: err.to_string(),
        },
    }
}

fn map_upload(
    result: Result<Vec<String>, UploadError>,
) -> Result<Vec<String>, UploadFailure> {
    result.map_err(|err| UploadFailure {
        filename: err.filename().to_string(),
        message: err.to_string(),
    })
}

fn map_source(source: docchat_engine::SourceRef) -> docchat_core::SourceRef {
    docchat_core::SourceRef {
        document_id: source.document_id,
        pages: source.pages,
    }
}

fn map_mode(mode: docchat_core::Mode) -> docchat_engine::Mode {
    match mode {
        docchat_core::Mode::Retrieval => docchat_engine::Mode::Retrieval,
        docchat_core::Mode::Baseline => docchat_engine::Mode::Baseline,
    }
}

fn read_files(picked: &[PickedFile]) -> Result<Vec<UploadFile>, UploadFailure> {
    picked
        .iter()
        .map(|file| {
            fs::read(&file.path)
                .map(|bytes| UploadFile {
                    filename: file.filename.clone(),
                    content_type: file.content_type.clone(),
                    bytes,
                })
                .map_err(|err| UploadFailure {
                    filename: file.filename.clone(),
                    message: err.to_string(),
                })
        })
        .collect()
}
