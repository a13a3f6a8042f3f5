use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use tokio_util::sync::CancellationToken;

use crate::task::{run_task, ChannelEventSink, ClientSettings, HttpTaskClient, SubmitRequest, TaskApi};
use crate::upload::{upload_all, HttpUploader, UploadApi};
use crate::{ClientBuildError, EngineEvent, UploadFile};

enum EngineCommand {
    Run(SubmitRequest),
    Upload { files: Vec<UploadFile> },
    Cancel,
}

/// Bridge between the synchronous app thread and the tokio runtime: commands
/// in, events out over mpsc channels.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientBuildError> {
        let task_client: Arc<dyn TaskApi> = Arc::new(HttpTaskClient::new(&settings)?);
        let uploader: Arc<dyn UploadApi> = Arc::new(HttpUploader::new(&settings)?);

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            // Replaced on each new run; Cancel aborts the run in flight.
            let mut current_cancel = CancellationToken::new();

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Run(request) => {
                        current_cancel = CancellationToken::new();
                        let cancel = current_cancel.clone();
                        let api = task_client.clone();
                        let event_tx = event_tx.clone();
                        let max_poll_attempts = settings.max_poll_attempts;
                        let backoff = settings.backoff.clone();
                        runtime.spawn(async move {
                            let sink = ChannelEventSink::new(event_tx.clone());
                            let result = run_task(
                                api.as_ref(),
                                &request,
                                max_poll_attempts,
                                &backoff,
                                &sink,
                                &cancel,
                            )
                            .await;
                            let _ = event_tx.send(EngineEvent::TaskSettled { result });
                        });
                    }
                    EngineCommand::Upload { files } => {
                        let api = uploader.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let sink = ChannelEventSink::new(event_tx.clone());
                            let result = upload_all(api.as_ref(), &files, &sink).await;
                            let _ = event_tx.send(EngineEvent::UploadSettled { result });
                        });
                    }
                    EngineCommand::Cancel => current_cancel.cancel(),
                }
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        })
    }

    pub fn run(&self, request: SubmitRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Run(request));
    }

    pub fn upload(&self, files: Vec<UploadFile>) {
        let _ = self.cmd_tx.send(EngineCommand::Upload { files });
    }

    /// Aborts the run in flight at its next suspension point, if any.
    pub fn cancel(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx
            .lock()
            .ok()
            .and_then(|rx| rx.try_recv().ok())
    }
}
