#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the prompt input.
    InputChanged(String),
    /// User submitted the current prompt.
    SendClicked,
    /// User picked local files to attach to the conversation.
    FilesPicked(Vec<crate::PickedFile>),
    /// Upload batch finished: document ids in input order, or the first failure.
    UploadSettled {
        result: Result<Vec<String>, crate::UploadFailure>,
    },
    /// Backend accepted the submitted task.
    TaskAccepted { task_id: String },
    /// The task run resolved; see `TaskDisposition` for how.
    TaskSettled { disposition: crate::TaskDisposition },
    /// User toggled collapse on a long message.
    CollapseToggled { message_id: crate::MessageId },
    /// User asked to abort the in-flight run.
    CancelClicked,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
