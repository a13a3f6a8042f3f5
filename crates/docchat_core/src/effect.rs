#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RunTask {
        prompt: String,
        document_ids: Vec<String>,
        mode: crate::Mode,
    },
    UploadFiles {
        files: Vec<crate::PickedFile>,
    },
    CancelRun,
}
