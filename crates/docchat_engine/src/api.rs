//! Wire bodies for the backend's task and upload endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitTaskBody<'a> {
    pub prompt: &'a str,
    pub document_ids: &'a [String],
    pub user_id: &'a str,
    pub mode: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitTaskReply {
    pub task_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PollReply {
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadSlotBody<'a> {
    pub filename: &'a str,
    pub content_type: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadSlotReply {
    pub upload_url: String,
    pub document_id: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
