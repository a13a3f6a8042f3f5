use engine_logging::engine_info;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::api::{UploadSlotBody, UploadSlotReply};
use crate::task::{endpoint_url, ClientSettings, EventSink};
use crate::{ClientBuildError, EngineEvent, UploadError, UploadFile, UploadSlot};

#[async_trait::async_trait]
pub trait UploadApi: Send + Sync {
    async fn request_slot(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadSlot, UploadError>;
    async fn transfer(&self, slot: &UploadSlot, file: &UploadFile) -> Result<(), UploadError>;
}

#[derive(Debug, Clone)]
pub struct HttpUploader {
    user_id: String,
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpUploader {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        let endpoint = endpoint_url(&settings.base_url, "upload-request")?;
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

#[async_trait::async_trait]
impl UploadApi for HttpUploader {
    async fn request_slot(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadSlot, UploadError> {
        let body = UploadSlotBody {
            filename,
            content_type,
            user_id: &self.user_id,
        };
        let payload = serde_json::to_vec(&body).map_err(|err| UploadError::SlotTransport {
            filename: filename.to_string(),
            message: err.to_string(),
        })?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|err| UploadError::SlotTransport {
                filename: filename.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::SlotStatus {
                filename: filename.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| UploadError::SlotTransport {
                filename: filename.to_string(),
                message: err.to_string(),
            })?;
        let reply: UploadSlotReply =
            serde_json::from_slice(&bytes).map_err(|err| UploadError::SlotTransport {
                filename: filename.to_string(),
                message: err.to_string(),
            })?;
        Ok(UploadSlot {
            upload_url: reply.upload_url,
            document_id: reply.document_id,
            headers: reply.headers,
            extension: reply.extension,
            expires_in: reply.expires_in,
        })
    }

    async fn transfer(&self, slot: &UploadSlot, file: &UploadFile) -> Result<(), UploadError> {
        let url = Url::parse(&slot.upload_url).map_err(|err| UploadError::BadSlotUrl {
            filename: file.filename.clone(),
            message: err.to_string(),
        })?;

        let mut request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, file.content_type.as_str());
        for (name, value) in &slot.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|err| UploadError::TransferTransport {
                filename: file.filename.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::TransferStatus {
                filename: file.filename.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Uploads files one at a time, in input order, via the slot/transfer
/// handoff.
///
/// The first failure aborts the remaining queue and discards identifiers
/// already obtained: the batch is all-or-nothing. On success the identifiers
/// come back in the same order as the input files.
pub async fn upload_all(
    api: &dyn UploadApi,
    files: &[UploadFile],
    sink: &dyn EventSink,
) -> Result<Vec<String>, UploadError> {
    let mut document_ids = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        sink.emit(EngineEvent::UploadStarted {
            filename: file.filename.clone(),
            index,
            total: files.len(),
        });
        let slot = api.request_slot(&file.filename, &file.content_type).await?;
        api.transfer(&slot, file).await?;
        engine_info!("Uploaded {} as {}", file.filename, slot.document_id);
        document_ids.push(slot.document_id);
    }
    Ok(document_ids)
}
