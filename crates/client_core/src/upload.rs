use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use shared::domain::{ContentId, NftMetadata};
use tracing::{info, warn};
use url::Url;

use crate::{config::Settings, error::UploadError, session::AudioPayload};

const METADATA_FILE_NAME: &str = "metadata.json";
const METADATA_MIME: &str = "application/json";

/// Decentralized storage: takes a payload, hands back its content identifier.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<ContentId, UploadError>;
}

pub struct MissingContentStorage;

#[async_trait]
impl ContentStorage for MissingContentStorage {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        _file_name: &str,
        _mime_type: &str,
    ) -> Result<ContentId, UploadError> {
        Err(UploadError::MissingApiKey)
    }
}

#[derive(Debug, Deserialize)]
struct LighthouseAddResponse {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Hash", default)]
    hash: Option<String>,
    #[serde(rename = "Size", default)]
    size: Option<String>,
}

pub struct LighthouseClient {
    http: Client,
    add_url: Url,
    api_key: Option<String>,
}

impl LighthouseClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, UploadError> {
        let invalid = |source| UploadError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        };
        let base = Url::parse(&format!("{}/", endpoint.trim_end_matches('/'))).map_err(invalid)?;
        let add_url = base.join("api/v0/add").map_err(invalid)?;
        Ok(Self {
            http: Client::new(),
            add_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, UploadError> {
        Self::new(
            &settings.lighthouse_endpoint,
            settings.lighthouse_api_key.clone(),
        )
    }

    pub fn add_url(&self) -> &Url {
        &self.add_url
    }
}

#[async_trait]
impl ContentStorage for LighthouseClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<ContentId, UploadError> {
        let api_key = self.api_key.as_deref().ok_or(UploadError::MissingApiKey)?;
        let size_bytes = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.add_url.clone())
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), file_name, "lighthouse: upload rejected");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: LighthouseAddResponse = response.json().await?;
        let content_id = body
            .hash
            .map(ContentId::new)
            .filter(|id| !id.is_blank())
            .ok_or(UploadError::MissingContentId)?;
        info!(
            file_name = body.name.as_deref().unwrap_or(file_name),
            size_bytes,
            reported_size = body.size.as_deref().unwrap_or("?"),
            content_id = %content_id,
            "lighthouse: upload stored"
        );
        Ok(content_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedSubmission {
    pub metadata_content_id: ContentId,
    /// The uploaded document, with the audio clip's content id filled in.
    pub metadata: NftMetadata,
}

/// Stores the audio clip, then the metadata document pointing at it. The metadata
/// document's id is the one the submission is known by from here on.
pub async fn upload_submission(
    storage: &dyn ContentStorage,
    audio: &AudioPayload,
    file_name: &str,
    metadata: &NftMetadata,
) -> Result<UploadedSubmission, UploadError> {
    let audio_content_id = storage
        .upload(audio.bytes.clone(), file_name, &audio.mime_type)
        .await?;

    let mut metadata = metadata.clone();
    metadata.audio_content_id = Some(audio_content_id);
    let document = serde_json::to_vec(&metadata)?;
    let metadata_content_id = storage
        .upload(document, METADATA_FILE_NAME, METADATA_MIME)
        .await?;
    Ok(UploadedSubmission {
        metadata_content_id,
        metadata,
    })
}

pub fn gateway_url(gateway_base: &str, content_id: &ContentId) -> String {
    format!("{}/{}", gateway_base.trim_end_matches('/'), content_id)
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
