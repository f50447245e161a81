use std::sync::Arc;

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::domain::{ContentId, Draft, GeneratedPreview, NftMetadata, TransactionId};
use storage::KeyValueStore;
use tracing::{debug, warn};

use crate::error::ParseError;

pub const DRAFT_KEY: &str = "moodZooUploadData";
pub const AUDIO_KEY: &str = "moodZooAudioFile";
pub const CONTENT_ID_KEY: &str = "moodZooLighthouseCID";
pub const FINALIZED_KEY: &str = "moodZooUploadedMetadata";
pub const GALLERY_KEY: &str = "moodZooSavedNFTs";
pub const SELECTED_SHOWCASE_KEY: &str = "selectedDegenNFT";
pub const PREVIEW_KEY: &str = "moodZooGeneratedPreview";
pub const MINT_RECORD_KEY: &str = "moodZooMintRecord";

pub(crate) fn decode_document<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, ParseError> {
    serde_json::from_str(raw).map_err(|source| ParseError {
        key: key.to_string(),
        source,
    })
}

/// Reads a JSON document, treating an unparseable value as absent.
pub(crate) async fn read_document<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match decode_document(key, &raw) {
        Ok(value) => Ok(Some(value)),
        Err(error) => {
            warn!(%error, "discarding corrupt stored document");
            Ok(None)
        }
    }
}

pub(crate) async fn write_document<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioPayload {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    pub fn from_data_url(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix("data:")?;
        let (mime_type, encoded) = rest.split_once(";base64,")?;
        let bytes = STANDARD.decode(encoded.trim()).ok()?;
        Some(Self {
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

/// A confirmed mint, remembered so the same submission is not minted twice
/// across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRecord {
    pub content_id: ContentId,
    pub transaction_id: TransactionId,
}

/// Carries the in-progress submission between the upload, preview and mint steps.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn save_draft(&self, draft: &Draft) -> Result<()> {
        write_document(self.store.as_ref(), DRAFT_KEY, draft).await?;
        debug!(emotion = ?draft.emotion, "session: draft saved");
        Ok(())
    }

    pub async fn load_draft(&self) -> Result<Option<Draft>> {
        read_document(self.store.as_ref(), DRAFT_KEY).await
    }

    pub async fn clear_draft(&self) -> Result<()> {
        self.store.remove(DRAFT_KEY).await?;
        self.store.remove(AUDIO_KEY).await?;
        self.clear_preview().await
    }

    /// Only the most recent preview is kept; finalization uses it.
    pub async fn save_preview(&self, preview: &GeneratedPreview) -> Result<()> {
        write_document(self.store.as_ref(), PREVIEW_KEY, preview).await
    }

    pub async fn load_preview(&self) -> Result<Option<GeneratedPreview>> {
        read_document(self.store.as_ref(), PREVIEW_KEY).await
    }

    pub async fn clear_preview(&self) -> Result<()> {
        self.store.remove(PREVIEW_KEY).await
    }

    pub async fn save_audio(&self, audio: &AudioPayload) -> Result<()> {
        self.store.set(AUDIO_KEY, &audio.to_data_url()).await
    }

    pub async fn load_audio(&self) -> Result<Option<AudioPayload>> {
        let Some(raw) = self.store.get(AUDIO_KEY).await? else {
            return Ok(None);
        };
        let payload = AudioPayload::from_data_url(&raw);
        if payload.is_none() {
            warn!(key = AUDIO_KEY, "discarding malformed audio data url");
        }
        Ok(payload)
    }

    pub async fn save_content_id(&self, content_id: &ContentId) -> Result<()> {
        self.store.set(CONTENT_ID_KEY, content_id.as_str()).await
    }

    pub async fn load_content_id(&self) -> Result<Option<ContentId>> {
        Ok(self
            .store
            .get(CONTENT_ID_KEY)
            .await?
            .map(ContentId::new)
            .filter(|id| !id.is_blank()))
    }

    pub async fn save_finalized(&self, metadata: &NftMetadata) -> Result<()> {
        write_document(self.store.as_ref(), FINALIZED_KEY, metadata).await
    }

    pub async fn load_finalized(&self) -> Result<Option<NftMetadata>> {
        read_document(self.store.as_ref(), FINALIZED_KEY).await
    }

    pub async fn save_mint_record(&self, record: &MintRecord) -> Result<()> {
        write_document(self.store.as_ref(), MINT_RECORD_KEY, record).await
    }

    /// The recorded mint for `content_id`, if that submission was already minted.
    pub async fn load_mint_record(&self, content_id: &ContentId) -> Result<Option<MintRecord>> {
        let record: Option<MintRecord> =
            read_document(self.store.as_ref(), MINT_RECORD_KEY).await?;
        Ok(record.filter(|record| &record.content_id == content_id))
    }
}
