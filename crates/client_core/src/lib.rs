use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    domain::{
        AudioBlobRef, ContentId, Draft, EmotionTag, FinalizedSubmission, GalleryEntry,
        GeneratedPreview, Intensity, NftMetadata,
    },
    error::{DraftField, ValidationErrors},
};
use storage::KeyValueStore;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub mod config;
pub mod creature;
pub mod error;
pub mod gallery;
pub mod mint;
pub mod session;
pub mod showcase;
pub mod upload;
pub mod validation;
pub mod wallet;

pub use config::{load_settings, Settings};
pub use creature::{CreatureGenerator, FixedIndex, RandomSource, ThreadRandom};
pub use error::{ClientError, MintError, PreconditionError, TransactionError, UploadError};
pub use gallery::{GalleryAggregator, GalleryFilter};
pub use mint::{MintDispatcher, MintReceipt, MintState};
pub use session::{AudioPayload, MintRecord, SessionStore};
pub use showcase::{Showcase, ShowcaseEntry};
pub use upload::{ContentStorage, LighthouseClient, MissingContentStorage};
pub use wallet::{display_address, DisconnectedWallet, WalletCollaborator};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    DraftSaved(Draft),
    PreviewGenerated(GeneratedPreview),
    Finalized(FinalizedSubmission),
    MintStateChanged(MintState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// What the user filled in on the upload step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftInput {
    pub audio: Option<AudioUpload>,
    pub emotion: Option<EmotionTag>,
    pub custom_emotion: Option<String>,
    pub description: String,
}

/// Drives a submission from upload through preview and finalization to mint, and
/// serves the gallery and showcase views over the same store.
pub struct MoodZooClient {
    session: SessionStore,
    generator: CreatureGenerator,
    gallery: GalleryAggregator,
    showcase: Showcase,
    storage: Arc<dyn ContentStorage>,
    minter: MintDispatcher,
    events: broadcast::Sender<ClientEvent>,
}

impl MoodZooClient {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        storage: Arc<dyn ContentStorage>,
        settings: &Settings,
    ) -> Self {
        Self::new_with_dependencies(
            store,
            storage,
            Arc::new(ThreadRandom),
            settings.gateway_url.clone(),
        )
    }

    pub fn new_with_dependencies(
        store: Arc<dyn KeyValueStore>,
        storage: Arc<dyn ContentStorage>,
        random: Arc<dyn RandomSource>,
        gateway_base: impl Into<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: SessionStore::new(Arc::clone(&store)),
            generator: CreatureGenerator::new(random),
            gallery: GalleryAggregator::new(Arc::clone(&store)),
            showcase: Showcase::new(store),
            storage,
            minter: MintDispatcher::with_events(gateway_base, events.clone()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Validates the upload form and stores it as the current draft.
    pub async fn submit(&self, input: DraftInput) -> Result<Draft, ClientError> {
        let audio = input.audio.as_ref().map(|upload| AudioBlobRef {
            file_name: upload.file_name.clone(),
            size_bytes: upload.bytes.len() as u64,
            mime_type: upload.mime_type.clone(),
        });
        let draft = Draft {
            audio,
            emotion: input.emotion,
            custom_emotion: input
                .custom_emotion
                .filter(|_| input.emotion == Some(EmotionTag::Custom)),
            description: input.description,
            upload_time: Utc::now(),
        };
        validation::validate_draft(&draft)?;

        if let Some(upload) = input.audio {
            self.session
                .save_audio(&AudioPayload {
                    mime_type: upload.mime_type,
                    bytes: upload.bytes,
                })
                .await?;
        }
        self.session.save_draft(&draft).await?;
        self.session.clear_preview().await?;
        info!(emotion = %draft.emotion_label(), "wizard: draft submitted");
        self.emit(ClientEvent::DraftSaved(draft.clone()));
        Ok(draft)
    }

    pub async fn current_draft(&self) -> Result<Option<Draft>, ClientError> {
        Ok(self.session.load_draft().await?)
    }

    pub async fn preview(&self) -> Result<GeneratedPreview, ClientError> {
        let draft = self
            .session
            .load_draft()
            .await?
            .ok_or(ClientError::NoDraft)?;
        let preview = self
            .generator
            .generate_for(draft.emotion.map(EmotionTag::as_str));
        debug!(
            creature = %preview.creature_emoji,
            caption = %preview.creature_caption,
            "wizard: preview generated"
        );
        self.session.save_preview(&preview).await?;
        self.emit(ClientEvent::PreviewGenerated(preview.clone()));
        Ok(preview)
    }

    /// Another random pick for the same draft. May repeat the previous creature.
    pub async fn reroll(&self) -> Result<GeneratedPreview, ClientError> {
        self.preview().await
    }

    /// Finalizes with the last preview shown for the current draft, generating
    /// one first when none was stored.
    pub async fn finalize_previewed(&self) -> Result<FinalizedSubmission, ClientError> {
        let preview = match self.session.load_preview().await? {
            Some(preview) => preview,
            None => self.preview().await?,
        };
        self.finalize(&preview).await
    }

    /// Uploads the draft's audio and metadata, records the result as the pending
    /// submission and clears the draft.
    pub async fn finalize(
        &self,
        preview: &GeneratedPreview,
    ) -> Result<FinalizedSubmission, ClientError> {
        let draft = self
            .session
            .load_draft()
            .await?
            .ok_or(ClientError::NoDraft)?;
        validation::validate_draft(&draft)?;
        let audio = self.session.load_audio().await?.ok_or_else(|| {
            ValidationErrors::single(DraftField::File, "Please upload an audio file")
        })?;
        let file_name = draft
            .audio
            .as_ref()
            .map(|audio| audio.file_name.clone())
            .unwrap_or_default();

        let metadata = build_metadata(&draft, preview, Utc::now());
        let uploaded =
            upload::upload_submission(self.storage.as_ref(), &audio, &file_name, &metadata)
                .await?;

        self.session
            .save_content_id(&uploaded.metadata_content_id)
            .await?;
        self.session.save_finalized(&uploaded.metadata).await?;
        self.session.clear_draft().await?;
        self.minter.reset().await;

        let submission =
            FinalizedSubmission::from_metadata(uploaded.metadata_content_id, uploaded.metadata);
        info!(
            content_id = %submission.storage_content_id,
            emotion = %submission.emotion,
            "wizard: submission finalized"
        );
        self.emit(ClientEvent::Finalized(submission.clone()));
        Ok(submission)
    }

    /// Mints the pending submission. A submission already recorded as minted in
    /// the store is refused without contacting the wallet.
    pub async fn mint(&self, wallet: &dyn WalletCollaborator) -> Result<MintReceipt, ClientError> {
        let metadata = self
            .session
            .load_finalized()
            .await?
            .ok_or(PreconditionError::MissingSubmission)?;
        let content_id = self.session.load_content_id().await?;
        if let Some(content_id) = content_id.as_ref() {
            if let Some(record) = self.session.load_mint_record(content_id).await? {
                info!(
                    content_id = %record.content_id,
                    transaction_id = %record.transaction_id,
                    "wizard: submission already minted"
                );
                return Err(MintError::AlreadyMinted(record.transaction_id).into());
            }
        }

        let receipt = self
            .minter
            .mint(&metadata, content_id.as_ref(), wallet)
            .await?;
        if let Some(content_id) = content_id {
            self.session
                .save_mint_record(&MintRecord {
                    content_id,
                    transaction_id: receipt.transaction_id.clone(),
                })
                .await?;
        }
        Ok(receipt)
    }

    /// The contract call `mint` would send for the pending submission.
    pub async fn prepared_mint_call(&self) -> Result<shared::protocol::MintCall, ClientError> {
        let metadata = self
            .session
            .load_finalized()
            .await?
            .ok_or(PreconditionError::MissingSubmission)?;
        let content_id = self
            .session
            .load_content_id()
            .await?
            .ok_or(PreconditionError::MissingContentId)?;
        Ok(self.minter.build_call(&metadata, &content_id))
    }

    pub async fn mint_state(&self) -> MintState {
        self.minter.state().await
    }

    pub async fn gallery(
        &self,
        filter: Option<&GalleryFilter>,
    ) -> Result<Vec<GalleryEntry>, ClientError> {
        Ok(self.gallery.list_entries(filter).await?)
    }

    pub async fn like(&self, content_id: &ContentId) -> Result<Option<u32>, ClientError> {
        Ok(self.gallery.like(content_id).await?)
    }

    pub fn showcase(&self) -> &Showcase {
        &self.showcase
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

/// Snapshot of a draft and its chosen creature, as uploaded and later minted.
pub fn build_metadata(
    draft: &Draft,
    preview: &GeneratedPreview,
    created_at: DateTime<Utc>,
) -> NftMetadata {
    let emotion = draft.emotion.unwrap_or(EmotionTag::Custom);
    NftMetadata {
        name: preview.creature_caption.clone(),
        description: draft.description.clone(),
        emotion,
        custom_emotion: draft
            .custom_emotion
            .clone()
            .filter(|_| emotion == EmotionTag::Custom),
        animal: preview.creature_emoji.clone(),
        animal_description: preview.creature_caption.clone(),
        created_at,
        intensity: Intensity::calculate(&draft.description, Some(emotion)).level,
        file_name: draft.audio.as_ref().map(|audio| audio.file_name.clone()),
        audio_content_id: None,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
