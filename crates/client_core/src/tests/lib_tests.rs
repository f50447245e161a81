use super::*;
use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::IntensityLevel,
    error::ErrorCode,
    protocol::{ConnectionState, MintCall, WalletResponse},
};
use storage::MemoryStore;
use tokio::sync::Mutex;

use crate::session::{AUDIO_KEY, CONTENT_ID_KEY, DRAFT_KEY, PREVIEW_KEY};

const GATEWAY: &str = "https://gateway.lighthouse.storage/ipfs/";

#[derive(Default)]
struct RecordingStorage {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
}

#[async_trait]
impl ContentStorage for RecordingStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<ContentId, UploadError> {
        let mut uploads = self.uploads.lock().await;
        uploads.push((file_name.to_string(), mime_type.to_string(), bytes));
        Ok(ContentId::new(format!("bafy{}", uploads.len())))
    }
}

struct ApprovingWallet {
    calls: Mutex<Vec<MintCall>>,
}

#[async_trait]
impl WalletCollaborator for ApprovingWallet {
    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    fn account_address(&self) -> Option<String> {
        Some("0x71C7656EC7ab88b098defB751B7401B5f6d8976F".into())
    }

    async fn sign_and_submit(&self, call: MintCall) -> Result<WalletResponse> {
        self.calls.lock().await.push(call);
        Ok(WalletResponse::with_transaction("0xabc"))
    }
}

struct Harness {
    store: MemoryStore,
    storage: Arc<RecordingStorage>,
    client: MoodZooClient,
}

fn harness() -> Harness {
    let store = MemoryStore::new();
    let storage = Arc::new(RecordingStorage::default());
    let client = MoodZooClient::new_with_dependencies(
        Arc::new(store.clone()),
        storage.clone(),
        Arc::new(FixedIndex(2)),
        GATEWAY,
    );
    Harness {
        store,
        storage,
        client,
    }
}

fn rage_input() -> DraftInput {
    DraftInput {
        audio: Some(AudioUpload {
            file_name: "beat.mp3".into(),
            mime_type: "audio/mpeg".into(),
            bytes: b"ID3beat".to_vec(),
        }),
        emotion: Some(EmotionTag::Rage),
        custom_emotion: None,
        description: "furious beat".into(),
    }
}

#[tokio::test]
async fn rage_submission_flows_from_upload_to_gallery_and_mint() {
    let Harness {
        store,
        storage,
        client,
    } = harness();
    let mut events = client.subscribe_events();

    let draft = client.submit(rage_input()).await.expect("submit");
    assert_eq!(draft.emotion, Some(EmotionTag::Rage));
    assert!(matches!(events.recv().await, Ok(ClientEvent::DraftSaved(_))));

    let preview = client.preview().await.expect("preview");
    assert_eq!(preview.creature_emoji, "🐯");
    assert_eq!(preview.creature_caption, "Raging tiger with spiky fur");

    let submission = client.finalize(&preview).await.expect("finalize");
    assert_eq!(submission.storage_content_id, ContentId::new("bafy2"));
    assert_eq!(submission.display_name, "Raging tiger with spiky fur");
    assert_eq!(submission.description, "furious beat");
    assert_eq!(client.current_draft().await.expect("draft"), None);
    assert_eq!(store.get(AUDIO_KEY).await.expect("audio"), None);
    assert_eq!(
        store.get(CONTENT_ID_KEY).await.expect("cid").as_deref(),
        Some("bafy2")
    );

    {
        let uploads = storage.uploads.lock().await;
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, "beat.mp3");
        assert_eq!(uploads[0].2, b"ID3beat");
        let document: NftMetadata = serde_json::from_slice(&uploads[1].2).expect("metadata");
        assert_eq!(document.emotion, EmotionTag::Rage);
        assert_eq!(document.intensity, IntensityLevel::Medium);
        assert_eq!(document.audio_content_id, Some(ContentId::new("bafy1")));
    }

    let entries = client.gallery(None).await.expect("gallery");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].submission, submission);

    let wallet = ApprovingWallet {
        calls: Mutex::new(Vec::new()),
    };
    let receipt = client.mint(&wallet).await.expect("mint");
    assert_eq!(receipt.transaction_id.as_str(), "0xabc");
    assert_eq!(
        receipt.call.arguments(),
        [
            "Raging tiger with spiky fur",
            "furious beat",
            "https://gateway.lighthouse.storage/ipfs/bafy2",
            "RAGE",
            "🐯",
        ]
    );
    assert!(matches!(client.mint_state().await, MintState::Success { .. }));
    assert_eq!(wallet.calls.lock().await.len(), 1);
}

#[tokio::test]
async fn invalid_submission_reports_field_errors_and_saves_nothing() {
    let Harness { store, client, .. } = harness();
    let mut input = rage_input();
    input.emotion = None;
    input.description = "   ".into();

    let err = client.submit(input).await.expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::Validation);
    let ClientError::Validation(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.get(DraftField::Emotion), Some("Please select an emotion"));
    assert_eq!(
        errors.get(DraftField::Description),
        Some("Please provide a description")
    );
    assert_eq!(store.get(DRAFT_KEY).await.expect("draft"), None);
}

#[tokio::test]
async fn preview_and_finalize_require_a_draft() {
    let Harness { client, .. } = harness();
    assert!(matches!(client.preview().await, Err(ClientError::NoDraft)));
    assert!(matches!(client.reroll().await, Err(ClientError::NoDraft)));

    let preview = GeneratedPreview {
        creature_emoji: "🦄".into(),
        creature_caption: "Mystical unicorn with rainbow mane".into(),
    };
    assert!(matches!(
        client.finalize(&preview).await,
        Err(ClientError::NoDraft)
    ));
    assert!(matches!(
        client.finalize_previewed().await,
        Err(ClientError::NoDraft)
    ));
}

#[tokio::test]
async fn finalize_uploads_the_creature_previewed_in_an_earlier_run() {
    for _ in 0..8 {
        let store = MemoryStore::new();
        let storage = Arc::new(RecordingStorage::default());
        let open_client = || {
            MoodZooClient::new_with_dependencies(
                Arc::new(store.clone()),
                storage.clone(),
                Arc::new(ThreadRandom),
                GATEWAY,
            )
        };

        let first_run = open_client();
        first_run.submit(rage_input()).await.expect("submit");
        let preview = first_run.preview().await.expect("preview");

        let second_run = open_client();
        let submission = second_run.finalize_previewed().await.expect("finalize");
        assert_eq!(submission.display_name, preview.creature_caption);
        assert_eq!(submission.creature_emoji, preview.creature_emoji);

        let uploads = storage.uploads.lock().await;
        let document: NftMetadata = serde_json::from_slice(&uploads[1].2).expect("metadata");
        assert_eq!(document.animal_description, preview.creature_caption);
        assert_eq!(store.get(PREVIEW_KEY).await.expect("preview"), None);
    }
}

#[tokio::test]
async fn new_draft_discards_the_previous_preview() {
    let Harness { store, client, .. } = harness();
    client.submit(rage_input()).await.expect("submit");
    client.preview().await.expect("preview");
    assert!(store.get(PREVIEW_KEY).await.expect("preview").is_some());

    client.submit(rage_input()).await.expect("resubmit");
    assert_eq!(store.get(PREVIEW_KEY).await.expect("preview"), None);
}

#[tokio::test]
async fn minted_submission_is_refused_after_restart_without_calling_wallet() {
    let Harness {
        store,
        storage,
        client,
    } = harness();
    client.submit(rage_input()).await.expect("submit");
    client.finalize_previewed().await.expect("finalize");
    let wallet = ApprovingWallet {
        calls: Mutex::new(Vec::new()),
    };
    client.mint(&wallet).await.expect("mint");

    let restarted = MoodZooClient::new_with_dependencies(
        Arc::new(store.clone()),
        storage,
        Arc::new(FixedIndex(2)),
        GATEWAY,
    );
    assert_eq!(restarted.mint_state().await, MintState::Idle);
    let err = restarted.mint(&wallet).await.expect_err("already minted");
    let ClientError::Mint(MintError::AlreadyMinted(transaction_id)) = &err else {
        panic!("expected already minted, got {err:?}");
    };
    assert_eq!(transaction_id.as_str(), "0xabc");
    assert_eq!(err.code(), ErrorCode::Precondition);
    assert_eq!(wallet.calls.lock().await.len(), 1);
}

#[tokio::test]
async fn client_errors_become_blocking_alerts() {
    let Harness { client, .. } = harness();
    let err = client.preview().await.expect_err("no draft");
    let alert = err.to_user_facing();
    assert_eq!(alert.code, ErrorCode::Precondition);
    assert_eq!(alert.message, "no draft in progress");
    assert_eq!(alert.to_string(), "[precondition] no draft in progress");
}

#[tokio::test]
async fn mint_without_finalized_submission_is_a_precondition_failure() {
    let Harness { client, .. } = harness();
    let wallet = ApprovingWallet {
        calls: Mutex::new(Vec::new()),
    };
    let err = client.mint(&wallet).await.expect_err("nothing to mint");
    assert_eq!(err.code(), ErrorCode::Precondition);
    assert!(wallet.calls.lock().await.is_empty());

    let err = client
        .mint(&DisconnectedWallet)
        .await
        .expect_err("nothing to mint");
    assert!(matches!(
        err,
        ClientError::Mint(MintError::Precondition(PreconditionError::MissingSubmission))
    ));
}

#[tokio::test]
async fn custom_text_survives_only_for_custom_emotion() {
    let Harness { client, .. } = harness();
    let mut input = rage_input();
    input.custom_emotion = Some("wistful".into());
    let draft = client.submit(input).await.expect("submit");
    assert_eq!(draft.custom_emotion, None);

    let mut custom = rage_input();
    custom.emotion = Some(EmotionTag::Custom);
    custom.custom_emotion = Some("wistful".into());
    let draft = client.submit(custom).await.expect("submit");
    assert_eq!(draft.emotion_label(), "wistful");

    let preview = client.preview().await.expect("preview");
    assert_eq!(preview.creature_emoji, "🦄");
    let metadata = build_metadata(&draft, &preview, Utc::now());
    assert_eq!(metadata.custom_emotion.as_deref(), Some("wistful"));
    assert_eq!(metadata.file_name.as_deref(), Some("beat.mp3"));
}

#[tokio::test]
async fn missing_storage_key_surfaces_as_upload_error_and_keeps_draft() {
    let store = MemoryStore::new();
    let client = MoodZooClient::new_with_dependencies(
        Arc::new(store.clone()),
        Arc::new(MissingContentStorage),
        Arc::new(FixedIndex(0)),
        GATEWAY,
    );
    client.submit(rage_input()).await.expect("submit");
    let preview = client.preview().await.expect("preview");

    let err = client.finalize(&preview).await.expect_err("no api key");
    assert_eq!(err.code(), ErrorCode::Upload);
    assert!(client.current_draft().await.expect("draft").is_some());
    assert_eq!(store.get(CONTENT_ID_KEY).await.expect("cid"), None);
}
