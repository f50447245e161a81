use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use shared::domain::{ContentId, EmotionTag, FinalizedSubmission, GalleryEntry, NftMetadata};
use storage::KeyValueStore;
use tracing::{debug, info};

use crate::session::{read_document, write_document, CONTENT_ID_KEY, FINALIZED_KEY, GALLERY_KEY};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryFilter {
    pub emotion: Option<EmotionTag>,
    /// Case-insensitive substring of the creature caption.
    pub creature: Option<String>,
    /// Case-insensitive substring of the display name or description.
    pub query: Option<String>,
}

impl GalleryFilter {
    pub fn emotion(tag: EmotionTag) -> Self {
        Self {
            emotion: Some(tag),
            ..Self::default()
        }
    }

    pub fn query(text: impl Into<String>) -> Self {
        Self {
            query: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &GalleryEntry) -> bool {
        let submission = &entry.submission;
        if self.emotion.is_some_and(|tag| submission.emotion != tag) {
            return false;
        }
        if let Some(creature) = non_blank_lowercase(self.creature.as_deref()) {
            if !submission
                .creature_caption
                .to_lowercase()
                .contains(&creature)
            {
                return false;
            }
        }
        if let Some(query) = non_blank_lowercase(self.query.as_deref()) {
            if !submission.display_name.to_lowercase().contains(&query)
                && !submission.description.to_lowercase().contains(&query)
            {
                return false;
            }
        }
        true
    }
}

fn non_blank_lowercase(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// Entries shown when nothing has been minted yet. Never persisted.
pub fn demo_entries() -> Vec<GalleryEntry> {
    vec![
        demo_entry(
            "sample1",
            "🐸",
            "Grumpy Frog",
            "Why Monday again?",
            EmotionTag::Chaos,
            "Grumpy frog with headphones",
            15,
            Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0),
        ),
        demo_entry(
            "sample2",
            "🐶",
            "Happy Doggo",
            "Sunshine and lofi",
            EmotionTag::Tranquility,
            "Happy dog with wagging tail",
            21,
            Utc.with_ymd_and_hms(2025, 5, 19, 12, 0, 0),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn demo_entry(
    id: &str,
    emoji: &str,
    name: &str,
    description: &str,
    emotion: EmotionTag,
    caption: &str,
    likes: u32,
    created_at: chrono::LocalResult<DateTime<Utc>>,
) -> GalleryEntry {
    GalleryEntry {
        submission: FinalizedSubmission {
            storage_content_id: ContentId::new(id),
            display_name: name.to_string(),
            description: description.to_string(),
            emotion,
            custom_emotion: None,
            creature_emoji: emoji.to_string(),
            creature_caption: caption.to_string(),
            created_at: created_at.single().unwrap_or(DateTime::<Utc>::MIN_UTC),
        },
        likes,
    }
}

/// Browsing view over every finalized submission seen by this store.
#[derive(Clone)]
pub struct GalleryAggregator {
    store: Arc<dyn KeyValueStore>,
}

impl GalleryAggregator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Folds the pending finalized submission into the history, persists it and
    /// returns the entries newest first, optionally narrowed by `filter`.
    pub async fn list_entries(&self, filter: Option<&GalleryFilter>) -> Result<Vec<GalleryEntry>> {
        let mut history = self.load_history().await?;

        if let Some(pending) = self.pending_submission().await? {
            if insert_unique(&mut history, pending) {
                self.save_history(&history).await?;
            }
        }

        if history.is_empty() {
            debug!("gallery: history empty, showing demo entries");
            history = demo_entries();
        }

        sort_newest_first(&mut history);
        if let Some(filter) = filter {
            history.retain(|entry| filter.matches(entry));
        }
        Ok(history)
    }

    /// Adds `submission` unless its content id is already present. Returns whether
    /// the history changed.
    pub async fn incorporate(&self, submission: FinalizedSubmission) -> Result<bool> {
        let mut history = self.load_history().await?;
        let inserted = insert_unique(&mut history, submission);
        if inserted {
            self.save_history(&history).await?;
        }
        Ok(inserted)
    }

    /// Bumps the like counter for a persisted entry; `None` if the id is unknown.
    pub async fn like(&self, content_id: &ContentId) -> Result<Option<u32>> {
        let mut history = self.load_history().await?;
        let Some(entry) = history
            .iter_mut()
            .find(|entry| entry.content_id() == content_id)
        else {
            return Ok(None);
        };
        entry.likes = entry.likes.saturating_add(1);
        let likes = entry.likes;
        self.save_history(&history).await?;
        Ok(Some(likes))
    }

    async fn load_history(&self) -> Result<Vec<GalleryEntry>> {
        let stored: Vec<GalleryEntry> = read_document(self.store.as_ref(), GALLERY_KEY)
            .await?
            .unwrap_or_default();
        let mut history: Vec<GalleryEntry> = Vec::with_capacity(stored.len());
        for entry in stored {
            if !history
                .iter()
                .any(|kept| kept.content_id() == entry.content_id())
            {
                history.push(entry);
            }
        }
        Ok(history)
    }

    async fn save_history(&self, history: &[GalleryEntry]) -> Result<()> {
        write_document(self.store.as_ref(), GALLERY_KEY, &history).await
    }

    async fn pending_submission(&self) -> Result<Option<FinalizedSubmission>> {
        let Some(content_id) = self
            .store
            .get(CONTENT_ID_KEY)
            .await?
            .map(ContentId::new)
            .filter(|id| !id.is_blank())
        else {
            return Ok(None);
        };
        let metadata: Option<NftMetadata> = read_document(self.store.as_ref(), FINALIZED_KEY).await?;
        Ok(metadata.map(|metadata| FinalizedSubmission::from_metadata(content_id, metadata)))
    }
}

fn insert_unique(history: &mut Vec<GalleryEntry>, submission: FinalizedSubmission) -> bool {
    if history
        .iter()
        .any(|entry| entry.submission.storage_content_id == submission.storage_content_id)
    {
        return false;
    }
    info!(
        content_id = %submission.storage_content_id,
        emotion = %submission.emotion,
        "gallery: incorporated submission"
    );
    history.push(GalleryEntry::new(submission));
    true
}

fn sort_newest_first(entries: &mut [GalleryEntry]) {
    entries.sort_by(|a, b| b.submission.created_at.cmp(&a.submission.created_at));
}

#[cfg(test)]
#[path = "tests/gallery_tests.rs"]
mod tests;
