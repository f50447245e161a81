use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use shared::domain::EmotionTag;
use storage::KeyValueStore;
use tracing::debug;

use crate::session::{read_document, write_document, SELECTED_SHOWCASE_KEY};

/// A community creature shown in the showcase. Prices and durations are display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowcaseEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub animal: String,
    pub name: String,
    pub description: String,
    pub likes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub emotion: EmotionTag,
    pub audio: String,
    pub minted_date: String,
    pub on_chain_id: String,
    pub ipfs_link: String,
    pub owner: String,
}

impl ShowcaseEntry {
    pub fn emotion_emoji(&self) -> &'static str {
        self.emotion.emoji()
    }
}

// Stored selections written by older clients carry numeric ids.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: u32,
    animal: &str,
    name: &str,
    description: &str,
    likes: u32,
    rarity: &str,
    price: &str,
    emotion: EmotionTag,
    audio: &str,
    minted_date: &str,
    on_chain_id: &str,
    ipfs_link: &str,
    owner: &str,
) -> ShowcaseEntry {
    ShowcaseEntry {
        id: id.to_string(),
        animal: animal.into(),
        name: name.into(),
        description: description.into(),
        likes,
        rarity: Some(rarity.into()),
        price: Some(price.into()),
        emotion,
        audio: audio.into(),
        minted_date: minted_date.into(),
        on_chain_id: on_chain_id.into(),
        ipfs_link: ipfs_link.into(),
        owner: owner.into(),
    }
}

pub fn catalog() -> Vec<ShowcaseEntry> {
    vec![
        entry(
            1,
            "🐍",
            "Snek NFT",
            "Much mood. Very sound.",
            88,
            "Legendary",
            "0.42 ETH",
            EmotionTag::Chaos,
            "0:42",
            "2025-05-20 12:42",
            "#420069",
            "https://ipfs.io/ipfs/QmSnekHash",
            "0x71C7656EC7ab88b098defB751B7401B5f6d8976F",
        ),
        entry(
            2,
            "🐳",
            "Aquachad",
            "Sea the vibes",
            64,
            "Epic",
            "0.2 ETH",
            EmotionTag::Tranquility,
            "0:33",
            "2025-05-19 18:20",
            "#123456",
            "https://ipfs.io/ipfs/QmWhaleHash",
            "0x44C7656EC7ab88b098defB751B7401B5f6d8976A",
        ),
        entry(
            3,
            "🐈‍⬛",
            "Hacker Cat",
            "Deploying from the void",
            42,
            "Rare",
            "0.1337 ETH",
            EmotionTag::Melancholy,
            "0:45",
            "2025-05-18 03:33",
            "#133742",
            "https://ipfs.io/ipfs/QmCatHash",
            "0x71C7656EC7ab88b098defB751B7401B5f6d89777",
        ),
        entry(
            4,
            "🦍",
            "Ape Together",
            "Strong mood only",
            69,
            "Uncommon",
            "0.069 ETH",
            EmotionTag::Rage,
            "0:39",
            "2025-05-17 14:20",
            "#696969",
            "https://ipfs.io/ipfs/QmApeHash",
            "0x71C7656EC7ab88b098defB751B7401B5f6d8976D",
        ),
        entry(
            5,
            "🦜",
            "HODL Parrot",
            "Never selling these vibes",
            55,
            "Rare",
            "0.055 ETH",
            EmotionTag::Custom,
            "0:28",
            "2025-05-16 09:15",
            "#554433",
            "https://ipfs.io/ipfs/QmParrotHash",
            "0x71C7656EC7ab88b098defB751B7401B5f6d8976E",
        ),
        entry(
            6,
            "🐢",
            "Diamond Shell",
            "Slow and steady gains",
            33,
            "Uncommon",
            "0.033 ETH",
            EmotionTag::Tranquility,
            "0:36",
            "2025-05-15 21:03",
            "#334455",
            "https://ipfs.io/ipfs/QmTurtleHash",
            "0x71C7656EC7ab88b098defB751B7401B5f6d8976C",
        ),
    ]
}

/// Placeholder detail for ids that were never selected from the catalog.
pub fn fallback_detail(id: &str) -> ShowcaseEntry {
    ShowcaseEntry {
        id: id.to_string(),
        animal: "🐕‍🦺".into(),
        name: "Cool Dog with shades".into(),
        description: "Feeling super bright and sunny!".into(),
        likes: 15,
        rarity: Some("Uncommon".into()),
        price: Some("0.1 ETH".into()),
        emotion: EmotionTag::Tranquility,
        audio: "0:47".into(),
        minted_date: "2025-05-18 14:30".into(),
        on_chain_id: format!("#{id}5678"),
        ipfs_link: "https://ipfs.io/ipfs/QmXyZ...".into(),
        owner: "0x71C7...F3a2".into(),
    }
}

#[derive(Clone)]
pub struct Showcase {
    store: Arc<dyn KeyValueStore>,
}

impl Showcase {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn entries(&self) -> Vec<ShowcaseEntry> {
        catalog()
    }

    /// Remembers the chosen catalog entry for the detail view.
    pub async fn select(&self, id: &str) -> Result<Option<ShowcaseEntry>> {
        let Some(entry) = catalog().into_iter().find(|entry| entry.id == id) else {
            return Ok(None);
        };
        write_document(self.store.as_ref(), SELECTED_SHOWCASE_KEY, &entry).await?;
        debug!(id, name = %entry.name, "showcase: entry selected");
        Ok(Some(entry))
    }

    pub async fn detail(&self, id: &str) -> Result<ShowcaseEntry> {
        let selected: Option<ShowcaseEntry> =
            read_document(self.store.as_ref(), SELECTED_SHOWCASE_KEY).await?;
        Ok(selected
            .filter(|entry| entry.id == id)
            .unwrap_or_else(|| fallback_detail(id)))
    }
}

#[cfg(test)]
mod tests {
    use storage::MemoryStore;

    use super::*;

    #[test]
    fn catalog_has_six_distinct_entries() {
        let entries = catalog();
        assert_eq!(entries.len(), 6);
        let mut ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(entries[3].emotion_emoji(), "😡");
    }

    #[tokio::test]
    async fn detail_prefers_matching_selection() {
        let showcase = Showcase::new(Arc::new(MemoryStore::new()));
        let selected = showcase.select("2").await.expect("select").expect("known id");
        assert_eq!(selected.name, "Aquachad");

        assert_eq!(showcase.detail("2").await.expect("detail"), selected);

        let other = showcase.detail("9").await.expect("detail");
        assert_eq!(other.name, "Cool Dog with shades");
        assert_eq!(other.on_chain_id, "#95678");
    }

    #[tokio::test]
    async fn unknown_selection_leaves_store_untouched() {
        let store = MemoryStore::new();
        let showcase = Showcase::new(Arc::new(store.clone()));
        assert_eq!(showcase.select("42").await.expect("select"), None);
        assert_eq!(store.get(SELECTED_SHOWCASE_KEY).await.expect("get"), None);
    }

    #[tokio::test]
    async fn numeric_and_corrupt_selections_are_handled() {
        let store = MemoryStore::new();
        let mut stored = serde_json::to_value(&catalog()[0]).expect("json");
        stored["id"] = serde_json::json!(1);
        store
            .set(SELECTED_SHOWCASE_KEY, &stored.to_string())
            .await
            .expect("seed");
        let showcase = Showcase::new(Arc::new(store.clone()));
        assert_eq!(showcase.detail("1").await.expect("detail").name, "Snek NFT");

        store.set(SELECTED_SHOWCASE_KEY, "{oops").await.expect("seed");
        assert_eq!(
            showcase.detail("1").await.expect("detail").name,
            "Cool Dog with shades"
        );
    }
}
