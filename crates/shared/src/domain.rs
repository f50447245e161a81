use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_DESCRIPTION_CHARS: usize = 280;
pub const MAX_AUDIO_BYTES: u64 = 10 * 1024 * 1024;

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_newtype!(ContentId);
string_id_newtype!(TransactionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionTag {
    Melancholy,
    Rage,
    Tranquility,
    Chaos,
    Custom,
}

impl EmotionTag {
    pub const ALL: [EmotionTag; 5] = [
        EmotionTag::Melancholy,
        EmotionTag::Rage,
        EmotionTag::Tranquility,
        EmotionTag::Chaos,
        EmotionTag::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionTag::Melancholy => "MELANCHOLY",
            EmotionTag::Rage => "RAGE",
            EmotionTag::Tranquility => "TRANQUILITY",
            EmotionTag::Chaos => "CHAOS",
            EmotionTag::Custom => "CUSTOM",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            EmotionTag::Melancholy => "😢",
            EmotionTag::Rage => "😡",
            EmotionTag::Tranquility => "😌",
            EmotionTag::Chaos => "🤯",
            EmotionTag::Custom => "✨",
        }
    }
}

/// Emoji shown next to an emotion label; unknown or missing tags get a neutral face.
pub fn emotion_emoji(tag: Option<EmotionTag>) -> &'static str {
    tag.map(EmotionTag::emoji).unwrap_or("😐")
}

impl fmt::Display for EmotionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown emotion tag '{0}'")]
pub struct UnknownEmotionTag(pub String);

impl FromStr for EmotionTag {
    type Err = UnknownEmotionTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        EmotionTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownEmotionTag(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioBlobRef {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// The user's in-progress submission, carried from the upload step to finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioBlobRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emotion: Option<String>,
    pub description: String,
    pub upload_time: DateTime<Utc>,
}

impl Draft {
    /// Label shown for the draft's emotion: the custom text for CUSTOM drafts when
    /// one was entered, the tag name otherwise.
    pub fn emotion_label(&self) -> String {
        emotion_label(self.emotion, self.custom_emotion.as_deref())
    }
}

pub fn emotion_label(emotion: Option<EmotionTag>, custom_emotion: Option<&str>) -> String {
    match (emotion, custom_emotion.map(str::trim)) {
        (Some(EmotionTag::Custom), Some(custom)) if !custom.is_empty() => custom.to_string(),
        (Some(tag), _) => tag.as_str().to_string(),
        (None, _) => "Unknown".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPreview {
    pub creature_emoji: String,
    pub creature_caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntensityLevel::Low => "LOW",
            IntensityLevel::Medium => "MEDIUM",
            IntensityLevel::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intensity {
    pub percent: u8,
    pub level: IntensityLevel,
}

impl Intensity {
    /// Description length contributes up to 50 points, the emotion adds a fixed bonus.
    /// The level is judged on the exact score; `percent` is that score rounded down.
    pub fn calculate(description: &str, emotion: Option<EmotionTag>) -> Self {
        let chars = description.chars().count().min(MAX_DESCRIPTION_CHARS);
        let bonus = match emotion {
            Some(EmotionTag::Rage) | Some(EmotionTag::Chaos) => 40,
            Some(EmotionTag::Melancholy) => 30,
            _ => 20,
        };
        // Score in units of 1/MAX_DESCRIPTION_CHARS of a point.
        let scaled = (chars * 50 + bonus * MAX_DESCRIPTION_CHARS).min(100 * MAX_DESCRIPTION_CHARS);
        let level = if scaled > 70 * MAX_DESCRIPTION_CHARS {
            IntensityLevel::High
        } else if scaled > 40 * MAX_DESCRIPTION_CHARS {
            IntensityLevel::Medium
        } else {
            IntensityLevel::Low
        };
        Self {
            percent: (scaled / MAX_DESCRIPTION_CHARS) as u8,
            level,
        }
    }
}

/// Metadata document uploaded next to the audio clip and kept as the finalized snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub emotion: EmotionTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emotion: Option<String>,
    pub animal: String,
    pub animal_description: String,
    pub created_at: DateTime<Utc>,
    pub intensity: IntensityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_content_id: Option<ContentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSubmission {
    pub storage_content_id: ContentId,
    pub display_name: String,
    pub description: String,
    pub emotion: EmotionTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emotion: Option<String>,
    pub creature_emoji: String,
    pub creature_caption: String,
    pub created_at: DateTime<Utc>,
}

impl FinalizedSubmission {
    pub fn from_metadata(storage_content_id: ContentId, metadata: NftMetadata) -> Self {
        Self {
            storage_content_id,
            display_name: metadata.name,
            description: metadata.description,
            emotion: metadata.emotion,
            custom_emotion: metadata.custom_emotion,
            creature_emoji: metadata.animal,
            creature_caption: metadata.animal_description,
            created_at: metadata.created_at,
        }
    }

    pub fn emotion_label(&self) -> String {
        emotion_label(Some(self.emotion), self.custom_emotion.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    #[serde(flatten)]
    pub submission: FinalizedSubmission,
    #[serde(default)]
    pub likes: u32,
}

impl GalleryEntry {
    pub fn new(submission: FinalizedSubmission) -> Self {
        Self {
            submission,
            likes: 0,
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.submission.storage_content_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_emotion_tags_case_insensitively() {
        assert_eq!("rage".parse::<EmotionTag>(), Ok(EmotionTag::Rage));
        assert_eq!(" Chaos ".parse::<EmotionTag>(), Ok(EmotionTag::Chaos));
        assert!("JOY".parse::<EmotionTag>().is_err());
    }

    #[test]
    fn emotion_tags_serialize_as_upper_case_names() {
        let json = serde_json::to_string(&EmotionTag::Tranquility).expect("json");
        assert_eq!(json, "\"TRANQUILITY\"");
    }

    #[test]
    fn custom_label_prefers_entered_text() {
        assert_eq!(emotion_label(Some(EmotionTag::Custom), Some("wistful")), "wistful");
        assert_eq!(emotion_label(Some(EmotionTag::Custom), Some("  ")), "CUSTOM");
        assert_eq!(emotion_label(Some(EmotionTag::Rage), Some("ignored")), "RAGE");
        assert_eq!(emotion_label(None, None), "Unknown");
    }

    #[test]
    fn intensity_thresholds() {
        let short = Intensity::calculate("", Some(EmotionTag::Tranquility));
        assert_eq!(short.percent, 20);
        assert_eq!(short.level, IntensityLevel::Low);

        let rage = Intensity::calculate(&"x".repeat(140), Some(EmotionTag::Rage));
        assert_eq!(rage.percent, 65);
        assert_eq!(rage.level, IntensityLevel::Medium);

        let full = Intensity::calculate(&"x".repeat(400), Some(EmotionTag::Chaos));
        assert_eq!(full.percent, 90);
        assert_eq!(full.level, IntensityLevel::High);
    }

    #[test]
    fn intensity_level_uses_the_unrounded_score() {
        let at_threshold = Intensity::calculate(&"x".repeat(168), Some(EmotionTag::Rage));
        assert_eq!(at_threshold.percent, 70);
        assert_eq!(at_threshold.level, IntensityLevel::Medium);

        let just_over = Intensity::calculate(&"x".repeat(169), Some(EmotionTag::Rage));
        assert_eq!(just_over.percent, 70);
        assert_eq!(just_over.level, IntensityLevel::High);

        let calm = Intensity::calculate(&"x".repeat(112), Some(EmotionTag::Tranquility));
        assert_eq!(calm.level, IntensityLevel::Low);

        let calm_over = Intensity::calculate(&"x".repeat(113), Some(EmotionTag::Tranquility));
        assert_eq!(calm_over.percent, 40);
        assert_eq!(calm_over.level, IntensityLevel::Medium);

        let untagged = Intensity::calculate(&"x".repeat(115), None);
        assert_eq!(untagged.level, IntensityLevel::Medium);
    }

    #[test]
    fn gallery_entry_flattens_submission_fields() {
        let entry = GalleryEntry {
            submission: FinalizedSubmission {
                storage_content_id: ContentId::new("bafy1"),
                display_name: "Fierce tiger".into(),
                description: "furious beat".into(),
                emotion: EmotionTag::Rage,
                custom_emotion: None,
                creature_emoji: "🐯".into(),
                creature_caption: "Fierce tiger with glowing eyes".into(),
                created_at: Utc::now(),
            },
            likes: 3,
        };
        let value = serde_json::to_value(&entry).expect("json");
        assert_eq!(value["storageContentId"], "bafy1");
        assert_eq!(value["likes"], 3);
        let back: GalleryEntry = serde_json::from_value(value).expect("parse");
        assert_eq!(back, entry);
    }
}
