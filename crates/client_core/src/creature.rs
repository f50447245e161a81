use std::sync::Arc;

use rand::Rng;
use shared::domain::{EmotionTag, GeneratedPreview};

pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always picks the same slot, wrapping around short candidate lists.
pub struct FixedIndex(pub usize);

impl RandomSource for FixedIndex {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Creature {
    pub emoji: &'static str,
    pub caption: &'static str,
}

const fn creature(emoji: &'static str, caption: &'static str) -> Creature {
    Creature { emoji, caption }
}

const MELANCHOLY: [Creature; 3] = [
    creature("🐘", "Gentle elephant with teary eyes"),
    creature("🐘", "Wise old elephant with distant gaze"),
    creature("🐘", "Melancholic elephant with droopy ears"),
];

const RAGE: [Creature; 3] = [
    creature("🐯", "Fierce tiger with glowing eyes"),
    creature("🐯", "Battle-scarred tiger with intense stare"),
    creature("🐯", "Raging tiger with spiky fur"),
];

const TRANQUILITY: [Creature; 3] = [
    creature("🦥", "Peaceful sloth meditating"),
    creature("🦥", "Serene sloth with half-closed eyes"),
    creature("🦥", "Tranquil sloth in zen pose"),
];

const CHAOS: [Creature; 3] = [
    creature("🦊", "Wild fox with electric fur"),
    creature("🦊", "Chaotic fox surrounded by sparks"),
    creature("🦊", "Frenetic fox with swirling patterns"),
];

const CUSTOM: [Creature; 3] = [
    creature("🦄", "Mystical unicorn with rainbow mane"),
    creature("🦄", "Unique unicorn with glowing horn"),
    creature("🦄", "Colorful unicorn with star patterns"),
];

pub fn candidates(tag: EmotionTag) -> &'static [Creature] {
    match tag {
        EmotionTag::Melancholy => &MELANCHOLY,
        EmotionTag::Rage => &RAGE,
        EmotionTag::Tranquility => &TRANQUILITY,
        EmotionTag::Chaos => &CHAOS,
        EmotionTag::Custom => &CUSTOM,
    }
}

pub fn is_candidate(tag: EmotionTag, preview: &GeneratedPreview) -> bool {
    candidates(tag).iter().any(|candidate| {
        candidate.emoji == preview.creature_emoji && candidate.caption == preview.creature_caption
    })
}

#[derive(Clone)]
pub struct CreatureGenerator {
    random: Arc<dyn RandomSource>,
}

impl Default for CreatureGenerator {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRandom))
    }
}

impl CreatureGenerator {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    pub fn generate(&self, tag: EmotionTag) -> GeneratedPreview {
        let list = candidates(tag);
        let chosen = list[self.random.pick(list.len()).min(list.len() - 1)];
        GeneratedPreview {
            creature_emoji: chosen.emoji.to_string(),
            creature_caption: chosen.caption.to_string(),
        }
    }

    /// Like `generate`, for a raw tag string; unknown or missing tags use the CUSTOM list.
    pub fn generate_for(&self, tag: Option<&str>) -> GeneratedPreview {
        let tag = tag
            .and_then(|raw| raw.parse::<EmotionTag>().ok())
            .unwrap_or(EmotionTag::Custom);
        self.generate(tag)
    }
}
