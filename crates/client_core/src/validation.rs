use shared::{
    domain::{AudioBlobRef, Draft, MAX_AUDIO_BYTES, MAX_DESCRIPTION_CHARS},
    error::{DraftField, ValidationErrors},
};

const ACCEPTED_AUDIO_TYPES: [&str; 5] = [
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
];

pub fn is_accepted_audio_type(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_AUDIO_TYPES.contains(&essence.as_str())
}

pub fn validate_audio_file(audio: &AudioBlobRef) -> Result<(), ValidationErrors> {
    if !is_accepted_audio_type(&audio.mime_type) {
        return Err(ValidationErrors::single(
            DraftField::File,
            "Only MP3 or WAV files are allowed",
        ));
    }
    if audio.size_bytes > MAX_AUDIO_BYTES {
        return Err(ValidationErrors::single(
            DraftField::File,
            "File size should be less than 10MB",
        ));
    }
    Ok(())
}

/// Field-level checks run before a draft may be finalized. A file that is present
/// but rejected stops validation before the emotion and description checks.
pub fn validate_draft(draft: &Draft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    match &draft.audio {
        Some(audio) => validate_audio_file(audio)?,
        None => errors.insert(DraftField::File, "Please upload an audio file"),
    }

    if draft.emotion.is_none() {
        errors.insert(DraftField::Emotion, "Please select an emotion");
    }

    if draft.description.trim().is_empty() {
        errors.insert(DraftField::Description, "Please provide a description");
    } else if draft.description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.insert(
            DraftField::Description,
            "Description should be less than 280 characters",
        );
    }

    errors.into_result()
}
