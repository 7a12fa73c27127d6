use std::path::Path;
use std::sync::Arc;

use super::constants::DEFAULT_AUDIO_MIME;

/// An audio clip held in memory: the uploaded original or a transformed result.
///
/// The byte buffer is shared, so cloning an asset (e.g. into a blind test)
/// does not copy the audio. Assets are never mutated after creation; a new
/// upload or a new transformation produces a new asset.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioAsset {
    name: String,
    mime_type: String,
    data: Arc<[u8]>,
    provider_voice_id: Option<String>,
}

impl AudioAsset {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
            provider_voice_id: None,
        }
    }

    /// Builds an asset whose MIME type is inferred from the file name.
    pub fn from_named_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_type_for(Path::new(&name));
        Self::new(name, mime, data)
    }

    pub fn with_provider_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.provider_voice_id = Some(voice_id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn provider_voice_id(&self) -> Option<&str> {
        self.provider_voice_id.as_deref()
    }

    /// True when both assets point at the same byte buffer.
    pub fn same_buffer(&self, other: &AudioAsset) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Derives the transformed file name: `{stem}_{accent_id}.{ext}`.
///
/// Names without an extension get the suffix appended at the end.
pub fn transformed_name(original: &str, accent_id: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| original.to_string());
    match path.extension() {
        Some(ext) => format!("{stem}_{accent_id}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{accent_id}"),
    }
}

pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        _ => DEFAULT_AUDIO_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_size_matches_payload() {
        let asset = AudioAsset::new("a.wav", "audio/wav", vec![0u8; 2048]);
        assert_eq!(asset.size_bytes(), 2048);
        assert!(!asset.is_empty());
        assert!(asset.provider_voice_id().is_none());
    }

    #[test]
    fn test_clone_shares_buffer() {
        let asset = AudioAsset::new("a.wav", "audio/wav", vec![1, 2, 3]);
        let copy = asset.clone();
        assert!(asset.same_buffer(&copy));

        let other = AudioAsset::new("a.wav", "audio/wav", vec![1, 2, 3]);
        assert!(!asset.same_buffer(&other));
    }

    #[test]
    fn test_from_named_bytes_infers_mime() {
        let asset = AudioAsset::from_named_bytes("clip.WAV", vec![0]);
        assert_eq!(asset.mime_type(), "audio/wav");
    }

    #[rstest]
    #[case::simple("sample.wav", "british", "sample_british.wav")]
    #[case::mp3("voice.mp3", "irish", "voice_irish.mp3")]
    #[case::no_extension("recording", "german", "recording_german")]
    #[case::dotted_stem("my.take.wav", "french", "my.take_french.wav")]
    fn test_transformed_name(#[case] original: &str, #[case] accent: &str, #[case] expected: &str) {
        assert_eq!(transformed_name(original, accent), expected);
    }

    #[rstest]
    #[case("a.mp3", "audio/mpeg")]
    #[case("a.ogg", "audio/ogg")]
    #[case("a.webm", "audio/webm")]
    #[case("a.xyz", DEFAULT_AUDIO_MIME)]
    #[case("noext", DEFAULT_AUDIO_MIME)]
    fn test_mime_type_for(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(mime_type_for(Path::new(name)), expected);
    }
}
