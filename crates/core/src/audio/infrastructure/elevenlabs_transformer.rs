use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use super::provider_error::error_detail;
use crate::accent::domain::accent_catalog::{resolve_voice_id, AccentOption};
use crate::audio::domain::transform_error::TransformError;
use crate::audio::domain::voice_transformer::VoiceTransformer;
use crate::shared::audio_asset::{transformed_name, AudioAsset};
use crate::shared::constants::{
    API_BASE_URL, API_KEY_HEADER, MAX_AUDIO_BYTES, REMOVE_BACKGROUND_NOISE, SIMILARITY_BOOST,
    STABILITY, STS_MODEL_ID, STYLE, USE_SPEAKER_BOOST,
};
use crate::storage::domain::credentials::load_api_key;
use crate::storage::domain::key_value_store::KeyValueStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A voice as listed by the provider's `/voices` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderVoice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub labels: std::collections::HashMap<String, String>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<ProviderVoice>,
}

/// ElevenLabs speech-to-speech adapter.
///
/// Reads the API key from the shared store before every call, so a key saved
/// in settings takes effect without rebuilding the adapter.
pub struct ElevenLabsTransformer {
    client: Client,
    base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl ElevenLabsTransformer {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_base_url(store, API_BASE_URL)
    }

    pub fn with_base_url(store: Arc<dyn KeyValueStore>, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {e}");
                Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks a key against `GET /user`. Only HTTP 200 counts as valid;
    /// network failures report the key as invalid.
    pub fn validate_key(&self, key: &str) -> bool {
        let url = format!("{}/user", self.base_url);
        match self.client.get(&url).header(API_KEY_HEADER, key).send() {
            Ok(response) => {
                log::debug!("Key check answered {}", response.status());
                response.status() == StatusCode::OK
            }
            Err(e) => {
                log::warn!("Key check failed: {e}");
                false
            }
        }
    }

    /// Lists the voices available to the stored key.
    pub fn list_voices(&self) -> Result<Vec<ProviderVoice>, TransformError> {
        let key = load_api_key(self.store.as_ref()).ok_or(TransformError::MissingCredential)?;
        let url = format!("{}/voices", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, key)
            .send()
            .map_err(|e| TransformError::UnknownFailure(e.to_string()))?;
        let response = check_status(response)?;
        let body: VoicesResponse = response
            .json()
            .map_err(|e| TransformError::UnknownFailure(format!("unreadable voice list: {e}")))?;
        Ok(body.voices)
    }

    fn build_form(&self, audio: &AudioAsset) -> Result<Form, TransformError> {
        let part = Part::bytes(audio.data().to_vec())
            .file_name(audio.name().to_string())
            .mime_str(audio.mime_type())
            .map_err(|e| TransformError::InvalidAudio(format!("bad MIME type: {e}")))?;

        Ok(Form::new()
            .part("audio", part)
            .text("model_id", STS_MODEL_ID)
            .text("similarity_boost", SIMILARITY_BOOST)
            .text("stability", STABILITY)
            .text("style", STYLE)
            .text("use_speaker_boost", USE_SPEAKER_BOOST)
            .text("remove_background_noise", REMOVE_BACKGROUND_NOISE))
    }
}

impl VoiceTransformer for ElevenLabsTransformer {
    fn transform(
        &self,
        audio: &AudioAsset,
        accent: &AccentOption,
    ) -> Result<AudioAsset, TransformError> {
        let key = load_api_key(self.store.as_ref()).ok_or(TransformError::MissingCredential)?;
        validate_audio(audio)?;

        let voice_id = resolve_voice_id(accent.id);
        let url = format!("{}/speech-to-speech/{voice_id}", self.base_url);
        log::info!(
            "Transforming '{}' ({} bytes) to {} with voice {voice_id}",
            audio.name(),
            audio.size_bytes(),
            accent.id
        );

        let form = self.build_form(audio)?;
        let response = self
            .client
            .post(&url)
            .query(&[("cache_bust", cache_bust())])
            .header(API_KEY_HEADER, key)
            .multipart(form)
            .send()
            .map_err(|e| TransformError::UnknownFailure(e.to_string()))?;

        let response = check_status(response)?;
        let bytes = response
            .bytes()
            .map_err(|e| TransformError::UnknownFailure(format!("unreadable response: {e}")))?;
        log::info!("Received {} bytes of transformed audio", bytes.len());

        Ok(AudioAsset::new(
            transformed_name(audio.name(), accent.id),
            audio.mime_type(),
            bytes.to_vec(),
        )
        .with_provider_voice_id(voice_id))
    }
}

/// Rejects empty or oversized clips before any request is made.
pub fn validate_audio(audio: &AudioAsset) -> Result<(), TransformError> {
    if audio.is_empty() {
        return Err(TransformError::InvalidAudio(format!(
            "'{}' contains no audio data",
            audio.name()
        )));
    }
    if audio.size_bytes() > MAX_AUDIO_BYTES {
        return Err(TransformError::InvalidAudio(format!(
            "'{}' is {} bytes; the limit is {} MiB",
            audio.name(),
            audio.size_bytes(),
            MAX_AUDIO_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

fn check_status(response: Response) -> Result<Response, TransformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let detail = error_detail(&body);
    log::error!("ElevenLabs answered {status}: {detail}");
    Err(TransformError::from_status(status.as_u16(), detail))
}

fn cache_bust() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}
