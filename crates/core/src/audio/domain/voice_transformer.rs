use super::transform_error::TransformError;
use crate::accent::domain::accent_catalog::AccentOption;
use crate::shared::audio_asset::AudioAsset;

/// Domain interface for accent transformation of a recorded voice.
///
/// Implementations make exactly one attempt per call; retrying is left to
/// the caller. The returned asset is a new clip and never aliases the input.
pub trait VoiceTransformer: Send + Sync {
    fn transform(
        &self,
        audio: &AudioAsset,
        accent: &AccentOption,
    ) -> Result<AudioAsset, TransformError>;
}
