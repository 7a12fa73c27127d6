use crate::accent::domain::accent_catalog::AccentOption;
use crate::shared::audio_asset::AudioAsset;

/// Plain side-by-side comparison: original on the left, result on the right.
#[derive(Debug, Clone)]
pub struct Comparison {
    original: AudioAsset,
    transformed: AudioAsset,
    accent: AccentOption,
}

impl Comparison {
    pub fn new(original: AudioAsset, transformed: AudioAsset, accent: AccentOption) -> Self {
        Self {
            original,
            transformed,
            accent,
        }
    }

    pub fn left(&self) -> &AudioAsset {
        &self.original
    }

    pub fn right(&self) -> &AudioAsset {
        &self.transformed
    }

    pub fn accent(&self) -> &AccentOption {
        &self.accent
    }

    pub fn left_label(&self) -> &'static str {
        "Original"
    }

    pub fn right_label(&self) -> String {
        format!("Transformed ({})", self.accent.display_name)
    }
}
