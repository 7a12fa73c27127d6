use thiserror::Error;

/// Why a transformation did not produce audio.
///
/// Every failure is classified at the adapter boundary so the UI can show one
/// message and, for credential problems, point the user at settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("ElevenLabs API key not found. Please add your API key in the settings.")]
    MissingCredential,
    #[error("Invalid API key ({detail}). Please check your API key in the settings.")]
    InvalidCredential { detail: String },
    #[error("API quota exceeded ({detail}). Check your plan or the API key in the settings.")]
    QuotaExceeded { detail: String },
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),
    #[error("API error: {status} - {detail}")]
    ProviderError { status: u16, detail: String },
    #[error("Transformation failed: {0}")]
    UnknownFailure(String),
}

impl TransformError {
    /// Builds the error for a non-success HTTP status and its parsed detail.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            401 => TransformError::InvalidCredential { detail },
            402 => TransformError::QuotaExceeded { detail },
            _ => TransformError::ProviderError { status, detail },
        }
    }

    /// Credential-class errors carry a call to action pointing at settings.
    pub fn needs_settings(&self) -> bool {
        matches!(
            self,
            TransformError::MissingCredential
                | TransformError::InvalidCredential { .. }
                | TransformError::QuotaExceeded { .. }
        )
    }
}
