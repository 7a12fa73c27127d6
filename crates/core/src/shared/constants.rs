pub const API_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Header carrying the ElevenLabs credential on every request.
pub const API_KEY_HEADER: &str = "xi-api-key";

pub const STS_MODEL_ID: &str = "eleven_multilingual_sts_v2";

// Fixed voice settings sent with every speech-to-speech request. Style stays
// at zero so the speaker's own delivery is preserved.
pub const SIMILARITY_BOOST: &str = "0.75";
pub const STABILITY: &str = "0.5";
pub const STYLE: &str = "0.0";
pub const USE_SPEAKER_BOOST: &str = "true";
pub const REMOVE_BACKGROUND_NOISE: &str = "true";

/// Largest source clip accepted before any request is made (10 MiB).
pub const MAX_AUDIO_BYTES: u64 = 10 * 1024 * 1024;

/// Storage key for the persisted ElevenLabs API key.
pub const API_KEY_STORAGE_KEY: &str = "elevenlabs_api_key";

/// Storage key for the build identifier seen on the previous start.
pub const APP_VERSION_STORAGE_KEY: &str = "app_version";

pub const APP_DIR_NAME: &str = "VoiceFair";

pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "ogg", "webm", "flac", "aac"];

pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Microphone recordings stop on their own after this many seconds.
pub const MAX_RECORDING_SECS: u32 = 30;
