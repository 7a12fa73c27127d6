pub mod audio_file;
pub mod elevenlabs_transformer;
pub mod microphone_recorder;
pub mod provider_error;
