pub mod atomic_file;
pub mod audio_asset;
pub mod constants;
