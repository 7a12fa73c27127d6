//! Core library for VoiceFair: accent catalog, the ElevenLabs
//! speech-to-speech adapter, the transform session state machine and the
//! blind-test presenter.

pub mod accent;
pub mod audio;
pub mod session;
pub mod shared;
pub mod startup;
pub mod storage;
