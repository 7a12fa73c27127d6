use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use voicefair_core::audio::infrastructure::elevenlabs_transformer::ElevenLabsTransformer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCheck {
    pub key: String,
    pub valid: bool,
}

/// Check `key` against the provider on a background thread.
pub fn spawn(transformer: Arc<ElevenLabsTransformer>, key: String) -> Receiver<KeyCheck> {
    let (tx, rx) = crossbeam_channel::bounded(1);

    thread::spawn(move || {
        let valid = transformer.validate_key(&key);
        log::info!("API key check finished: valid={valid}");
        let _ = tx.send(KeyCheck { key, valid });
    });

    rx
}
