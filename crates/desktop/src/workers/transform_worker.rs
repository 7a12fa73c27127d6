use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use voicefair_core::audio::domain::transform_error::TransformError;
use voicefair_core::audio::domain::voice_transformer::VoiceTransformer;
use voicefair_core::session::transform_session::{RequestToken, TransformTicket};
use voicefair_core::shared::audio_asset::AudioAsset;

/// Result of one transformation, tagged with the request it answers.
#[derive(Debug)]
pub struct TransformOutcome {
    pub token: RequestToken,
    pub result: Result<AudioAsset, TransformError>,
}

/// Spawn a background transformation. The receiver yields exactly one outcome.
pub fn spawn(
    transformer: Arc<dyn VoiceTransformer>,
    ticket: TransformTicket,
) -> Receiver<TransformOutcome> {
    let (tx, rx) = crossbeam_channel::bounded(1);

    thread::spawn(move || {
        log::info!(
            "Transform worker: '{}' -> {}",
            ticket.audio.name(),
            ticket.accent.id
        );
        let result = transformer.transform(&ticket.audio, &ticket.accent);
        let _ = tx.send(TransformOutcome {
            token: ticket.token,
            result,
        });
    });

    rx
}
