use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use voicefair_core::audio::infrastructure::microphone_recorder;
use voicefair_core::shared::audio_asset::AudioAsset;

/// Start recording on a background thread. Set the returned flag to stop;
/// the recorder also stops by itself at the duration cap.
pub fn spawn() -> (Receiver<Result<AudioAsset, String>>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();

    thread::spawn(move || {
        let result = microphone_recorder::record(&stop_clone).map_err(|e| e.to_string());
        if let Err(e) = &result {
            log::warn!("Recording failed: {e}");
        }
        let _ = tx.send(result);
    });

    (rx, stop)
}
