use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use hound::{WavSpec, WavWriter};
use thiserror::Error;

use crate::shared::audio_asset::AudioAsset;
use crate::shared::constants::MAX_RECORDING_SECS;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("no microphone found")]
    NoInputDevice,
    #[error("microphone is not available: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("could not open the microphone: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("could not start recording: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("unsupported microphone sample format {0}")]
    UnsupportedFormat(SampleFormat),
    #[error("nothing was recorded")]
    Empty,
    #[error("failed to encode recording: {0}")]
    Encode(#[from] hound::Error),
}

/// Interleaved samples captured so far, capped at a fixed duration.
#[derive(Debug, Clone)]
pub struct RecordingBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
    capacity: usize,
}

impl RecordingBuffer {
    pub fn new(sample_rate: u32, channels: u16, max_secs: u32) -> Self {
        let capacity = sample_rate as usize * channels as usize * max_secs as usize;
        Self {
            sample_rate,
            channels,
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends samples up to the cap. Returns false once the buffer is full.
    pub fn push(&mut self, data: &[f32]) -> bool {
        let room = self.capacity - self.samples.len();
        self.samples.extend_from_slice(&data[..data.len().min(room)]);
        !self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() / self.channels.max(1) as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate.max(1) as f64)
    }

    /// Encodes the samples as 16-bit PCM WAV.
    pub fn to_wav(&self, name: &str) -> Result<AudioAsset, RecorderError> {
        if self.is_empty() {
            return Err(RecorderError::Empty);
        }
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in &self.samples {
            let sample = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32);
            writer.write_sample(sample as i16)?;
        }
        writer.finalize()?;

        Ok(AudioAsset::new(name, "audio/wav", cursor.into_inner()))
    }
}

/// File name for a new recording, e.g. `recording-1760700000.wav`.
pub fn recording_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("recording-{secs}.wav")
}

/// Records from the default input device until `stop` is set or
/// [`MAX_RECORDING_SECS`] have been captured. Blocks the calling thread.
pub fn record(stop: &AtomicBool) -> Result<AudioAsset, RecorderError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(RecorderError::NoInputDevice)?;
    let supported = device.default_input_config()?;
    let format = supported.sample_format();
    let config: StreamConfig = supported.into();
    log::info!(
        "Recording from {} at {} Hz, {} channel(s)",
        device.name().unwrap_or_else(|_| "default input".to_string()),
        config.sample_rate.0,
        config.channels
    );

    let buffer = Arc::new(Mutex::new(RecordingBuffer::new(
        config.sample_rate.0,
        config.channels,
        MAX_RECORDING_SECS,
    )));
    let full = Arc::new(AtomicBool::new(false));
    let on_error = |err: cpal::StreamError| log::error!("Microphone stream error: {err}");

    let stream = match format {
        SampleFormat::F32 => {
            let sink = Sink::new(&buffer, &full);
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| sink.push(data),
                on_error,
                None,
            )?
        }
        SampleFormat::I16 => {
            let sink = Sink::new(&buffer, &full);
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<f32> =
                        data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                    sink.push(&converted);
                },
                on_error,
                None,
            )?
        }
        SampleFormat::U16 => {
            let sink = Sink::new(&buffer, &full);
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<f32> = data
                        .iter()
                        .map(|&s| (s as f32 - 32768.0) / 32768.0)
                        .collect();
                    sink.push(&converted);
                },
                on_error,
                None,
            )?
        }
        other => return Err(RecorderError::UnsupportedFormat(other)),
    };

    stream.play()?;
    while !stop.load(Ordering::Relaxed) && !full.load(Ordering::Relaxed) {
        thread::sleep(POLL_INTERVAL);
    }
    drop(stream);

    let buffer = lock(&buffer);
    log::info!("Recorded {:.1}s", buffer.duration().as_secs_f32());
    buffer.to_wav(&recording_name())
}

/// Shared handle the stream callback writes into.
struct Sink {
    buffer: Arc<Mutex<RecordingBuffer>>,
    full: Arc<AtomicBool>,
}

impl Sink {
    fn new(buffer: &Arc<Mutex<RecordingBuffer>>, full: &Arc<AtomicBool>) -> Self {
        Self {
            buffer: buffer.clone(),
            full: full.clone(),
        }
    }

    fn push(&self, data: &[f32]) {
        if !lock(&self.buffer).push(data) {
            self.full.store(true, Ordering::Relaxed);
        }
    }
}

fn lock(buffer: &Mutex<RecordingBuffer>) -> MutexGuard<'_, RecordingBuffer> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
