use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Element, Length, Subscription, Task};

use voicefair_core::accent::domain::accent_catalog::AccentOption;
use voicefair_core::audio::domain::transform_error::TransformError;
use voicefair_core::audio::domain::voice_transformer::VoiceTransformer;
use voicefair_core::audio::infrastructure::audio_file::{
    audio_cache_dir, load_source_audio, write_audio_file, CachedAudioFile,
};
use voicefair_core::audio::infrastructure::elevenlabs_transformer::{
    validate_audio, ElevenLabsTransformer,
};
use voicefair_core::session::blind_test::{BlindTest, Slot};
use voicefair_core::session::transform_session::{Completion, TransformSession};
use voicefair_core::shared::audio_asset::AudioAsset;
use voicefair_core::shared::constants::AUDIO_EXTENSIONS;
use voicefair_core::startup::build_version::startup_check;
use voicefair_core::storage::domain::credentials::{clear_api_key, load_api_key, save_api_key};
use voicefair_core::storage::domain::key_value_store::KeyValueStore;
use voicefair_core::storage::infrastructure::json_file_store::JsonFileStore;
use voicefair_core::storage::infrastructure::memory_store::MemoryStore;

use crate::tabs;
use crate::workers::key_check_worker::{self, KeyCheck};
use crate::workers::recording_worker;
use crate::workers::transform_worker::{self, TransformOutcome};

const PROVIDER_URL: &str = "https://elevenlabs.io/";

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Transform,
    BlindTest,
    Settings,
    About,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Transform, Tab::BlindTest, Tab::Settings, Tab::About];

    fn label(self) -> &'static str {
        match self {
            Tab::Transform => "Transform",
            Tab::BlindTest => "Blind Test",
            Tab::Settings => "Settings",
            Tab::About => "About",
        }
    }
}

/// What the settings tab knows about the API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Missing,
    Stored,
    Checking,
    Valid,
    Rejected,
}

impl KeyStatus {
    pub fn describe(&self) -> &'static str {
        match self {
            KeyStatus::Missing => "No API key saved.",
            KeyStatus::Stored => "An API key is saved.",
            KeyStatus::Checking => "Checking key with ElevenLabs\u{2026}",
            KeyStatus::Valid => "API key verified and saved.",
            KeyStatus::Rejected => "ElevenLabs rejected this key. It was not saved.",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    OpenProviderSite,
    SelectInput,
    InputSelected(Option<PathBuf>),
    StartRecording,
    StopRecording,
    AccentSelected(AccentOption),
    RunTransform,
    DismissError,
    OpenSettings,
    PlayOriginal,
    PlayTransformed,
    SaveTransformed,
    SaveTargetSelected(Option<PathBuf>),
    StartBlindTest,
    PlayBlind(Slot),
    BlindChoice(Slot),
    SubmitBlindChoice,
    ResetBlindTest,
    ApiKeyChanged(String),
    SaveApiKey,
    ClearApiKey,
    PollWorkers,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// A microphone capture in progress.
struct ActiveRecording {
    rx: Receiver<Result<AudioAsset, String>>,
    stop: Arc<AtomicBool>,
    started: Instant,
}

pub struct App {
    active_tab: Tab,
    store: Arc<dyn KeyValueStore>,
    transformer: Arc<ElevenLabsTransformer>,
    session: TransformSession,
    input_path: Option<PathBuf>,
    recording: Option<ActiveRecording>,
    transform_rx: Option<Receiver<TransformOutcome>>,
    original_file: Option<CachedAudioFile>,
    transformed_file: Option<CachedAudioFile>,
    blind: Option<BlindTest>,
    blind_choice: Option<Slot>,
    blind_files: HashMap<Slot, CachedAudioFile>,
    api_key_input: String,
    key_status: KeyStatus,
    key_rx: Option<Receiver<KeyCheck>>,
    notice: Option<String>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let mut notice = None;
        let store: Arc<dyn KeyValueStore> = match JsonFileStore::open_default() {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::error!("Falling back to in-memory settings: {e}");
                notice = Some(format!("Settings will not be saved: {e}"));
                Arc::new(MemoryStore::new())
            }
        };
        if let Err(e) = startup_check(store.as_ref()) {
            log::warn!("Startup check failed: {e}");
        }

        let key_status = if load_api_key(store.as_ref()).is_some() {
            KeyStatus::Stored
        } else {
            KeyStatus::Missing
        };

        (
            Self {
                active_tab: Tab::Transform,
                transformer: Arc::new(ElevenLabsTransformer::new(store.clone())),
                store,
                session: TransformSession::new(),
                input_path: None,
                recording: None,
                transform_rx: None,
                original_file: None,
                transformed_file: None,
                blind: None,
                blind_choice: None,
                blind_files: HashMap::new(),
                api_key_input: String::new(),
                key_status,
                key_rx: None,
                notice,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::OpenProviderSite => open_external(PROVIDER_URL),
            Message::SelectInput => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select audio file")
                            .add_filter("Audio Files", AUDIO_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::InputSelected,
                );
            }
            Message::InputSelected(Some(path)) => match load_source_audio(&path) {
                Ok(audio) => {
                    self.load_audio(audio);
                    self.input_path = Some(path);
                    self.notice = None;
                }
                Err(e) => self.notice = Some(e.to_string()),
            },
            Message::InputSelected(None) => {}
            Message::StartRecording => {
                if self.recording.is_none() {
                    let (rx, stop) = recording_worker::spawn();
                    self.recording = Some(ActiveRecording {
                        rx,
                        stop,
                        started: Instant::now(),
                    });
                }
            }
            Message::StopRecording => {
                if let Some(recording) = &self.recording {
                    recording.stop.store(true, Ordering::Relaxed);
                }
            }
            Message::AccentSelected(accent) => {
                self.session.select_accent(accent);
                self.refresh_result_views();
            }
            Message::RunTransform => self.start_transform(),
            Message::DismissError => {
                self.session.clear_error();
                self.notice = None;
            }
            Message::OpenSettings => {
                self.session.clear_error();
                self.active_tab = Tab::Settings;
            }
            Message::PlayOriginal => self.play_original(),
            Message::PlayTransformed => self.play_transformed(),
            Message::SaveTransformed => {
                let Some(audio) = self.session.transformed() else {
                    return Task::none();
                };
                let start_dir = self
                    .input_path
                    .as_ref()
                    .and_then(|p| p.parent().map(Path::to_path_buf));
                let name = audio.name().to_string();
                return Task::perform(
                    async move {
                        let mut dialog = rfd::AsyncFileDialog::new()
                            .set_title("Save transformed audio")
                            .set_file_name(name);
                        if let Some(dir) = start_dir {
                            dialog = dialog.set_directory(dir);
                        }
                        dialog.save_file().await.map(|h| h.path().to_path_buf())
                    },
                    Message::SaveTargetSelected,
                );
            }
            Message::SaveTargetSelected(Some(path)) => {
                if let Some(audio) = self.session.transformed() {
                    match write_audio_file(&path, audio) {
                        Ok(()) => log::info!("Saved transformed audio to {}", path.display()),
                        Err(e) => self.notice = Some(e.to_string()),
                    }
                }
            }
            Message::SaveTargetSelected(None) => {}
            Message::StartBlindTest => {
                if let Some(comparison) = self.session.comparison() {
                    self.blind = Some(BlindTest::new(
                        comparison.left().clone(),
                        comparison.right().clone(),
                        *comparison.accent(),
                        &mut rand::thread_rng(),
                    ));
                    self.blind_choice = None;
                    self.blind_files.clear();
                    self.active_tab = Tab::BlindTest;
                }
            }
            Message::PlayBlind(slot) => self.play_blind(slot),
            Message::BlindChoice(slot) => {
                if self.blind.as_ref().is_some_and(|b| !b.is_answered()) {
                    self.blind_choice = Some(slot);
                }
            }
            Message::SubmitBlindChoice => {
                if let (Some(test), Some(choice)) = (self.blind.as_mut(), self.blind_choice) {
                    if let Err(e) = test.submit(choice) {
                        log::debug!("{e}");
                    }
                }
            }
            Message::ResetBlindTest => {
                if let Some(test) = self.blind.as_mut() {
                    test.reset(&mut rand::thread_rng());
                    self.blind_choice = None;
                    self.blind_files.clear();
                }
            }
            Message::ApiKeyChanged(value) => {
                self.api_key_input = value;
            }
            Message::SaveApiKey => {
                let key = self.api_key_input.trim().to_string();
                if !key.is_empty() && self.key_rx.is_none() {
                    self.key_status = KeyStatus::Checking;
                    self.key_rx = Some(key_check_worker::spawn(self.transformer.clone(), key));
                }
            }
            Message::ClearApiKey => {
                match clear_api_key(self.store.as_ref()) {
                    Ok(()) => self.key_status = KeyStatus::Missing,
                    Err(e) => self.notice = Some(e.to_string()),
                }
                self.api_key_input.clear();
            }
            Message::PollWorkers => {
                self.poll_recording();
                self.poll_transform();
                self.poll_key_check();
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let btn = button(text(tab.label()).size(13))
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let content: Element<'_, Message> = match self.active_tab {
            Tab::Transform => tabs::transform_tab::view(
                &self.session,
                self.input_path.as_deref(),
                self.recording.as_ref().map(|r| r.started.elapsed()),
            ),
            Tab::BlindTest => tabs::blind_test_tab::view(self.blind.as_ref(), self.blind_choice),
            Tab::Settings => tabs::settings_tab::view(&self.api_key_input, &self.key_status),
            Tab::About => tabs::about_tab::view(),
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        let mut layout = column![tab_bar].spacing(0).height(Length::Fill);
        if let Some(notice) = &self.notice {
            layout = layout.push(
                container(
                    row![
                        text(notice.clone()).size(12).width(Length::Fill),
                        button(text("Dismiss").size(12))
                            .on_press(Message::DismissError)
                            .style(button::text),
                    ]
                    .align_y(iced::Alignment::Center),
                )
                .padding([4, 16]),
            );
        }
        layout.push(tab_content).into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.recording.is_some() || self.transform_rx.is_some() || self.key_rx.is_some() {
            iced::time::every(Duration::from_millis(100)).map(|_| Message::PollWorkers)
        } else {
            Subscription::none()
        }
    }

    fn load_audio(&mut self, audio: AudioAsset) {
        self.original_file = None;
        self.session.load_audio(audio);
        self.refresh_result_views();
    }

    fn poll_recording(&mut self) {
        let Some(recording) = &self.recording else {
            return;
        };
        let result = match recording.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err("recording stopped unexpectedly".to_string()),
        };
        self.recording = None;

        match result.and_then(|audio| {
            validate_audio(&audio).map_err(|e| e.to_string())?;
            Ok(audio)
        }) {
            Ok(audio) => {
                self.load_audio(audio);
                self.input_path = None;
                self.notice = None;
            }
            Err(e) => self.notice = Some(e),
        }
    }

    /// Drops views of a result the session no longer holds.
    fn refresh_result_views(&mut self) {
        if self.session.transformed().is_none() {
            self.transformed_file = None;
            self.blind = None;
            self.blind_choice = None;
            self.blind_files.clear();
        }
    }

    fn start_transform(&mut self) {
        match self.session.begin_transform() {
            Ok(ticket) => {
                self.refresh_result_views();
                let transformer: Arc<dyn VoiceTransformer> = self.transformer.clone();
                self.transform_rx = Some(transform_worker::spawn(transformer, ticket));
            }
            Err(e) => log::debug!("Transform not started: {e}"),
        }
    }

    fn poll_transform(&mut self) {
        let Some(rx) = &self.transform_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(outcome) => {
                self.transform_rx = None;
                if self.session.complete(outcome.token, outcome.result) == Completion::Stale {
                    log::info!("Transformation finished for a replaced selection");
                }
                self.refresh_result_views();
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.transform_rx = None;
                if let Some(token) = self.session.in_flight() {
                    self.session.complete(
                        token,
                        Err(TransformError::UnknownFailure(
                            "transformation worker stopped unexpectedly".into(),
                        )),
                    );
                }
            }
        }
    }

    fn poll_key_check(&mut self) {
        let Some(rx) = &self.key_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(check) => {
                self.key_rx = None;
                self.key_status = if check.valid {
                    match save_api_key(self.store.as_ref(), &check.key) {
                        Ok(()) => {
                            self.api_key_input.clear();
                            KeyStatus::Valid
                        }
                        Err(e) => {
                            self.notice = Some(e.to_string());
                            KeyStatus::Missing
                        }
                    }
                } else {
                    KeyStatus::Rejected
                };
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.key_rx = None;
                self.key_status = KeyStatus::Rejected;
            }
        }
    }

    fn play_original(&mut self) {
        if self.original_file.is_none() {
            let Some(audio) = self.session.original() else {
                return;
            };
            match audio_cache_dir().and_then(|dir| CachedAudioFile::create(&dir, audio)) {
                Ok(file) => self.original_file = Some(file),
                Err(e) => {
                    self.notice = Some(e.to_string());
                    return;
                }
            }
        }
        if let Some(file) = &self.original_file {
            open_external(file.path());
        }
    }

    fn play_transformed(&mut self) {
        if self.transformed_file.is_none() {
            let Some(audio) = self.session.transformed() else {
                return;
            };
            match audio_cache_dir().and_then(|dir| CachedAudioFile::create(&dir, audio)) {
                Ok(file) => self.transformed_file = Some(file),
                Err(e) => {
                    self.notice = Some(e.to_string());
                    return;
                }
            }
        }
        if let Some(file) = &self.transformed_file {
            open_external(file.path());
        }
    }

    fn play_blind(&mut self, slot: Slot) {
        let Some(test) = &self.blind else {
            return;
        };
        if !self.blind_files.contains_key(&slot) {
            let audio = test.audio(slot);
            let created = audio_cache_dir().and_then(|dir| {
                CachedAudioFile::create_named(&dir.join("blind"), &slot.file_name(audio), audio)
            });
            match created {
                Ok(file) => {
                    self.blind_files.insert(slot, file);
                }
                Err(e) => {
                    self.notice = Some(e.to_string());
                    return;
                }
            }
        }
        if let Some(file) = self.blind_files.get(&slot) {
            open_external(file.path());
        }
    }
}

fn open_external(target: impl AsRef<std::ffi::OsStr>) {
    if let Err(e) = open::that(target.as_ref()) {
        log::warn!("Could not open {:?}: {e}", target.as_ref());
    }
}
