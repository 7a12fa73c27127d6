use thiserror::Error;

use super::comparison::Comparison;
use crate::accent::domain::accent_catalog::AccentOption;
use crate::audio::domain::transform_error::TransformError;
use crate::audio::domain::voice_transformer::VoiceTransformer;
use crate::shared::audio_asset::AudioAsset;

/// Observable state of a session, derived from what it currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No audio loaded.
    Idle,
    /// Audio loaded, no accent chosen.
    Ready,
    /// Audio and accent present, nothing running.
    ArmedForTransform,
    /// One request is in flight.
    Processing,
    /// A transformed clip for the current selection is available.
    Complete,
    /// The last attempt failed; inputs are kept so the user can retry.
    Failed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no audio loaded")]
    NoAudio,
    #[error("no accent selected")]
    NoAccent,
    #[error("a transformation is already in progress")]
    AlreadyProcessing,
}

/// Identifies one submitted request and the selection it was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    request: u64,
    generation: u64,
}

/// Everything a worker needs to run one transformation.
#[derive(Debug, Clone)]
pub struct TransformTicket {
    pub token: RequestToken,
    pub audio: AudioAsset,
    pub accent: AccentOption,
}

/// What happened to a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The selection changed while the request was running; result dropped.
    Stale,
    /// The token does not belong to the request in flight.
    Unknown,
}

/// Upload -> select -> transform -> compare flow for one user.
///
/// At most one request is in flight. Every change of audio or accent bumps a
/// generation counter; a result is only attached if its ticket was issued
/// under the current generation, so a late answer for a replaced clip is
/// discarded instead of being shown as the new clip's result.
#[derive(Debug, Default)]
pub struct TransformSession {
    original: Option<AudioAsset>,
    accent: Option<AccentOption>,
    transformed: Option<AudioAsset>,
    error: Option<TransformError>,
    in_flight: Option<RequestToken>,
    generation: u64,
    next_request: u64,
}

impl TransformSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.is_some() {
            SessionState::Processing
        } else if self.original.is_none() {
            SessionState::Idle
        } else if self.transformed.is_some() {
            SessionState::Complete
        } else if self.error.is_some() {
            SessionState::Failed
        } else if self.accent.is_some() {
            SessionState::ArmedForTransform
        } else {
            SessionState::Ready
        }
    }

    pub fn original(&self) -> Option<&AudioAsset> {
        self.original.as_ref()
    }

    pub fn accent(&self) -> Option<&AccentOption> {
        self.accent.as_ref()
    }

    pub fn transformed(&self) -> Option<&AudioAsset> {
        self.transformed.as_ref()
    }

    pub fn last_error(&self) -> Option<&TransformError> {
        self.error.as_ref()
    }

    /// Token of the request currently outstanding, if any.
    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replaces the source clip. Any previous result and error are cleared.
    pub fn load_audio(&mut self, audio: AudioAsset) {
        log::info!("Loaded '{}' ({} bytes)", audio.name(), audio.size_bytes());
        self.original = Some(audio);
        self.invalidate_result();
    }

    /// Chooses the target accent. Picking a different accent drops a result
    /// produced for the previous one; re-picking the same accent is a no-op.
    pub fn select_accent(&mut self, accent: AccentOption) {
        if self.accent.as_ref() == Some(&accent) {
            return;
        }
        log::debug!("Selected accent {}", accent.id);
        self.accent = Some(accent);
        self.invalidate_result();
    }

    /// Drops the error of a failed attempt, returning to `ArmedForTransform`.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Whether the transform trigger should be enabled.
    pub fn can_transform(&self) -> bool {
        self.original.is_some() && self.accent.is_some() && self.in_flight.is_none()
    }

    /// Starts a request for the current selection and enters `Processing`.
    pub fn begin_transform(&mut self) -> Result<TransformTicket, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::AlreadyProcessing);
        }
        let audio = self.original.clone().ok_or(SessionError::NoAudio)?;
        let accent = self.accent.ok_or(SessionError::NoAccent)?;

        self.next_request += 1;
        let token = RequestToken {
            request: self.next_request,
            generation: self.generation,
        };
        self.in_flight = Some(token);
        self.error = None;
        self.transformed = None;

        Ok(TransformTicket {
            token,
            audio,
            accent,
        })
    }

    /// Records the outcome of the request identified by `token`.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<AudioAsset, TransformError>,
    ) -> Completion {
        if self.in_flight != Some(token) {
            log::warn!("Ignoring result for unknown request {}", token.request);
            return Completion::Unknown;
        }
        self.in_flight = None;

        if token.generation != self.generation {
            log::info!("Discarding result for superseded selection");
            return Completion::Stale;
        }

        match result {
            Ok(audio) => {
                log::info!("Transformation complete: '{}'", audio.name());
                self.transformed = Some(audio);
                self.error = None;
            }
            Err(e) => {
                log::warn!("Transformation failed: {e}");
                self.error = Some(e);
            }
        }
        Completion::Applied
    }

    /// Runs one transformation synchronously on the calling thread.
    pub fn run_transform(
        &mut self,
        transformer: &dyn VoiceTransformer,
    ) -> Result<Completion, SessionError> {
        let ticket = self.begin_transform()?;
        let result = transformer.transform(&ticket.audio, &ticket.accent);
        Ok(self.complete(ticket.token, result))
    }

    /// Side-by-side view of the original and its transformation, if any.
    pub fn comparison(&self) -> Option<Comparison> {
        match (&self.original, &self.transformed, &self.accent) {
            (Some(original), Some(transformed), Some(accent)) => Some(Comparison::new(
                original.clone(),
                transformed.clone(),
                *accent,
            )),
            _ => None,
        }
    }

    fn invalidate_result(&mut self) {
        self.generation += 1;
        self.transformed = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accent::domain::accent_catalog::find_accent;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubTransformer {
        result: Result<Vec<u8>, TransformError>,
        calls: AtomicUsize,
    }

    impl StubTransformer {
        fn ok(bytes: Vec<u8>) -> Self {
            Self {
                result: Ok(bytes),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(err: TransformError) -> Self {
            Self {
                result: Err(err),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl VoiceTransformer for StubTransformer {
        fn transform(
            &self,
            audio: &AudioAsset,
            accent: &AccentOption,
        ) -> Result<AudioAsset, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map(|bytes| {
                AudioAsset::new(format!("{}_{}", audio.name(), accent.id), "audio/wav", bytes)
            })
        }
    }

    fn clip(name: &str) -> AudioAsset {
        AudioAsset::new(name, "audio/wav", vec![0; 64])
    }

    fn accent(id: &str) -> AccentOption {
        *find_accent(id).unwrap()
    }

    fn armed() -> TransformSession {
        let mut session = TransformSession::new();
        session.load_audio(clip("a.wav"));
        session.select_accent(accent("british"));
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = TransformSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.can_transform());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut session = TransformSession::new();
        session.load_audio(clip("a.wav"));
        assert_eq!(session.state(), SessionState::Ready);

        session.select_accent(accent("irish"));
        assert_eq!(session.state(), SessionState::ArmedForTransform);

        let ticket = session.begin_transform().unwrap();
        assert_eq!(session.state(), SessionState::Processing);

        let result = Ok(clip("a_irish.wav"));
        assert_eq!(session.complete(ticket.token, result), Completion::Applied);
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.transformed().unwrap().name(), "a_irish.wav");
    }

    #[test]
    fn test_accent_before_audio_arms_on_upload() {
        let mut session = TransformSession::new();
        session.select_accent(accent("german"));
        assert_eq!(session.state(), SessionState::Idle);
        session.load_audio(clip("a.wav"));
        assert_eq!(session.state(), SessionState::ArmedForTransform);
    }

    #[rstest]
    #[case::after_success(true)]
    #[case::after_failure(false)]
    fn test_upload_clears_result_and_error(#[case] succeed: bool) {
        let mut session = armed();
        let ticket = session.begin_transform().unwrap();
        let result = if succeed {
            Ok(clip("out.wav"))
        } else {
            Err(TransformError::from_status(500, "boom".into()))
        };
        session.complete(ticket.token, result);

        session.load_audio(clip("b.wav"));
        assert!(session.transformed().is_none());
        assert!(session.last_error().is_none());
        assert_eq!(session.state(), SessionState::ArmedForTransform);
    }

    #[test]
    fn test_trigger_disabled_without_audio_accent_or_while_processing() {
        let mut session = TransformSession::new();
        assert!(!session.can_transform());

        session.load_audio(clip("a.wav"));
        assert!(!session.can_transform());

        session.select_accent(accent("french"));
        assert!(session.can_transform());

        let _ticket = session.begin_transform().unwrap();
        assert!(!session.can_transform());
        assert_eq!(
            session.begin_transform().unwrap_err(),
            SessionError::AlreadyProcessing
        );
    }

    #[test]
    fn test_begin_without_inputs_errors() {
        let mut session = TransformSession::new();
        assert_eq!(session.begin_transform().unwrap_err(), SessionError::NoAudio);
        session.load_audio(clip("a.wav"));
        assert_eq!(session.begin_transform().unwrap_err(), SessionError::NoAccent);
    }

    #[test]
    fn test_failure_keeps_inputs_and_allows_retry() {
        let mut session = armed();
        let ticket = session.begin_transform().unwrap();
        session.complete(ticket.token, Err(TransformError::MissingCredential));

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.original().unwrap().name(), "a.wav");
        assert_eq!(session.accent().unwrap().id, "british");
        assert!(session.can_transform());

        session.clear_error();
        assert_eq!(session.state(), SessionState::ArmedForTransform);
    }

    #[test]
    fn test_late_result_for_replaced_audio_is_discarded() {
        let mut session = armed();
        let ticket = session.begin_transform().unwrap();

        session.load_audio(clip("new.wav"));
        // Still one request outstanding: the trigger stays disabled.
        assert_eq!(session.state(), SessionState::Processing);
        assert!(!session.can_transform());

        let outcome = session.complete(ticket.token, Ok(clip("a_british.wav")));
        assert_eq!(outcome, Completion::Stale);
        assert!(session.transformed().is_none());
        assert_eq!(session.state(), SessionState::ArmedForTransform);
    }

    #[test]
    fn test_late_result_for_changed_accent_is_discarded() {
        let mut session = armed();
        let ticket = session.begin_transform().unwrap();
        session.select_accent(accent("spanish"));

        let outcome = session.complete(ticket.token, Ok(clip("a_british.wav")));
        assert_eq!(outcome, Completion::Stale);
        assert!(session.transformed().is_none());
    }

    #[test]
    fn test_reselecting_same_accent_keeps_result() {
        let mut session = armed();
        session.run_transform(&StubTransformer::ok(vec![1; 8])).unwrap();
        session.select_accent(accent("british"));
        assert_eq!(session.state(), SessionState::Complete);
    }

    #[test]
    fn test_unknown_token_is_ignored() {
        let mut session = armed();
        let first = session.begin_transform().unwrap();
        session.complete(first.token, Ok(clip("x.wav")));

        let outcome = session.complete(first.token, Ok(clip("y.wav")));
        assert_eq!(outcome, Completion::Unknown);
        assert_eq!(session.transformed().unwrap().name(), "x.wav");
    }

    #[test]
    fn test_run_transform_calls_transformer_once() {
        let mut session = armed();
        let stub = StubTransformer::ok(vec![9; 32]);
        let outcome = session.run_transform(&stub).unwrap();

        assert_eq!(outcome, Completion::Applied);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.transformed().unwrap().size_bytes(), 32);
    }

    #[test]
    fn test_run_transform_failure_moves_to_failed() {
        let mut session = armed();
        let stub = StubTransformer::failing(TransformError::UnknownFailure("offline".into()));
        session.run_transform(&stub).unwrap();
        assert_eq!(session.state(), SessionState::Failed);
        assert!(matches!(
            session.last_error(),
            Some(TransformError::UnknownFailure(_))
        ));
    }

    #[test]
    fn test_comparison_available_only_when_complete() {
        let mut session = armed();
        assert!(session.comparison().is_none());
        session.run_transform(&StubTransformer::ok(vec![1; 4])).unwrap();

        let comparison = session.comparison().unwrap();
        assert_eq!(comparison.left().name(), "a.wav");
        assert_eq!(comparison.right().name(), "a.wav_british");
    }
}
