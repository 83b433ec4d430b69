//! Session states, events and the transition function.
//!
//! [`SessionState::next`] is pure: it decides where an event leads without
//! doing any I/O. The driver in [`super::machine`] performs the network calls
//! and feeds their outcomes back in as events.

use crate::backend::types::{
    AnalysisResult, SeparationStatus, SheetMusicResult, TranscriptionMode, TranscriptionRequest,
};
use crate::input::{self, MediaInput, RawInput, ValidationError};
use crate::locale::Locale;
use std::fmt;
use thiserror::Error;

/// The user's answer when no covers were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceChoice {
    /// Transcribe the original video as-is.
    UseOriginal,
    /// Isolate the piano part first, then transcribe.
    SeparateThenTranscribe,
    /// Abandon this URL.
    Back,
}

impl fmt::Display for SourceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceChoice::UseOriginal => write!(f, "use original"),
            SourceChoice::SeparateThenTranscribe => write!(f, "separate then transcribe"),
            SourceChoice::Back => write!(f, "back"),
        }
    }
}

/// Pending decision for a URL whose analysis found no covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePrompt {
    pub url: String,
    pub analysis: AnalysisResult,
    pub separation: SeparationStatus,
}

impl SourcePrompt {
    /// Choices to present. Separation is absent unless the backend reported it available.
    pub fn choices(&self) -> Vec<SourceChoice> {
        let mut choices = vec![SourceChoice::UseOriginal];
        if self.separation.available {
            choices.push(SourceChoice::SeparateThenTranscribe);
        }
        choices.push(SourceChoice::Back);
        choices
    }

    pub fn offers(&self, choice: SourceChoice) -> bool {
        self.choices().contains(&choice)
    }
}

/// Why a session failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Validation(ValidationError),
    Analysis(String),
    Transcription(String),
    /// Reported by an external renderer after completion.
    Render(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Validation(e) => write!(f, "{e}"),
            FailureReason::Analysis(message)
            | FailureReason::Transcription(message)
            | FailureReason::Render(message) => write!(f, "{message}"),
        }
    }
}

/// The single mutable session value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Validating(RawInput),
    Analyzing { url: String },
    AwaitingSourceChoice(SourcePrompt),
    Transcribing(TranscriptionRequest),
    Complete(SheetMusicResult),
    Failed(FailureReason),
}

/// Everything that can happen to a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Submit(RawInput),
    Validate,
    Analyzed(AnalysisResult),
    AnalysisFailed(String),
    SeparationProbed(SeparationStatus),
    Choose(SourceChoice),
    Transcribed(SheetMusicResult),
    TranscriptionFailed(String),
    RenderFailed(String),
    Acknowledge,
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::Submit(_) => "submit",
            SessionEvent::Validate => "validate",
            SessionEvent::Analyzed(_) => "accept an analysis",
            SessionEvent::AnalysisFailed(_) => "fail an analysis",
            SessionEvent::SeparationProbed(_) => "record separation status",
            SessionEvent::Choose(SourceChoice::UseOriginal) => "use the original",
            SessionEvent::Choose(SourceChoice::SeparateThenTranscribe) => {
                "separate then transcribe"
            }
            SessionEvent::Choose(SourceChoice::Back) => "go back",
            SessionEvent::Transcribed(_) => "accept a transcription",
            SessionEvent::TranscriptionFailed(_) => "fail a transcription",
            SessionEvent::RenderFailed(_) => "report a render failure",
            SessionEvent::Acknowledge => "acknowledge",
            SessionEvent::Reset => "reset",
        }
    }
}

/// Payload-free view of a state, for display and notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Idle,
    Validating,
    Analyzing,
    AwaitingSourceChoice,
    Transcribing(TranscriptionMode),
    Complete,
    Failed,
}

impl SessionPhase {
    /// True for phases with a request outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionPhase::Analyzing | SessionPhase::Transcribing(_))
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Validating => write!(f, "validating"),
            SessionPhase::Analyzing => write!(f, "analyzing"),
            SessionPhase::AwaitingSourceChoice => write!(f, "awaiting a source choice"),
            SessionPhase::Transcribing(mode) => write!(f, "transcribing ({mode})"),
            SessionPhase::Complete => write!(f, "complete"),
            SessionPhase::Failed => write!(f, "failed"),
        }
    }
}

/// An event that the current state does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {event} while {phase}")]
pub struct InvalidTransition {
    pub phase: SessionPhase,
    pub event: &'static str,
}

/// A refused event, handing back the untouched state.
#[derive(Debug)]
pub struct Rejected {
    pub state: SessionState,
    pub reason: InvalidTransition,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Validating(_) => SessionPhase::Validating,
            SessionState::Analyzing { .. } => SessionPhase::Analyzing,
            SessionState::AwaitingSourceChoice(_) => SessionPhase::AwaitingSourceChoice,
            SessionState::Transcribing(request) => SessionPhase::Transcribing(request.mode()),
            SessionState::Complete(_) => SessionPhase::Complete,
            SessionState::Failed(_) => SessionPhase::Failed,
        }
    }

    /// Apply one event.
    ///
    /// Defined for every (state, event) pair: pairs without a transition are
    /// rejected and the original state is handed back unchanged.
    pub fn next(self, event: SessionEvent) -> Result<SessionState, Rejected> {
        match (self, event) {
            (SessionState::Idle, SessionEvent::Submit(raw)) => Ok(SessionState::Validating(raw)),

            (SessionState::Validating(raw), SessionEvent::Validate) => {
                Ok(match input::classify(raw) {
                    // Local files never go through analysis
                    Ok(MediaInput::LocalFile(file)) => {
                        SessionState::Transcribing(TranscriptionRequest::upload(file))
                    }
                    Ok(MediaInput::RemoteUrl(url)) => SessionState::Analyzing { url },
                    Err(e) => SessionState::Failed(FailureReason::Validation(e)),
                })
            }

            (SessionState::Analyzing { url }, SessionEvent::Analyzed(analysis)) => {
                // Any cover at all goes straight to ensemble, without asking
                Ok(match TranscriptionRequest::ensemble(&analysis) {
                    Some(request) => SessionState::Transcribing(request),
                    None => SessionState::AwaitingSourceChoice(SourcePrompt {
                        url,
                        analysis,
                        separation: SeparationStatus::unavailable(),
                    }),
                })
            }

            (SessionState::Analyzing { .. }, SessionEvent::AnalysisFailed(message)) => {
                Ok(SessionState::Failed(FailureReason::Analysis(message)))
            }

            (
                SessionState::AwaitingSourceChoice(prompt),
                SessionEvent::SeparationProbed(separation),
            ) => Ok(SessionState::AwaitingSourceChoice(SourcePrompt {
                separation,
                ..prompt
            })),

            (SessionState::AwaitingSourceChoice(prompt), SessionEvent::Choose(choice)) => {
                let hints = prompt.analysis.original().hints();
                match choice {
                    SourceChoice::UseOriginal => Ok(SessionState::Transcribing(
                        TranscriptionRequest::direct(&prompt.url, hints),
                    )),
                    SourceChoice::SeparateThenTranscribe if prompt.separation.available => Ok(
                        SessionState::Transcribing(TranscriptionRequest::separated(
                            &prompt.url,
                            hints,
                        )),
                    ),
                    SourceChoice::SeparateThenTranscribe => Err(Rejected {
                        reason: InvalidTransition {
                            phase: SessionPhase::AwaitingSourceChoice,
                            event: "separate then transcribe (separation unavailable)",
                        },
                        state: SessionState::AwaitingSourceChoice(prompt),
                    }),
                    // Discards the analysis
                    SourceChoice::Back => Ok(SessionState::Idle),
                }
            }

            (SessionState::Transcribing(_), SessionEvent::Transcribed(result)) => {
                if result.is_complete() {
                    Ok(SessionState::Complete(result))
                } else {
                    // The driver maps this to a localized message before it gets here
                    Ok(SessionState::Failed(FailureReason::Transcription(
                        Locale::default().generic_failure().to_string(),
                    )))
                }
            }

            (SessionState::Transcribing(_), SessionEvent::TranscriptionFailed(message)) => {
                Ok(SessionState::Failed(FailureReason::Transcription(message)))
            }

            (SessionState::Complete(_), SessionEvent::RenderFailed(message)) => {
                Ok(SessionState::Failed(FailureReason::Render(message)))
            }

            (SessionState::Failed(_), SessionEvent::Acknowledge) => Ok(SessionState::Idle),

            (SessionState::Complete(_), SessionEvent::Reset) => Ok(SessionState::Idle),

            (state, event) => Err(Rejected {
                reason: InvalidTransition {
                    phase: state.phase(),
                    event: event.name(),
                },
                state,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{CoverCandidate, VideoMetadata};

    const URL: &str = "https://www.youtube.com/watch?v=orig";

    fn metadata(id: &str) -> VideoMetadata {
        VideoMetadata {
            video_id: id.to_string(),
            title: format!("Title {id}"),
            channel: "Channel".to_string(),
            thumbnail_url: String::new(),
            duration_seconds: 180,
            song_title: Some("Tune".to_string()),
            artist: Some("Band".to_string()),
        }
    }

    fn analysis(cover_ids: &[&str]) -> AnalysisResult {
        AnalysisResult::new(
            metadata("orig"),
            cover_ids
                .iter()
                .map(|id| CoverCandidate {
                    metadata: metadata(id),
                    source_url: format!("https://www.youtube.com/watch?v={id}"),
                })
                .collect(),
        )
    }

    fn analyzing() -> SessionState {
        SessionState::Analyzing {
            url: URL.to_string(),
        }
    }

    fn awaiting(separation_available: bool) -> SessionState {
        let state = analyzing()
            .next(SessionEvent::Analyzed(analysis(&[])))
            .unwrap();
        let status = SeparationStatus {
            available: separation_available,
            model_name: "htdemucs".to_string(),
        };
        state.next(SessionEvent::SeparationProbed(status)).unwrap()
    }

    fn result() -> SheetMusicResult {
        SheetMusicResult::new("X:1\nK:C\nC", "X:1\nK:C\nCE", "X:1\nK:C\nCEG", "C major")
    }

    #[test]
    fn test_submit_moves_idle_to_validating() {
        let raw = RawInput::url(URL);
        let state = SessionState::Idle
            .next(SessionEvent::Submit(raw.clone()))
            .unwrap();
        assert_eq!(state, SessionState::Validating(raw));
    }

    #[test]
    fn test_valid_file_goes_straight_to_direct_transcription() {
        let raw = RawInput::file(vec![0u8; 3_000_000], Some("audio/mpeg"), "song.mp3");
        let state = SessionState::Validating(raw)
            .next(SessionEvent::Validate)
            .unwrap();
        assert_eq!(
            state.phase(),
            SessionPhase::Transcribing(TranscriptionMode::Direct)
        );
        assert!(matches!(
            state,
            SessionState::Transcribing(TranscriptionRequest::Upload(_))
        ));
    }

    #[test]
    fn test_url_goes_to_analyzing() {
        let state = SessionState::Validating(RawInput::url(&format!(" {URL} ")))
            .next(SessionEvent::Validate)
            .unwrap();
        assert_eq!(state, analyzing());
    }

    #[test]
    fn test_invalid_input_fails_validation() {
        let state = SessionState::Validating(RawInput::url("   "))
            .next(SessionEvent::Validate)
            .unwrap();
        assert_eq!(
            state,
            SessionState::Failed(FailureReason::Validation(ValidationError::EmptyUrl))
        );
    }

    #[test]
    fn test_any_cover_count_triggers_ensemble() {
        for ids in [vec!["a"], vec!["a", "b"], vec!["c", "a", "b", "d", "e"]] {
            let state = analyzing()
                .next(SessionEvent::Analyzed(analysis(&ids)))
                .unwrap();
            assert_eq!(
                state.phase(),
                SessionPhase::Transcribing(TranscriptionMode::EnsembleOfCovers),
                "{} cover(s) should go straight to ensemble",
                ids.len()
            );
            match state {
                SessionState::Transcribing(TranscriptionRequest::Ensemble { urls, hints }) => {
                    let expected: Vec<String> = ids
                        .iter()
                        .map(|id| format!("https://www.youtube.com/watch?v={id}"))
                        .collect();
                    assert_eq!(urls, expected);
                    assert_eq!(hints.song_title.as_deref(), Some("Tune"));
                }
                other => panic!("Expected ensemble request, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_no_covers_awaits_choice_without_separation() {
        let state = analyzing()
            .next(SessionEvent::Analyzed(analysis(&[])))
            .unwrap();
        match state {
            SessionState::AwaitingSourceChoice(prompt) => {
                assert_eq!(prompt.url, URL);
                assert!(!prompt.separation.available);
                assert_eq!(
                    prompt.choices(),
                    vec![SourceChoice::UseOriginal, SourceChoice::Back]
                );
            }
            other => panic!("Expected AwaitingSourceChoice, got {:?}", other),
        }
    }

    #[test]
    fn test_separation_offered_only_when_available() {
        match awaiting(true) {
            SessionState::AwaitingSourceChoice(prompt) => assert_eq!(
                prompt.choices(),
                vec![
                    SourceChoice::UseOriginal,
                    SourceChoice::SeparateThenTranscribe,
                    SourceChoice::Back
                ]
            ),
            other => panic!("Expected AwaitingSourceChoice, got {:?}", other),
        }
        match awaiting(false) {
            SessionState::AwaitingSourceChoice(prompt) => {
                assert!(!prompt.offers(SourceChoice::SeparateThenTranscribe))
            }
            other => panic!("Expected AwaitingSourceChoice, got {:?}", other),
        }
    }

    #[test]
    fn test_use_original_transcribes_submitted_url() {
        let state = awaiting(false)
            .next(SessionEvent::Choose(SourceChoice::UseOriginal))
            .unwrap();
        assert_eq!(
            state,
            SessionState::Transcribing(TranscriptionRequest::direct(
                URL,
                metadata("orig").hints()
            ))
        );
    }

    #[test]
    fn test_separate_when_available() {
        let state = awaiting(true)
            .next(SessionEvent::Choose(SourceChoice::SeparateThenTranscribe))
            .unwrap();
        assert_eq!(
            state.phase(),
            SessionPhase::Transcribing(TranscriptionMode::SourceSeparated)
        );
    }

    #[test]
    fn test_separate_when_unavailable_is_rejected_and_state_kept() {
        let before = awaiting(false);
        let rejected = before
            .clone()
            .next(SessionEvent::Choose(SourceChoice::SeparateThenTranscribe))
            .unwrap_err();
        assert_eq!(rejected.state, before);
        assert_eq!(rejected.reason.phase, SessionPhase::AwaitingSourceChoice);
    }

    #[test]
    fn test_back_discards_analysis() {
        let state = awaiting(true)
            .next(SessionEvent::Choose(SourceChoice::Back))
            .unwrap();
        assert_eq!(state, SessionState::Idle);
    }

    #[test]
    fn test_analysis_failure() {
        let state = analyzing()
            .next(SessionEvent::AnalysisFailed("video unavailable".to_string()))
            .unwrap();
        assert_eq!(
            state,
            SessionState::Failed(FailureReason::Analysis("video unavailable".to_string()))
        );
    }

    #[test]
    fn test_transcription_outcomes() {
        let transcribing =
            SessionState::Transcribing(TranscriptionRequest::direct(URL, Default::default()));

        let done = transcribing
            .clone()
            .next(SessionEvent::Transcribed(result()))
            .unwrap();
        assert_eq!(done, SessionState::Complete(result()));

        let failed = transcribing
            .next(SessionEvent::TranscriptionFailed("decode failed".to_string()))
            .unwrap();
        assert_eq!(failed.phase(), SessionPhase::Failed);
        match failed {
            SessionState::Failed(reason) => assert_eq!(reason.to_string(), "decode failed"),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_result_fails() {
        let transcribing =
            SessionState::Transcribing(TranscriptionRequest::direct(URL, Default::default()));
        let state = transcribing
            .next(SessionEvent::Transcribed(SheetMusicResult::new(
                "a", "b", "c", "",
            )))
            .unwrap();
        assert_eq!(
            state,
            SessionState::Failed(FailureReason::Transcription(
                Locale::En.generic_failure().to_string()
            ))
        );
    }

    #[test]
    fn test_acknowledge_and_reset_return_to_idle() {
        let failed = SessionState::Failed(FailureReason::Transcription("x".to_string()));
        assert_eq!(
            failed.next(SessionEvent::Acknowledge).unwrap(),
            SessionState::Idle
        );

        let complete = SessionState::Complete(result());
        assert_eq!(
            complete.next(SessionEvent::Reset).unwrap(),
            SessionState::Idle
        );
    }

    #[test]
    fn test_render_failure_after_completion() {
        let state = SessionState::Complete(result())
            .next(SessionEvent::RenderFailed("bad ABC".to_string()))
            .unwrap();
        assert_eq!(
            state,
            SessionState::Failed(FailureReason::Render("bad ABC".to_string()))
        );
    }

    #[test]
    fn test_second_submission_while_busy_is_rejected() {
        let transcribing =
            SessionState::Transcribing(TranscriptionRequest::direct(URL, Default::default()));
        let rejected = transcribing
            .clone()
            .next(SessionEvent::Submit(RawInput::url(URL)))
            .unwrap_err();
        assert_eq!(rejected.state, transcribing);
        assert_eq!(
            rejected.reason.to_string(),
            "cannot submit while transcribing (direct)"
        );

        let rejected = analyzing()
            .next(SessionEvent::Submit(RawInput::url(URL)))
            .unwrap_err();
        assert_eq!(rejected.state, analyzing());
    }

    #[test]
    fn test_unrelated_events_are_rejected_everywhere() {
        let states = vec![
            SessionState::Idle,
            analyzing(),
            awaiting(false),
            SessionState::Complete(result()),
            SessionState::Failed(FailureReason::Analysis("x".to_string())),
        ];
        for state in states {
            let rejected = state
                .clone()
                .next(SessionEvent::Validate)
                .expect_err("validate only applies while validating");
            assert_eq!(rejected.state, state);
        }
    }

    #[test]
    fn test_reset_only_from_complete() {
        let failed = SessionState::Failed(FailureReason::Analysis("x".to_string()));
        assert!(failed.next(SessionEvent::Reset).is_err());
        assert!(SessionState::Idle.next(SessionEvent::Reset).is_err());
    }

    #[test]
    fn test_phase_busy() {
        assert!(SessionPhase::Analyzing.is_busy());
        assert!(SessionPhase::Transcribing(TranscriptionMode::Direct).is_busy());
        assert!(!SessionPhase::AwaitingSourceChoice.is_busy());
        assert!(!SessionPhase::Complete.is_busy());
    }
}
