//! Session driver.
//!
//! Owns the single [`SessionState`] and performs the network calls each state
//! asks for. Every state change goes through [`SessionState::next`]; this
//! module only decides which event to feed in next.

use crate::backend::SheetBackend;
use crate::backend::types::{SheetMusicResult, TranscriptionRequest};
use crate::config::NarrationConfig;
use crate::error::{PianosheetError, Result};
use crate::input::RawInput;
use crate::locale::Locale;
use crate::presenter::ResultPresenter;
use crate::session::SessionNotice;
use crate::session::narrator::{NarrationPlan, ProgressNarrator};
use crate::session::state::{
    FailureReason, Rejected, SessionEvent, SessionPhase, SessionState, SourceChoice,
};
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Work a busy state is waiting on.
enum Pending {
    Analyze(String),
    Transcribe(TranscriptionRequest),
}

/// One conversion session.
pub struct Session {
    backend: Arc<dyn SheetBackend>,
    state: SessionState,
    narrator: ProgressNarrator,
    notices: Option<Sender<SessionNotice>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A silent session in the Idle state.
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self {
            backend,
            state: SessionState::Idle,
            narrator: ProgressNarrator::silent(),
            notices: None,
        }
    }

    /// Emit phase changes, outcomes and narration labels on `notices`.
    pub fn with_notices(
        mut self,
        notices: Sender<SessionNotice>,
        narration: NarrationConfig,
        locale: Locale,
    ) -> Self {
        self.narrator = ProgressNarrator::new(Some(notices.clone()), narration, locale);
        self.notices = Some(notices);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// The finished sheet music, if the session is complete.
    pub fn result(&self) -> Option<&SheetMusicResult> {
        match &self.state {
            SessionState::Complete(result) => Some(result),
            _ => None,
        }
    }

    /// Why the session failed, if it has.
    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.state {
            SessionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Choices on offer while awaiting a source choice; empty otherwise.
    pub fn choices(&self) -> Vec<SourceChoice> {
        match &self.state {
            SessionState::AwaitingSourceChoice(prompt) => prompt.choices(),
            _ => Vec::new(),
        }
    }

    /// Submit a file or URL and run it as far as it goes without the user.
    ///
    /// Returns once the session is complete, failed, or waiting for a source
    /// choice. Only accepted while idle.
    pub async fn submit(&mut self, input: RawInput) -> Result<SessionPhase> {
        self.apply(SessionEvent::Submit(input))?;
        self.apply(SessionEvent::Validate)?;
        self.drive().await;
        Ok(self.phase())
    }

    /// Answer the source prompt.
    ///
    /// # Errors
    ///
    /// `ChoiceUnavailable` if the choice was not offered, `InvalidTransition`
    /// if no prompt is pending.
    pub async fn choose(&mut self, choice: SourceChoice) -> Result<SessionPhase> {
        if let SessionState::AwaitingSourceChoice(prompt) = &self.state
            && !prompt.offers(choice)
        {
            return Err(PianosheetError::ChoiceUnavailable {
                choice: choice.to_string(),
            });
        }
        self.apply(SessionEvent::Choose(choice))?;
        self.drive().await;
        Ok(self.phase())
    }

    /// Dismiss a failure and return to Idle.
    pub fn acknowledge(&mut self) -> Result<()> {
        self.apply(SessionEvent::Acknowledge)?;
        Ok(())
    }

    /// Discard a finished result and return to Idle. A no-op when already idle.
    pub fn reset(&mut self) -> Result<()> {
        if matches!(self.state, SessionState::Idle) {
            return Ok(());
        }
        self.apply(SessionEvent::Reset)?;
        Ok(())
    }

    /// Record that an external renderer could not display the result.
    pub fn report_render_failure(&mut self, message: &str) -> Result<()> {
        self.apply(SessionEvent::RenderFailed(message.to_string()))?;
        Ok(())
    }

    /// Read-only view of a completed session.
    pub fn presenter(&mut self) -> Option<ResultPresenter<'_>> {
        let result = self.result()?.clone();
        Some(ResultPresenter::new(self, result))
    }

    /// Run network calls until the session settles in a non-busy state.
    async fn drive(&mut self) {
        loop {
            let pending = match &self.state {
                SessionState::Analyzing { url } => Pending::Analyze(url.clone()),
                SessionState::Transcribing(request) => Pending::Transcribe(request.clone()),
                _ => return,
            };

            let event = match pending {
                Pending::Analyze(url) => self.run_analysis(&url).await,
                Pending::Transcribe(request) => self.run_transcription(&request).await,
            };
            if let Err(e) = self.apply(event) {
                tracing::warn!(error = %e, "Backend outcome rejected");
                return;
            }

            // Separation is probed once, before the prompt is shown
            if matches!(self.state, SessionState::AwaitingSourceChoice(_)) {
                let status = self.backend.separation_status().await;
                tracing::debug!(available = status.available, model = %status.model_name, "Separation status");
                if let Err(e) = self.apply(SessionEvent::SeparationProbed(status)) {
                    tracing::warn!(error = %e, "Separation status rejected");
                }
            }
        }
    }

    async fn run_analysis(&self, url: &str) -> SessionEvent {
        let mut narration = self
            .narrator
            .start(NarrationPlan::analyzing(self.narrator.locale()));
        let outcome = self.backend.analyze(url).await;
        narration.cancel();

        match outcome {
            Ok(analysis) => {
                tracing::info!(
                    video_id = %analysis.original().video_id,
                    covers = analysis.covers().len(),
                    "Analysis complete"
                );
                SessionEvent::Analyzed(analysis)
            }
            Err(e) => SessionEvent::AnalysisFailed(e.into_detail()),
        }
    }

    async fn run_transcription(&self, request: &TranscriptionRequest) -> SessionEvent {
        let plan = NarrationPlan::for_request(
            self.narrator.locale(),
            request,
            self.narrator.ensemble_step(),
        );
        let mut narration = self.narrator.start(plan);
        let outcome = self.backend.transcribe(request).await;
        narration.cancel();

        match outcome {
            Ok(result) if !result.is_complete() => {
                tracing::warn!("Backend returned an incomplete sheet music result");
                SessionEvent::TranscriptionFailed(
                    self.narrator.locale().generic_failure().to_string(),
                )
            }
            Ok(result) => SessionEvent::Transcribed(result),
            Err(e) => SessionEvent::TranscriptionFailed(e.into_detail()),
        }
    }

    /// Feed one event through the transition function.
    fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase> {
        let before = self.phase();
        let current = std::mem::replace(&mut self.state, SessionState::Idle);
        match current.next(event) {
            Ok(next) => {
                self.state = next;
                let after = self.phase();
                if after != before {
                    tracing::debug!(from = %before, to = %after, "Session transition");
                    self.announce(after);
                }
                Ok(after)
            }
            Err(Rejected { state, reason }) => {
                self.state = state;
                Err(reason.into())
            }
        }
    }

    fn announce(&self, phase: SessionPhase) {
        let mut notices = vec![SessionNotice::PhaseChanged { phase }];
        match &self.state {
            SessionState::Failed(reason) => {
                tracing::info!(%reason, "Session failed");
                notices.push(SessionNotice::Failed {
                    message: reason.to_string(),
                });
            }
            SessionState::Complete(result) => {
                notices.push(SessionNotice::Completed {
                    key: result.key().to_string(),
                });
            }
            _ => {}
        }

        if let Some(ref tx) = self.notices {
            for notice in notices {
                if tx.try_send(notice).is_err() {
                    tracing::trace!("Notice receiver gone");
                    break;
                }
            }
        }
    }
}
