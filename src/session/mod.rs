//! The conversion session: a single state value driven through analysis,
//! source choice and transcription.

pub mod machine;
pub mod narrator;
pub mod state;

pub use machine::Session;
pub use narrator::{NarrationGuard, NarrationPlan, NarrationStep, ProgressNarrator};
pub use state::{
    FailureReason, InvalidTransition, SessionEvent, SessionPhase, SessionState, SourceChoice,
    SourcePrompt,
};

/// Events emitted by a session for a front end to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The session entered a new phase.
    PhaseChanged { phase: SessionPhase },
    /// Decorative narration label; not tied to real backend progress.
    Progress { label: String },
    /// The session failed with a user-facing message.
    Failed { message: String },
    /// Sheet music is ready.
    Completed { key: String },
}
