//! Decorative progress narration.
//!
//! While a request is outstanding the narrator walks a fixed list of labels at
//! wall-clock offsets. The labels say nothing about real backend progress.
//! Each run is owned by a [`NarrationGuard`]; once the guard is cancelled or
//! dropped no further label is emitted.

use crate::backend::types::{TranscriptionMode, TranscriptionRequest};
use crate::config::NarrationConfig;
use crate::locale::{Locale, Stage};
use crate::session::SessionNotice;
use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One label, shown `after` the request started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationStep {
    pub after: Duration,
    pub label: String,
}

/// Ordered labels for one outstanding request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NarrationPlan {
    steps: Vec<NarrationStep>,
}

impl NarrationPlan {
    fn from_stages(locale: Locale, stages: &[(u64, Stage)]) -> Self {
        Self {
            steps: stages
                .iter()
                .map(|&(secs, stage)| NarrationStep {
                    after: Duration::from_secs(secs),
                    label: locale.stage(stage).to_string(),
                })
                .collect(),
        }
    }

    /// Labels while a URL is being analyzed.
    pub fn analyzing(locale: Locale) -> Self {
        Self::from_stages(
            locale,
            &[(0, Stage::FetchingVideo), (3, Stage::SearchingCovers)],
        )
    }

    /// Labels for a transcription in the given mode.
    ///
    /// `sources` is the number of cover videos and only matters for the
    /// ensemble mode.
    pub fn transcribing(
        locale: Locale,
        mode: TranscriptionMode,
        sources: usize,
        is_upload: bool,
        ensemble_step: Duration,
    ) -> Self {
        match mode {
            TranscriptionMode::Direct if is_upload => Self::from_stages(
                locale,
                &[
                    (0, Stage::Uploading),
                    (5, Stage::DetectingNotes),
                    (20, Stage::Arranging),
                    (40, Stage::Rendering),
                ],
            ),
            TranscriptionMode::Direct => Self::from_stages(
                locale,
                &[
                    (0, Stage::Downloading),
                    (10, Stage::DetectingNotes),
                    (30, Stage::Arranging),
                    (50, Stage::Rendering),
                ],
            ),
            TranscriptionMode::SourceSeparated => Self::from_stages(
                locale,
                &[
                    (0, Stage::Downloading),
                    (10, Stage::Separating),
                    (40, Stage::DetectingNotes),
                    (70, Stage::Arranging),
                    (90, Stage::Rendering),
                ],
            ),
            TranscriptionMode::EnsembleOfCovers => Self::ensemble(locale, sources, ensemble_step),
        }
    }

    /// Labels for an outstanding transcription request.
    pub fn for_request(
        locale: Locale,
        request: &TranscriptionRequest,
        ensemble_step: Duration,
    ) -> Self {
        Self::transcribing(
            locale,
            request.mode(),
            request.source_count(),
            matches!(request, TranscriptionRequest::Upload(_)),
            ensemble_step,
        )
    }

    /// "(i/N)" steps at a fixed interval, then a final reconciling label.
    pub fn ensemble(locale: Locale, sources: usize, step: Duration) -> Self {
        let mut steps: Vec<NarrationStep> = (0..sources)
            .map(|i| NarrationStep {
                after: step.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)),
                label: locale.cover_step(i + 1, sources),
            })
            .collect();
        steps.push(NarrationStep {
            after: step.saturating_mul(u32::try_from(sources).unwrap_or(u32::MAX)),
            label: locale.stage(Stage::Reconciling).to_string(),
        });
        Self { steps }
    }

    pub fn steps(&self) -> &[NarrationStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Schedules narration labels onto a notice channel.
#[derive(Debug, Clone)]
pub struct ProgressNarrator {
    notices: Option<Sender<SessionNotice>>,
    config: NarrationConfig,
    locale: Locale,
}

impl ProgressNarrator {
    pub fn new(
        notices: Option<Sender<SessionNotice>>,
        config: NarrationConfig,
        locale: Locale,
    ) -> Self {
        Self {
            notices,
            config,
            locale,
        }
    }

    /// A narrator that never emits anything.
    pub fn silent() -> Self {
        Self {
            notices: None,
            config: NarrationConfig::default(),
            locale: Locale::default(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn ensemble_step(&self) -> Duration {
        Duration::from_secs(self.config.ensemble_step_secs)
    }

    /// Start walking `plan`. Must be called from within a tokio runtime.
    ///
    /// The returned guard stops the run when cancelled or dropped.
    pub fn start(&self, plan: NarrationPlan) -> NarrationGuard {
        let Some(tx) = self.notices.clone() else {
            return NarrationGuard::inert();
        };
        if !self.config.enabled || plan.is_empty() {
            return NarrationGuard::inert();
        }

        let active = Arc::new(Mutex::new(true));
        let task_active = Arc::clone(&active);
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            for step in plan.steps {
                // Offsets past the clock's range are never reached
                let Some(deadline) = started.checked_add(step.after) else {
                    return;
                };
                tokio::time::sleep_until(deadline).await;
                // Hold the flag while sending so a concurrent cancel cannot
                // slip in between the check and the send.
                let Ok(still_active) = task_active.lock() else {
                    return;
                };
                if !*still_active {
                    return;
                }
                tracing::trace!(label = %step.label, "Narration step");
                if tx
                    .try_send(SessionNotice::Progress { label: step.label })
                    .is_err()
                {
                    return;
                }
            }
        });

        NarrationGuard {
            active,
            handle: Some(handle),
        }
    }
}

/// Owns one narration run.
#[derive(Debug)]
pub struct NarrationGuard {
    active: Arc<Mutex<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl NarrationGuard {
    fn inert() -> Self {
        Self {
            active: Arc::new(Mutex::new(false)),
            handle: None,
        }
    }

    /// Stop the run. No label is emitted after this returns.
    pub fn cancel(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            *active = false;
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
            && self.active.lock().map(|a| *a).unwrap_or(false)
    }
}

impl Drop for NarrationGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}
