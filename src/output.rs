//! Terminal rendering of session notices and backend data.
//! Used by the `convert`, `analyze` and `status` commands.

use crate::backend::types::{AnalysisResult, HealthStatus, SeparationStatus, VideoMetadata};
use crate::session::{SessionNotice, SourceChoice};
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread::JoinHandle;
use std::time::Duration;

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const SPINNER_TICK: Duration = Duration::from_millis(120);

/// Draws notices on stderr: a spinner while busy, a line per outcome.
#[derive(Default)]
pub struct NoticeRenderer {
    spinner: Option<ProgressBar>,
}

impl NoticeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, notice: &SessionNotice) {
        match notice {
            SessionNotice::PhaseChanged { phase } if phase.is_busy() => {
                self.spinner().set_message(phase.to_string());
            }
            SessionNotice::PhaseChanged { .. } => self.clear(),
            SessionNotice::Progress { label } => {
                self.spinner().set_message(label.clone());
            }
            SessionNotice::Failed { .. } | SessionNotice::Completed { .. } => {
                self.clear();
                if let Some(line) = format_outcome(notice) {
                    eprintln!("{line}");
                }
            }
        }
    }

    fn spinner(&mut self) -> &ProgressBar {
        self.spinner.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                // SAFETY: hardcoded template string, always valid
                #[allow(clippy::expect_used)]
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} {elapsed:.dim}")
                    .expect("hardcoded spinner template"),
            );
            pb.enable_steady_tick(SPINNER_TICK);
            pb
        })
    }

    fn clear(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

/// Render notices on a background thread until every sender is dropped.
pub fn spawn_renderer(notices: Receiver<SessionNotice>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut renderer = NoticeRenderer::new();
        for notice in notices {
            renderer.render(&notice);
        }
        renderer.clear();
    })
}

/// The line printed for a terminal notice.
fn format_outcome(notice: &SessionNotice) -> Option<String> {
    match notice {
        SessionNotice::Failed { message } => Some(format!("{RED}Error:{RESET} {message}")),
        SessionNotice::Completed { key } => {
            Some(format!("{GREEN}Sheet music ready{RESET} {DIM}(key: {key}){RESET}"))
        }
        _ => None,
    }
}

fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn format_video(video: &VideoMetadata) -> String {
    let mut line = format!(
        "{} {DIM}({}, {}){RESET}",
        video.title,
        video.channel,
        format_duration(video.duration_seconds)
    );
    if let (Some(song), Some(artist)) = (&video.song_title, &video.artist) {
        line.push_str(&format!(" {DIM}[{song} / {artist}]{RESET}"));
    }
    line
}

/// Print an analysis: the original video and its covers in backend order.
pub fn print_analysis(analysis: &AnalysisResult) {
    println!("{}", format_video(analysis.original()));
    if analysis.covers().is_empty() {
        println!("  {DIM}No piano covers found{RESET}");
        return;
    }
    println!("Piano covers:");
    for (i, cover) in analysis.covers().iter().enumerate() {
        println!("  [{}] {}", i + 1, format_video(&cover.metadata));
        println!("      {DIM}{}{RESET}", cover.source_url);
    }
}

pub fn choice_label(choice: SourceChoice) -> &'static str {
    match choice {
        SourceChoice::UseOriginal => "Transcribe the original audio",
        SourceChoice::SeparateThenTranscribe => "Isolate the piano part first, then transcribe",
        SourceChoice::Back => "Back",
    }
}

/// Print the numbered source prompt.
pub fn print_choices(choices: &[SourceChoice]) {
    eprintln!("No piano covers were found for this video. How should it be transcribed?");
    for (i, choice) in choices.iter().enumerate() {
        let key = if *choice == SourceChoice::Back {
            "b".to_string()
        } else {
            (i + 1).to_string()
        };
        eprintln!("  [{key}] {}", choice_label(*choice));
    }
}

pub fn format_health(health: &HealthStatus, separation: &SeparationStatus) -> Vec<String> {
    let separation_line = if separation.available {
        format!("available {DIM}({}){RESET}", separation.model_name)
    } else {
        "unavailable".to_string()
    };
    vec![
        format!("Backend:    {} {DIM}{}{RESET}", health.status, health.message),
        format!("Separation: {separation_line}"),
    ]
}
