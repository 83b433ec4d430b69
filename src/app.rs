//! Command implementations.
//!
//! Wires the configured backend, the session and the terminal renderer
//! together for each subcommand.

use crate::backend::{HttpBackend, SheetBackend};
use crate::config::Config;
use crate::error::{PianosheetError, Result};
use crate::input::{self, RawInput};
use crate::output;
use crate::session::{Session, SessionNotice, SessionState, SourceChoice};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options for `pianosheet convert`.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// File path or URL as typed by the user.
    pub input: String,
    /// Answer to the source prompt, if given up front.
    pub source: Option<SourceChoice>,
    pub out: Option<PathBuf>,
    pub name: Option<String>,
    pub to_stdout: bool,
    pub quiet: bool,
}

/// How a conversion ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// Scores written to these files.
    Exported(Vec<PathBuf>),
    /// Scores printed to stdout.
    Printed,
    /// The user backed out of the source prompt.
    Cancelled,
    /// The session failed with this message. The session has been acknowledged.
    Failed(String),
}

/// Run the convert command: classify → analyze → choose → transcribe → export.
pub async fn run_convert_command(config: Config, options: ConvertOptions) -> Result<ConvertOutcome> {
    let raw = load_input(&options.input)?;
    let backend: Arc<dyn SheetBackend> = Arc::new(HttpBackend::new(&config)?);

    let (tx, rx) = crossbeam_channel::unbounded::<SessionNotice>();
    let renderer = (!options.quiet).then(|| output::spawn_renderer(rx));

    let mut session =
        Session::new(backend).with_notices(tx, config.narration.clone(), config.output.locale);
    let outcome = drive_convert(&mut session, raw, &config, &options).await;

    // Dropping the session closes the notice channel and ends the renderer
    drop(session);
    if let Some(handle) = renderer
        && !matches!(
            tokio::task::spawn_blocking(move || handle.join()).await,
            Ok(Ok(()))
        )
    {
        tracing::warn!("Notice renderer did not shut down cleanly");
    }

    outcome
}

async fn drive_convert(
    session: &mut Session,
    raw: RawInput,
    config: &Config,
    options: &ConvertOptions,
) -> Result<ConvertOutcome> {
    session.submit(raw).await?;

    let mut preselected = options.source;
    while matches!(session.state(), SessionState::AwaitingSourceChoice(_)) {
        let choices = session.choices();
        let choice = match preselected.take() {
            Some(choice) => choice,
            None => ask_choice(choices).await?,
        };
        session.choose(choice).await?;
    }

    match session.state() {
        SessionState::Idle => Ok(ConvertOutcome::Cancelled),
        SessionState::Failed(reason) => {
            let message = reason.to_string();
            session.acknowledge()?;
            Ok(ConvertOutcome::Failed(message))
        }
        SessionState::Complete(_) => {
            let Some(presenter) = session.presenter() else {
                return Err(PianosheetError::Other(
                    "Session completed without a result".to_string(),
                ));
            };
            let outcome = if options.to_stdout {
                print_scores(
                    presenter.key(),
                    [
                        presenter.beginner(),
                        presenter.intermediate(),
                        presenter.advanced(),
                    ],
                );
                ConvertOutcome::Printed
            } else {
                let dir = options
                    .out
                    .clone()
                    .or_else(|| config.output.directory.clone())
                    .unwrap_or_else(|| PathBuf::from("."));
                let stem = options
                    .name
                    .clone()
                    .unwrap_or_else(|| default_stem(&options.input));
                ConvertOutcome::Exported(presenter.export_abc(&dir, &stem)?)
            };
            presenter.reset()?;
            Ok(outcome)
        }
        other => Err(PianosheetError::Other(format!(
            "Session stopped unexpectedly while {}",
            other.phase()
        ))),
    }
}

/// Run the analyze command: list the original video and its covers.
pub async fn run_analyze_command(config: Config, url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(input::ValidationError::EmptyUrl.into());
    }
    let backend = HttpBackend::new(&config)?;
    let analysis = backend.analyze(url.trim()).await?;
    output::print_analysis(&analysis);
    Ok(())
}

/// Run the status command: backend health and separation availability.
pub async fn run_status_command(config: Config) -> Result<()> {
    let backend = HttpBackend::new(&config)?;
    let health = backend.health().await?;
    let separation = backend.separation_status().await;
    println!("Client:     {}", crate::version_string());
    println!("URL:        {}", config.backend.url);
    for line in output::format_health(&health, &separation) {
        println!("{line}");
    }
    Ok(())
}

/// Turn the user's argument into a raw input.
///
/// Anything that looks like a web address is a URL; otherwise an existing
/// path is read from disk. A blank argument becomes an empty URL so it fails
/// validation like any other blank URL.
pub fn load_input(arg: &str) -> Result<RawInput> {
    let trimmed = arg.trim();
    if trimmed.is_empty() || looks_like_url(trimmed) {
        return Ok(RawInput::url(arg));
    }
    Ok(input::read_file(Path::new(trimmed))?)
}

fn looks_like_url(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("www.")
        || lower.starts_with("youtube.com/")
        || lower.starts_with("youtu.be/")
        || lower.starts_with("m.youtube.com/")
}

/// File name stem for an input: the file's stem, or the video id of a URL.
pub fn default_stem(arg: &str) -> String {
    let trimmed = arg.trim();
    if looks_like_url(trimmed) {
        let video_id = trimmed
            .split(['?', '&'])
            .find_map(|part| part.strip_prefix("v="))
            .or_else(|| {
                trimmed
                    .split(['?', '#'])
                    .next()
                    .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
            })
            .filter(|id| !id.is_empty());
        return video_id.unwrap_or("sheet").to_string();
    }
    Path::new(trimmed)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sheet")
        .to_string()
}

/// Match a prompt answer: a 1-based number or "b" for back.
pub fn parse_choice(answer: &str, choices: &[SourceChoice]) -> Option<SourceChoice> {
    let answer = answer.trim().to_ascii_lowercase();
    if answer == "b" || answer == "back" {
        return choices.iter().copied().find(|c| *c == SourceChoice::Back);
    }
    let index: usize = answer.parse().ok()?;
    choices
        .get(index.checked_sub(1)?)
        .copied()
        .filter(|c| *c != SourceChoice::Back)
}

/// Ask on the terminal without holding up the runtime.
async fn ask_choice(choices: Vec<SourceChoice>) -> Result<SourceChoice> {
    tokio::task::spawn_blocking(move || prompt_choice(&choices))
        .await
        .map_err(|e| PianosheetError::Other(format!("Source prompt task panicked: {}", e)))?
}

fn prompt_choice(choices: &[SourceChoice]) -> Result<SourceChoice> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Err(PianosheetError::Other(
            "No piano covers were found; pass --source original or --source separated".to_string(),
        ));
    }

    output::print_choices(choices);
    read_choice(stdin.lock(), choices)
}

/// Read answers until one matches. EOF reads as backing out.
fn read_choice(reader: impl BufRead, choices: &[SourceChoice]) -> Result<SourceChoice> {
    let mut lines = reader.lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush().ok();
        let Some(line) = lines.next() else {
            return Ok(SourceChoice::Back);
        };
        if let Some(choice) = parse_choice(&line?, choices) {
            return Ok(choice);
        }
        eprintln!("Please enter one of the listed numbers, or 'b' to go back.");
    }
}

fn print_scores(key: &str, scores: [&str; 3]) {
    println!("% Key: {key}");
    for score in scores {
        println!();
        println!("{}", score.trim_end());
    }
}
