//! Read-only access to a finished result.
//!
//! Notation rendering and PDF export happen elsewhere; they consume the three
//! ABC scores through this view and report problems back with
//! [`Session::report_render_failure`].

use crate::backend::types::SheetMusicResult;
use crate::error::Result;
use crate::session::Session;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The three arrangement levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// View over a completed session.
///
/// Holds the session mutably so the result cannot change underneath it.
pub struct ResultPresenter<'a> {
    session: &'a mut Session,
    result: SheetMusicResult,
}

impl<'a> ResultPresenter<'a> {
    pub(crate) fn new(session: &'a mut Session, result: SheetMusicResult) -> Self {
        Self { session, result }
    }

    pub fn beginner(&self) -> &str {
        self.result.beginner()
    }

    pub fn intermediate(&self) -> &str {
        self.result.intermediate()
    }

    pub fn advanced(&self) -> &str {
        self.result.advanced()
    }

    /// Detected key, e.g. "G major".
    pub fn key(&self) -> &str {
        self.result.key()
    }

    pub fn score(&self, difficulty: Difficulty) -> &str {
        match difficulty {
            Difficulty::Beginner => self.beginner(),
            Difficulty::Intermediate => self.intermediate(),
            Difficulty::Advanced => self.advanced(),
        }
    }

    /// Write `<stem>-<difficulty>.abc` for each level into `dir`.
    ///
    /// The directory is created if missing. Returns the written paths in
    /// difficulty order.
    pub fn export_abc(&self, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let stem = sanitize_stem(stem);

        let mut written = Vec::with_capacity(Difficulty::ALL.len());
        for difficulty in Difficulty::ALL {
            let path = dir.join(format!("{stem}-{difficulty}.abc"));
            let mut contents = self.score(difficulty).to_string();
            if !contents.ends_with('\n') {
                contents.push('\n');
            }
            fs::write(&path, contents)?;
            tracing::debug!(path = %path.display(), "Wrote score");
            written.push(path);
        }
        Ok(written)
    }

    /// Discard the result and return the session to Idle.
    pub fn reset(self) -> Result<()> {
        self.session.reset()
    }

    /// Hand a rendering error back to the session.
    pub fn render_failed(self, message: &str) -> Result<()> {
        self.session.report_render_failure(message)
    }
}

/// Reduce a title to something safe as a file name.
fn sanitize_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut last_dash = true;
    for c in stem.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "sheet".to_string()
    } else {
        trimmed.to_string()
    }
}
