use crate::defaults;
use crate::error::{PianosheetError, Result};
use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub narration: NarrationConfig,
    pub output: OutputConfig,
}

/// Transcription backend connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

/// Progress narration while requests are outstanding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NarrationConfig {
    pub enabled: bool,
    pub ensemble_step_secs: u64,
}

/// Output and presentation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub locale: Locale,
    /// Where exported ABC files go (current directory when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: defaults::DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ensemble_step_secs: defaults::ENSEMBLE_STEP_SECS,
        }
    }
}

const TEMPLATE: &str = r#"# pianosheet configuration
# Location: ~/.config/pianosheet/config.toml

[backend]
# Base URL of the transcription backend. Endpoint paths are appended to it.
url = "http://localhost:8000/api"
# Whole-request timeout. Transcription runs server-side in one request.
request_timeout_secs = 600
connect_timeout_secs = 10

[narration]
# Show progress labels while a request is outstanding.
enabled = true
# Seconds per "(i/N)" step while several covers are transcribed together.
ensemble_step_secs = 20

[output]
# Language for generated messages: "en" or "ja".
locale = "en"
# Directory for exported .abc files (defaults to the current directory).
# directory = "~/Music/sheets"
"#;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PianosheetError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                PianosheetError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PianosheetError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(PianosheetError::ConfigInvalidValue {
                key: "backend.url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(PianosheetError::ConfigInvalidValue {
                key: "backend.request_timeout_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.backend.connect_timeout_secs == 0 {
            return Err(PianosheetError::ConfigInvalidValue {
                key: "backend.connect_timeout_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.narration.ensemble_step_secs == 0 {
            return Err(PianosheetError::ConfigInvalidValue {
                key: "narration.ensemble_step_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.narration.ensemble_step_secs > defaults::MAX_ENSEMBLE_STEP_SECS {
            return Err(PianosheetError::ConfigInvalidValue {
                key: "narration.ensemble_step_secs".to_string(),
                message: format!("must be at most {}", defaults::MAX_ENSEMBLE_STEP_SECS),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PIANOSHEET_BACKEND_URL → backend.url
    /// - PIANOSHEET_LOCALE → output.locale
    /// - PIANOSHEET_TIMEOUT → backend.request_timeout_secs (e.g. "90s", "10m")
    ///
    /// Empty or unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("PIANOSHEET_BACKEND_URL")
            && !url.is_empty()
        {
            self.backend.url = url;
        }

        if let Ok(locale) = std::env::var("PIANOSHEET_LOCALE")
            && let Ok(locale) = locale.parse::<Locale>()
        {
            self.output.locale = locale;
        }

        if let Ok(timeout) = std::env::var("PIANOSHEET_TIMEOUT")
            && let Ok(secs) = parse_duration_secs(&timeout)
            && secs > 0
        {
            self.backend.request_timeout_secs = secs;
        }

        self
    }

    /// Apply command-line overrides on top of file and environment values
    pub fn with_overrides(
        mut self,
        backend_url: Option<String>,
        locale: Option<Locale>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = backend_url {
            self.backend.url = url;
        }
        if let Some(locale) = locale {
            self.output.locale = locale;
        }
        if let Some(secs) = timeout_secs {
            self.backend.request_timeout_secs = secs;
        }
        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/pianosheet/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("pianosheet")
            .join("config.toml")
    }

    /// Render the effective configuration as TOML
    pub fn to_display_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PianosheetError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// A commented configuration template with default values
    pub fn dump_template() -> &'static str {
        TEMPLATE
    }
}

/// Parse a duration string into whole seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`90s`, `10m`) and compound (`1m30s`).
pub fn parse_duration_secs(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}
