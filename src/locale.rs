//! Localized user-facing strings.
//!
//! Only the strings this crate produces itself live here: the generic
//! fallback used when the backend gives no readable detail, and the
//! narration labels shown while a request is outstanding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language for generated messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

/// A narration stage with a fixed label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingVideo,
    SearchingCovers,
    Uploading,
    Downloading,
    Separating,
    DetectingNotes,
    Arranging,
    Rendering,
    Reconciling,
}

impl Locale {
    /// Fallback shown when a failed response carries no parseable `detail`.
    pub fn generic_failure(self) -> &'static str {
        match self {
            Locale::En => "Something went wrong while processing the request.",
            Locale::Ja => "処理中にエラーが発生しました。",
        }
    }

    /// Prefix for failures that never produced an HTTP response.
    pub fn backend_unreachable(self) -> &'static str {
        match self {
            Locale::En => "Could not reach the server.",
            Locale::Ja => "サーバーに接続できませんでした。",
        }
    }

    pub fn stage(self, stage: Stage) -> &'static str {
        match (self, stage) {
            (Locale::En, Stage::FetchingVideo) => "Fetching video details",
            (Locale::En, Stage::SearchingCovers) => "Searching for piano covers",
            (Locale::En, Stage::Uploading) => "Uploading audio",
            (Locale::En, Stage::Downloading) => "Downloading audio",
            (Locale::En, Stage::Separating) => "Separating the piano part",
            (Locale::En, Stage::DetectingNotes) => "Detecting notes",
            (Locale::En, Stage::Arranging) => "Arranging three difficulty levels",
            (Locale::En, Stage::Rendering) => "Rendering notation",
            (Locale::En, Stage::Reconciling) => "Reconciling transcriptions",
            (Locale::Ja, Stage::FetchingVideo) => "動画情報を取得中",
            (Locale::Ja, Stage::SearchingCovers) => "ピアノカバーを検索中",
            (Locale::Ja, Stage::Uploading) => "音声をアップロード中",
            (Locale::Ja, Stage::Downloading) => "音声をダウンロード中",
            (Locale::Ja, Stage::Separating) => "ピアノパートを分離中",
            (Locale::Ja, Stage::DetectingNotes) => "音符を検出中",
            (Locale::Ja, Stage::Arranging) => "3つの難易度に編曲中",
            (Locale::Ja, Stage::Rendering) => "楽譜を生成中",
            (Locale::Ja, Stage::Reconciling) => "採譜結果を統合中",
        }
    }

    /// Label for the i-th of N cover transcriptions (1-based).
    pub fn cover_step(self, index: usize, total: usize) -> String {
        match self {
            Locale::En => format!("Transcribing cover ({index}/{total})"),
            Locale::Ja => format!("カバー動画を採譜中 ({index}/{total})"),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ja => write!(f, "ja"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ja" | "japanese" => Ok(Locale::Ja),
            other => Err(format!("unknown locale '{other}' (expected en or ja)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale_is_english() {
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(" JA ".parse::<Locale>().unwrap(), Locale::Ja);
        assert_eq!("japanese".parse::<Locale>().unwrap(), Locale::Ja);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for locale in [Locale::En, Locale::Ja] {
            assert_eq!(locale.to_string().parse::<Locale>().unwrap(), locale);
        }
    }

    #[test]
    fn test_cover_step_counts() {
        assert_eq!(Locale::En.cover_step(2, 3), "Transcribing cover (2/3)");
        assert!(Locale::Ja.cover_step(1, 4).ends_with("(1/4)"));
    }

    #[test]
    fn test_fallbacks_differ_per_locale() {
        assert_ne!(Locale::En.generic_failure(), Locale::Ja.generic_failure());
        assert_ne!(
            Locale::En.backend_unreachable(),
            Locale::Ja.backend_unreachable()
        );
    }

    #[test]
    fn test_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            locale: Locale,
        }
        let parsed: Wrapper = toml::from_str("locale = \"ja\"").unwrap();
        assert_eq!(parsed.locale, Locale::Ja);
    }
}
