//! End-to-end session flows against a mock HTTP backend.

use mockito::{Matcher, Server, ServerGuard};
use pianosheet::backend::HttpBackend;
use pianosheet::session::{FailureReason, Session, SessionPhase, SourceChoice};
use pianosheet::{Config, Locale, RawInput, SheetBackend};
use serde_json::json;
use std::sync::Arc;

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=orig";

const RESULT_BODY: &str = r#"{
    "beginner": "X:1\nK:C\nC2 E2 G2|",
    "intermediate": "X:1\nK:C\nCE EG Gc|",
    "advanced": "X:1\nK:C\n[CEG]2 [EGc]2|",
    "key": "C major"
}"#;

fn config_for(server: &ServerGuard, locale: Locale) -> Config {
    let mut config = Config::default();
    config.backend.url = format!("{}/api", server.url());
    config.output.locale = locale;
    config
}

fn session_for(config: &Config) -> Session {
    let backend = HttpBackend::new(config).unwrap();
    Session::new(Arc::new(backend))
}

fn analysis_body(cover_ids: &[&str]) -> String {
    let covers: Vec<_> = cover_ids
        .iter()
        .map(|id| {
            json!({
                "video_id": id,
                "title": format!("Piano cover {id}"),
                "channel": "Pianist",
                "thumbnail": "",
                "duration_seconds": 190,
                "url": format!("https://www.youtube.com/watch?v={id}"),
            })
        })
        .collect();
    json!({
        "original": {
            "video_id": "orig",
            "title": "Official Video",
            "channel": "Band",
            "thumbnail": "https://i.ytimg.com/vi/orig/hq.jpg",
            "duration_seconds": 201,
            "song_title": "Tune",
            "artist": "Band",
        },
        "piano_covers": covers,
    })
    .to_string()
}

#[tokio::test]
async fn test_upload_failure_surfaces_detail_then_acknowledges() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", "/api/transcribe/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"decode failed"}"#)
        .create_async()
        .await;

    let mut session = session_for(&config_for(&server, Locale::En));
    let raw = RawInput::file(vec![0u8; 3_000_000], Some("audio/mpeg"), "song.mp3");
    let phase = session.submit(raw).await.unwrap();

    upload.assert_async().await;
    assert_eq!(phase, SessionPhase::Failed);
    assert_eq!(
        session.failure(),
        Some(&FailureReason::Transcription("decode failed".to_string()))
    );

    session.acknowledge().unwrap();
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn test_upload_success_normalizes_result() {
    let mut server = Server::new_async().await;
    let _upload = server
        .mock("POST", "/api/transcribe/upload")
        .match_body(Matcher::Regex("name=\"file\"; filename=\"take.wav\"".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(RESULT_BODY)
        .create_async()
        .await;

    let mut session = session_for(&config_for(&server, Locale::En));
    let raw = RawInput::file(b"RIFF....WAVE".to_vec(), Some("audio/x-wav"), "take.wav");
    assert_eq!(session.submit(raw).await.unwrap(), SessionPhase::Complete);

    let result = session.result().unwrap();
    assert_eq!(result.key(), "C major");
    assert!(result.advanced().contains("[CEG]"));
}

#[tokio::test]
async fn test_unparseable_error_uses_localized_fallback() {
    for (locale, expected) in [
        (Locale::En, Locale::En.generic_failure()),
        (Locale::Ja, Locale::Ja.generic_failure()),
    ] {
        let mut server = Server::new_async().await;
        let _analyze = server
            .mock("POST", "/api/youtube/analyze")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let mut session = session_for(&config_for(&server, locale));
        session.submit(RawInput::url(VIDEO_URL)).await.unwrap();

        assert_eq!(
            session.failure(),
            Some(&FailureReason::Analysis(expected.to_string()))
        );
    }
}

#[tokio::test]
async fn test_covers_are_sent_together_in_backend_order() {
    let mut server = Server::new_async().await;
    let analyze = server
        .mock("POST", "/api/youtube/analyze")
        .match_body(Matcher::PartialJson(json!({ "url": VIDEO_URL })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(analysis_body(&["second", "first"]))
        .create_async()
        .await;
    let ensemble = server
        .mock("POST", "/api/transcribe/ensemble")
        .match_body(Matcher::PartialJson(json!({
            "urls": [
                "https://www.youtube.com/watch?v=second",
                "https://www.youtube.com/watch?v=first",
            ],
            "song_title": "Tune",
            "artist": "Band",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(RESULT_BODY)
        .create_async()
        .await;
    let status = server
        .mock("GET", "/api/separation/status")
        .expect(0)
        .create_async()
        .await;

    let mut session = session_for(&config_for(&server, Locale::En));
    let phase = session.submit(RawInput::url(VIDEO_URL)).await.unwrap();

    assert_eq!(phase, SessionPhase::Complete);
    analyze.assert_async().await;
    ensemble.assert_async().await;
    status.assert_async().await;
}

#[tokio::test]
async fn test_ensemble_failure_does_not_try_other_modes() {
    let mut server = Server::new_async().await;
    let _analyze = server
        .mock("POST", "/api/youtube/analyze")
        .with_status(200)
        .with_body(analysis_body(&["a"]))
        .create_async()
        .await;
    let _ensemble = server
        .mock("POST", "/api/transcribe/ensemble")
        .with_status(500)
        .with_body(r#"{"detail":"could not reconcile"}"#)
        .create_async()
        .await;
    let youtube = server
        .mock("POST", "/api/transcribe/youtube")
        .expect(0)
        .create_async()
        .await;

    let mut session = session_for(&config_for(&server, Locale::En));
    session.submit(RawInput::url(VIDEO_URL)).await.unwrap();

    assert_eq!(
        session.failure(),
        Some(&FailureReason::Transcription(
            "could not reconcile".to_string()
        ))
    );
    youtube.assert_async().await;
}

#[tokio::test]
async fn test_no_covers_then_direct_choice() {
    let mut server = Server::new_async().await;
    let _analyze = server
        .mock("POST", "/api/youtube/analyze")
        .with_status(200)
        .with_body(analysis_body(&[]))
        .create_async()
        .await;
    let _status = server
        .mock("GET", "/api/separation/status")
        .with_status(200)
        .with_body(r#"{"available": false, "model_name": "htdemucs"}"#)
        .create_async()
        .await;
    let youtube = server
        .mock("POST", "/api/transcribe/youtube")
        .match_body(Matcher::PartialJson(json!({
            "url": VIDEO_URL,
            "mode": "direct",
            "song_title": "Tune",
        })))
        .with_status(200)
        .with_body(RESULT_BODY)
        .create_async()
        .await;

    let mut session = session_for(&config_for(&server, Locale::En));
    let phase = session.submit(RawInput::url(VIDEO_URL)).await.unwrap();
    assert_eq!(phase, SessionPhase::AwaitingSourceChoice);
    assert_eq!(
        session.choices(),
        vec![SourceChoice::UseOriginal, SourceChoice::Back]
    );

    let phase = session.choose(SourceChoice::UseOriginal).await.unwrap();
    assert_eq!(phase, SessionPhase::Complete);
    youtube.assert_async().await;
}

#[tokio::test]
async fn test_separation_offered_when_backend_reports_it() {
    let mut server = Server::new_async().await;
    let _analyze = server
        .mock("POST", "/api/youtube/analyze")
        .with_status(200)
        .with_body(analysis_body(&[]))
        .create_async()
        .await;
    let _status = server
        .mock("GET", "/api/separation/status")
        .with_status(200)
        .with_body(r#"{"available": true, "modelName": "htdemucs"}"#)
        .create_async()
        .await;
    let youtube = server
        .mock("POST", "/api/transcribe/youtube")
        .match_body(Matcher::PartialJson(json!({ "mode": "demucs" })))
        .with_status(200)
        .with_body(RESULT_BODY)
        .create_async()
        .await;

    let mut session = session_for(&config_for(&server, Locale::En));
    session.submit(RawInput::url(VIDEO_URL)).await.unwrap();
    assert!(
        session
            .choices()
            .contains(&SourceChoice::SeparateThenTranscribe)
    );

    session
        .choose(SourceChoice::SeparateThenTranscribe)
        .await
        .unwrap();
    assert_eq!(session.phase(), SessionPhase::Complete);
    youtube.assert_async().await;
}

#[tokio::test]
async fn test_failed_separation_check_reads_as_unavailable() {
    let mut server = Server::new_async().await;
    let _status = server
        .mock("GET", "/api/separation/status")
        .with_status(503)
        .with_body(r#"{"detail":"GPU busy"}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&config_for(&server, Locale::En)).unwrap();
    let status = backend.separation_status().await;
    assert!(!status.available);
}

#[tokio::test]
async fn test_incomplete_result_is_a_failure() {
    let mut server = Server::new_async().await;
    let _upload = server
        .mock("POST", "/api/transcribe/upload")
        .with_status(200)
        .with_body(r#"{"beginner":"X:1","intermediate":"X:1","advanced":"","key":"C"}"#)
        .create_async()
        .await;

    let mut session = session_for(&config_for(&server, Locale::En));
    let raw = RawInput::file(vec![1, 2, 3], Some("audio/mp3"), "a.mp3");
    session.submit(raw).await.unwrap();

    assert_eq!(session.phase(), SessionPhase::Failed);
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_unreachable_backend_fails_with_localized_prefix() {
    let mut config = Config::default();
    // Port 9 (discard) is closed on test machines
    config.backend.url = "http://127.0.0.1:9/api".to_string();
    config.backend.connect_timeout_secs = 2;

    let mut session = session_for(&config);
    session.submit(RawInput::url(VIDEO_URL)).await.unwrap();

    match session.failure() {
        Some(FailureReason::Analysis(message)) => {
            assert!(message.starts_with(Locale::En.backend_unreachable()))
        }
        other => panic!("Expected analysis failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_health_lives_at_server_root() {
    let mut server = Server::new_async().await;
    let health = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(r#"{"status":"ok","message":"Piano transcription API"}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&config_for(&server, Locale::En)).unwrap();
    let status = backend.health().await.unwrap();

    health.assert_async().await;
    assert_eq!(status.status, "ok");
}
