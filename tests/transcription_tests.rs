//! Transcription integration tests
//!
//! The Gemini adapter runs against a local mock server. The live API tests
//! require a valid GEMINI_API_KEY environment variable.
//! Run with: cargo test --test transcription_tests -- --ignored

use std::path::PathBuf;

use chat_composer::application::ports::{Transcriber, TranscriptionError};
use chat_composer::infrastructure::transcription::GeminiTranscriber;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "test-model";

/// Write a small recording into a temp dir
fn recording(name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join(name);
    std::fs::write(&file, bytes).unwrap();
    (dir, file)
}

fn transcriber(server: &MockServer) -> GeminiTranscriber {
    GeminiTranscriber::with_model("test-key", MODEL).with_base_url(server.uri())
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

#[tokio::test]
async fn transcribes_a_voice_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}:generateContent", MODEL)))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [{ "inlineData": { "mimeType": "audio/wav", "data": "AQID" } }]
            }]
        })))
        .respond_with(text_response("  hello \n"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[1, 2, 3]);
    let text = transcriber(&server).transcribe(&file).await.unwrap();

    assert_eq!(text, "hello");
}

#[tokio::test]
async fn mime_type_follows_the_extension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "inlineData": { "mimeType": "audio/flac" } }] }]
        })))
        .respond_with(text_response("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.flac", b"fLaC");
    assert_eq!(transcriber(&server).transcribe(&file).await.unwrap(), "ok");
}

#[tokio::test]
async fn unauthorized_is_invalid_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[1]);
    let result = transcriber(&server).transcribe(&file).await;

    assert!(matches!(result, Err(TranscriptionError::InvalidApiKey)));
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[1]);
    let result = transcriber(&server).transcribe(&file).await;

    assert!(matches!(result, Err(TranscriptionError::RateLimited)));
}

#[tokio::test]
async fn server_error_keeps_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[1]);
    let result = transcriber(&server).transcribe(&file).await;

    match result {
        Err(TranscriptionError::ApiError(message)) => {
            assert!(message.contains("500"));
            assert!(message.contains("backend exploded"));
        }
        other => panic!("Expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn blank_transcript_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("   "))
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[1]);
    let result = transcriber(&server).transcribe(&file).await;

    assert!(matches!(result, Err(TranscriptionError::EmptyResponse)));
}

#[tokio::test]
async fn missing_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[1]);
    let result = transcriber(&server).transcribe(&file).await;

    assert!(matches!(result, Err(TranscriptionError::EmptyResponse)));
}

#[tokio::test]
async fn api_error_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": { "message": "bad audio" } })),
        )
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[1]);
    let result = transcriber(&server).transcribe(&file).await;

    assert!(matches!(result, Err(TranscriptionError::ApiError(m)) if m == "bad audio"));
}

#[tokio::test]
async fn missing_recording_is_read_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("never"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let result = transcriber(&server)
        .transcribe(&dir.path().join("gone.wav"))
        .await;

    assert!(matches!(result, Err(TranscriptionError::ReadFailed(_))));
}

#[tokio::test]
async fn empty_recording_is_not_uploaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("never"))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, file) = recording("clip.wav", &[]);
    let result = transcriber(&server).transcribe(&file).await;

    assert!(matches!(result, Err(TranscriptionError::ReadFailed(_))));
}

#[tokio::test]
#[ignore = "requires GEMINI_API_KEY environment variable"]
async fn transcribe_with_valid_api_key() {
    let Ok(api_key) = std::env::var("GEMINI_API_KEY") else {
        eprintln!("Skipping test: GEMINI_API_KEY not set");
        return;
    };

    // One second of 16 kHz silence
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("silence.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&file, spec).unwrap();
    for _ in 0..16_000 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let result = GeminiTranscriber::new(api_key).transcribe(&file).await;

    // Silence may legitimately come back empty, but never as an auth error
    if let Err(e) = &result {
        assert!(
            !matches!(e, TranscriptionError::InvalidApiKey),
            "Valid API key should not produce InvalidApiKey error: {:?}",
            e
        );
    }
}
