use voxclip_transcribe::{GoogleSpeechClient, SpeechConfig, TranscribeError, Transcriber};
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> GoogleSpeechClient {
    let config = SpeechConfig::new("test-key").with_endpoint(server.uri());
    GoogleSpeechClient::new(config).unwrap()
}

fn clip_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("abcdefghijk-001.wav");
    std::fs::write(&path, b"RIFF0000WAVE").unwrap();
    path
}

#[tokio::test]
async fn test_transcribe_joins_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "config": {"encoding": "LINEAR16", "sampleRateHertz": 16000, "languageCode": "si"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"alternatives": [{"transcript": "hello"}]},
                {"alternatives": [{"transcript": "world"}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let text = client_for(&server)
        .transcribe(&clip_file(&dir))
        .await
        .unwrap();

    assert_eq!(text.as_deref(), Some("hello world"));
}

#[tokio::test]
async fn test_transcribe_no_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let text = client_for(&server)
        .transcribe(&clip_file(&dir))
        .await
        .unwrap();

    assert!(text.is_none());
}

#[tokio::test]
async fn test_transcribe_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let err = client_for(&server)
        .transcribe(&clip_file(&dir))
        .await
        .unwrap_err();

    match err {
        TranscribeError::Api { status, ref body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "backend unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_transcribe_missing_file() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .transcribe(std::path::Path::new("/nonexistent/voxclip/clip.wav"))
        .await
        .unwrap_err();

    assert!(matches!(err, TranscribeError::Io(_)));
}
