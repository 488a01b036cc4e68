//! Gemini REST client
//!
//! Implements [`MediaIngester`] with the Files API resumable upload protocol
//! followed by polling until the file is `ACTIVE`, and [`TurnCompleter`] with
//! `models/{model}:generateContent`.

pub mod config;
pub mod types;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

pub use config::GeminiConfig;
use types::{
    error_message, Content, FileResource, FileState, GenerateContentRequest,
    GenerateContentResponse, StartUploadFile, StartUploadRequest, UploadResponse,
};

use super::{CompletionError, ExternalRef, IngestionError, MediaIngester, Turn, TurnCompleter};
use crate::models::Role;

const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        info!(model = %config.model, base_url = %config.base_url, "Gemini client initialized");

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn start_upload(
        &self,
        size: usize,
        mime_type: &str,
        display_name: &str,
    ) -> Result<String, IngestionError> {
        let url = format!("{}/upload/v1beta/files", self.config.base());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&StartUploadRequest {
                file: StartUploadFile { display_name },
            })
            .send()
            .await
            .map_err(ingestion_transport)?;

        let response = ingestion_status(response).await?;

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| IngestionError::InvalidResponse("missing upload URL".to_string()))
    }

    async fn upload_bytes(
        &self,
        upload_url: &str,
        content: Bytes,
    ) -> Result<FileResource, IngestionError> {
        let response = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(content)
            .send()
            .await
            .map_err(ingestion_transport)?;

        let response = ingestion_status(response).await?;

        response
            .json::<UploadResponse>()
            .await
            .map(|r| r.file)
            .map_err(|e| IngestionError::InvalidResponse(redacted(e)))
    }

    async fn get_file(&self, name: &str) -> Result<FileResource, IngestionError> {
        let url = format!("{}/v1beta/{}", self.config.base(), name);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(ingestion_transport)?;

        ingestion_status(response)
            .await?
            .json::<FileResource>()
            .await
            .map_err(|e| IngestionError::InvalidResponse(redacted(e)))
    }

    /// Poll until the uploaded file can be referenced in prompts.
    async fn wait_until_active(&self, mut file: FileResource) -> Result<FileResource, IngestionError> {
        let attempts = self.config.file_poll_attempts;

        for attempt in 0..attempts {
            match file.state {
                FileState::Active => return Ok(file),
                FileState::Failed => {
                    return Err(IngestionError::ProcessingFailed { name: file.name })
                }
                FileState::Processing | FileState::StateUnspecified => {
                    debug!(name = %file.name, attempt, "Waiting for media processing");
                    tokio::time::sleep(self.config.file_poll_interval()).await;
                    file = self.get_file(&file.name).await?;
                }
            }
        }

        match file.state {
            FileState::Active => Ok(file),
            FileState::Failed => Err(IngestionError::ProcessingFailed { name: file.name }),
            _ => Err(IngestionError::NotReady {
                name: file.name,
                attempts,
            }),
        }
    }
}

#[async_trait]
impl MediaIngester for GeminiClient {
    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn ingest(
        &self,
        content: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<ExternalRef, IngestionError> {
        let upload_url = self
            .start_upload(content.len(), mime_type, display_name)
            .await?;
        let file = self.upload_bytes(&upload_url, content).await?;
        let file = self.wait_until_active(file).await?;

        info!(name = %file.name, "Media ingested");

        Ok(ExternalRef {
            mime_type: file.mime_type.unwrap_or_else(|| mime_type.to_string()),
            uri: file.uri,
        })
    }
}

#[async_trait]
impl TurnCompleter for GeminiClient {
    #[instrument(skip(self, history, message), fields(model = %self.config.model, turns = history.len()))]
    async fn complete(&self, history: &[Turn], message: &str) -> Result<String, CompletionError> {
        let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
        contents.push(Content::from(&Turn::text(Role::User, message)));

        let request = GenerateContentRequest {
            contents,
            generation_config: self.config.generation.into(),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base(),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(completion_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Completion request rejected");
            return Err(CompletionError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::InvalidResponse(redacted(e))
            }
        })?;

        body.text().ok_or_else(|| CompletionError::EmptyResponse {
            reason: body.finish_reason(),
        })
    }
}

/// Request URLs carry the API key; never let one into a message.
fn redacted(err: reqwest::Error) -> String {
    err.without_url().to_string()
}

fn ingestion_transport(err: reqwest::Error) -> IngestionError {
    IngestionError::Unavailable(redacted(err))
}

fn completion_transport(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Unavailable(redacted(err))
    }
}

async fn ingestion_status(response: reqwest::Response) -> Result<reqwest::Response, IngestionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "Media service rejected request");
    Err(IngestionError::Rejected {
        status: status.as_u16(),
        message: if status == StatusCode::PAYLOAD_TOO_LARGE {
            "media too large".to_string()
        } else {
            error_message(&body)
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, header, headers, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> GeminiClient {
        let mut config = GeminiConfig::new("test-key").with_base_url(server.uri());
        config.file_poll_interval_ms = 1;
        config.file_poll_attempts = 3;
        GeminiClient::new(config).unwrap()
    }

    async fn mount_upload(server: &MockServer, state: &str) {
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .and(query_param("key", "test-key"))
            .and(header("X-Goog-Upload-Command", "start"))
            .and(body_partial_json(json!({"file": {"display_name": "clip.mp4"}})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(UPLOAD_URL_HEADER, format!("{}/resumable/1", server.uri())),
            )
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/resumable/1"))
            .and(headers("X-Goog-Upload-Command", vec!["upload", "finalize"]))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file": {
                    "name": "files/abc123",
                    "uri": format!("{}/v1beta/files/abc123", server.uri()),
                    "mimeType": "video/mp4",
                    "state": state
                }
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn file_json(server: &MockServer, state: &str) -> serde_json::Value {
        json!({
            "name": "files/abc123",
            "uri": format!("{}/v1beta/files/abc123", server.uri()),
            "mimeType": "video/mp4",
            "state": state
        })
    }

    #[tokio::test]
    async fn test_ingest_waits_for_active() {
        let server = MockServer::start().await;
        mount_upload(&server, "PROCESSING").await;

        Mock::given(method("GET"))
            .and(path("/v1beta/files/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_json(&server, "ACTIVE")))
            .expect(1)
            .mount(&server)
            .await;

        let media = client_for(&server)
            .ingest(Bytes::from_static(b"fake video"), "video/mp4", "clip.mp4")
            .await
            .unwrap();

        assert_eq!(media.uri, format!("{}/v1beta/files/abc123", server.uri()));
        assert_eq!(media.mime_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_ingest_failed_processing() {
        let server = MockServer::start().await;
        mount_upload(&server, "FAILED").await;

        let err = client_for(&server)
            .ingest(Bytes::from_static(b"fake video"), "video/mp4", "clip.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::ProcessingFailed { .. }));
    }

    #[tokio::test]
    async fn test_ingest_gives_up_after_attempts() {
        let server = MockServer::start().await;
        mount_upload(&server, "PROCESSING").await;

        Mock::given(method("GET"))
            .and(path("/v1beta/files/abc123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(file_json(&server, "PROCESSING")),
            )
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .ingest(Bytes::from_static(b"fake video"), "video/mp4", "clip.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::NotReady { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_ingest_rejected_start() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .ingest(Bytes::from_static(b"fake video"), "video/mp4", "clip.mp4")
            .await
            .unwrap_err();

        match err {
            IngestionError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_sends_full_history() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [
                    {"role": "user", "parts": [{"fileData": {"mimeType": "video/mp4", "fileUri": "files/abc123"}}]},
                    {"role": "user", "parts": [{"text": "what happens?"}]},
                    {"role": "model", "parts": [{"text": "a cat jumps"}]},
                    {"role": "user", "parts": [{"text": "and then?"}]}
                ],
                "generationConfig": {"topK": 64, "responseMimeType": "text/plain"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "it lands"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![
            Turn::media(ExternalRef {
                uri: "files/abc123".to_string(),
                mime_type: "video/mp4".to_string(),
            }),
            Turn::text(Role::User, "what happens?"),
            Turn::text(Role::Model, "a cat jumps"),
        ];

        let reply = client_for(&server)
            .complete(&history, "and then?")
            .await
            .unwrap();

        assert_eq!(reply, "it lands");
    }

    #[tokio::test]
    async fn test_complete_empty_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&[], "hi").await.unwrap_err();

        assert!(matches!(
            err,
            CompletionError::EmptyResponse { reason: Some(ref r) } if r == "SAFETY"
        ));
    }

    #[tokio::test]
    async fn test_complete_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&[], "hi").await.unwrap_err();

        assert!(matches!(err, CompletionError::Rejected { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_complete_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let mut config = GeminiConfig::new("test-key").with_base_url(server.uri());
        config.request_timeout_secs = 1;
        let client = GeminiClient::new(config).unwrap();

        let err = client.complete(&[], "hi").await.unwrap_err();

        assert!(matches!(err, CompletionError::Timeout));
    }

    #[tokio::test]
    async fn test_transport_errors_do_not_leak_key() {
        // A port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = GeminiClient::new(GeminiConfig::new("secret-key").with_base_url(base_url)).unwrap();

        let err = client.complete(&[], "hi").await.unwrap_err();
        assert!(matches!(err, CompletionError::Unavailable(_)));
        assert!(!err.to_string().contains("secret-key"));

        let err = client
            .ingest(Bytes::from_static(b"video"), "video/mp4", "clip.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::Unavailable(_)));
        assert!(!err.to_string().contains("secret-key"));
    }
}
