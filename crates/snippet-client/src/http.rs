//! reqwest-backed client for the execution service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error};

use snippet_core::config::backend::BackendConfig;
use snippet_core::error::{AppError, ErrorKind};
use snippet_core::result::AppResult;

use crate::backend::AssignmentBackend;
use crate::types::{ExecuteRequest, ExecuteResponse, PreviewRequest};

const EXECUTE_PATH: &str = "/internal-seats/api/assignments/execute/";
const PREVIEW_PATH: &str = "/internal-seats/api/assignments/preview/";

/// HTTP client for the execution service.
#[derive(Debug, Clone)]
pub struct HttpAssignmentBackend {
    base_url: String,
    http: reqwest::Client,
    preview_timeout: Duration,
}

impl HttpAssignmentBackend {
    /// Build a client from configuration.
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            preview_timeout: config.preview_timeout(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::with_source(ErrorKind::Timeout, format!("Request timed out: {e}"), e)
    } else {
        AppError::with_source(ErrorKind::ExternalService, format!("Request failed: {e}"), e)
    }
}

async fn status_error(response: reqwest::Response) -> AppError {
    let status: StatusCode = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::external_service(format!("Backend returned {status}: {body}"))
}

#[async_trait]
impl AssignmentBackend for HttpAssignmentBackend {
    async fn execute(&self, request: &ExecuteRequest, timeout: Duration) -> AppResult<ExecuteResponse> {
        debug!(
            snippet_id = %request.snippet_id,
            units = request.assignments.len(),
            "Sending assignment batch"
        );

        let response = self
            .http
            .post(self.url(EXECUTE_PATH))
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response.json::<ExecuteResponse>().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, format!("Invalid execute response: {e}"), e)
        })
    }

    async fn preview(&self, request: &PreviewRequest) -> AppResult<serde_json::Value> {
        let result = async {
            let response = self
                .http
                .post(self.url(PREVIEW_PATH))
                .json(request)
                .timeout(self.preview_timeout)
                .send()
                .await
                .map_err(transport_error)?;

            if !response.status().is_success() {
                return Err(status_error(response).await);
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(transport_error)
        }
        .await;

        result.map_err(|e| {
            error!(error = %e, "Failed to preview assignment");
            AppError::with_source(ErrorKind::ExternalService, "Failed to preview assignment", e)
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snippet_entity::assignment::{AssignmentUnit, WorkItem};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpAssignmentBackend {
        HttpAssignmentBackend::new(&BackendConfig {
            base_url: format!("{}/", server.uri()),
            ..BackendConfig::default()
        })
        .unwrap()
    }

    fn execute_request() -> ExecuteRequest {
        ExecuteRequest {
            snippet_id: "s1".into(),
            assignments: vec![AssignmentUnit::new("league", "nba")],
            category_types: vec!["league".into()],
            snippet_variation_types: Some(vec!["SLIM".into()]),
            locale: "en_GB".into(),
            snippet_variations: None,
            use_native_logic: true,
        }
    }

    #[tokio::test]
    async fn execute_posts_batch_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EXECUTE_PATH))
            .and(body_partial_json(json!({
                "snippetId": "s1",
                "useNativeLogic": true,
                "snippetVariationTypes": ["SLIM"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "results": {"processed": 1, "failed": 0, "errors": []},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = backend(&server)
            .execute(&execute_request(), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.processed(), Some(1));
    }

    #[tokio::test]
    async fn execute_maps_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EXECUTE_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .execute(&execute_request(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert!(err.message.contains("502"));
    }

    #[tokio::test]
    async fn execute_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EXECUTE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = backend(&server)
            .execute(&execute_request(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn preview_returns_body_untouched() {
        let server = MockServer::start().await;
        let body = json!({"affectedCategories": [], "totalCount": 0});
        Mock::given(method("POST"))
            .and(path(PREVIEW_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let request = PreviewRequest {
            assignments: vec![WorkItem::new("league", ["nba"])],
            category_types: vec!["league".into()],
            locale: "en_GB".into(),
        };
        assert_eq!(backend(&server).preview(&request).await.unwrap(), body);
    }

    #[tokio::test]
    async fn preview_failure_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PREVIEW_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let request = PreviewRequest {
            assignments: vec![],
            category_types: vec![],
            locale: "en_GB".into(),
        };
        let err = backend(&server).preview(&request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert_eq!(err.message, "Failed to preview assignment");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = HttpAssignmentBackend::new(&BackendConfig {
            base_url: "http://backend:8000/".into(),
            ..BackendConfig::default()
        })
        .unwrap();
        assert_eq!(backend.base_url(), "http://backend:8000");
        assert_eq!(
            backend.url(EXECUTE_PATH),
            "http://backend:8000/internal-seats/api/assignments/execute/"
        );
    }
}
