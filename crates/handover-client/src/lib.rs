//! HTTP implementation of [`OrchestratorClient`].
//!
//! Wire protocol:
//!
//! ```text
//! POST {base_url}/orchestration/eligibility   EligibilityRequest ─► OrchestrationResponse | 204
//! POST {base_url}/orchestration/proceed       ResumeRequest      ─► OrchestrationResponse
//! ```
//!
//! Both bodies are JSON. A `204 No Content` answer to an eligibility query
//! means no bot wants the conversation; any non-2xx status is an
//! `OrchestratorError::Status`.

pub mod error;

pub use error::ClientError;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use handover_core::config::OrchestratorConfig;
use handover_core::{
    EligibilityRequest, OrchestrationResponse, OrchestratorClient, OrchestratorError,
    ResumeRequest,
};

const ELIGIBILITY_PATH: &str = "/orchestration/eligibility";
const PROCEED_PATH: &str = "/orchestration/proceed";

#[derive(Debug, Clone)]
pub struct HttpOrchestratorClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpOrchestratorClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        api_token: Option<&str>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.base_url,
            config.timeout(),
            config.api_token.as_deref(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<OrchestrationResponse, OrchestratorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "calling orchestrator");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(OrchestrationResponse::NoEligibleBot);
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(OrchestratorError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| OrchestratorError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> OrchestratorError {
        if e.is_timeout() {
            OrchestratorError::Timeout(self.timeout)
        } else {
            OrchestratorError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl OrchestratorClient for HttpOrchestratorClient {
    async fn ask_orchestration(
        &self,
        request: EligibilityRequest,
    ) -> Result<OrchestrationResponse, OrchestratorError> {
        self.post(ELIGIBILITY_PATH, &request).await
    }

    async fn resume_orchestration(
        &self,
        request: ResumeRequest,
    ) -> Result<OrchestrationResponse, OrchestratorError> {
        let response = self.post(PROCEED_PATH, &request).await?;
        // 204 only has a meaning for eligibility.
        if matches!(response, OrchestrationResponse::NoEligibleBot) {
            return Ok(OrchestrationResponse::Unavailable {
                target_bot: Some(request.target_bot),
                reason: Some("empty response".to_string()),
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests;
