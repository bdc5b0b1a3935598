//! Outbound interface to the orchestrator.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::OrchestratorError;
use crate::protocol::{EligibilityRequest, OrchestrationResponse, ResumeRequest};

/// Remote service that picks a secondary bot and relays turns to it.
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// Ask whether one of `request.eligible_bots` wants the action.
    async fn ask_orchestration(
        &self,
        request: EligibilityRequest,
    ) -> Result<OrchestrationResponse, OrchestratorError>;

    /// Hand the action to `request.target_bot` and collect its answer.
    async fn resume_orchestration(
        &self,
        request: ResumeRequest,
    ) -> Result<OrchestrationResponse, OrchestratorError>;
}

/// Bounds every call of the wrapped client. An expired call becomes
/// `OrchestratorError::Timeout`.
pub struct TimeoutClient<C> {
    inner: C,
    timeout: Duration,
}

impl<C> TimeoutClient<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<C: OrchestratorClient> OrchestratorClient for TimeoutClient<C> {
    async fn ask_orchestration(
        &self,
        request: EligibilityRequest,
    ) -> Result<OrchestrationResponse, OrchestratorError> {
        tokio::time::timeout(self.timeout, self.inner.ask_orchestration(request))
            .await
            .map_err(|_| OrchestratorError::Timeout(self.timeout))?
    }

    async fn resume_orchestration(
        &self,
        request: ResumeRequest,
    ) -> Result<OrchestrationResponse, OrchestratorError> {
        tokio::time::timeout(self.timeout, self.inner.resume_orchestration(request))
            .await
            .map_err(|_| OrchestratorError::Timeout(self.timeout))?
    }
}
