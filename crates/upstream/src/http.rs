// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! REST client for the back-office residuals API.

use crate::backend::ResidualsBackend;
use crate::error::UpstreamError;
use async_trait::async_trait;
use reqwest::StatusCode;
use residuals_domain::{
    AssignmentSummary, AuditResult, AuditRunResult, LeadSheetStatus, PeriodKey, SourceStatus,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Wire form of the assignment summary.
///
/// Every field is optional so a summary that is still being computed can be
/// told apart from one that reports zero.
#[derive(Debug, Deserialize)]
struct AssignmentSummaryBody {
    loaded: Option<bool>,
    unassigned_count: Option<u64>,
    previously_assigned_count: Option<u64>,
}

impl AssignmentSummaryBody {
    const fn into_summary(self) -> AssignmentSummary {
        match (
            self.loaded,
            self.unassigned_count,
            self.previously_assigned_count,
        ) {
            (Some(false), _, _) | (_, None, _) | (_, _, None) => AssignmentSummary::pending(),
            (_, Some(unassigned), Some(previously_assigned)) => {
                AssignmentSummary::loaded(unassigned, previously_assigned)
            }
        }
    }
}

/// `ResidualsBackend` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpBackend {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the back-office API, e.g. `https://backoffice.example.com/api`
    /// * `api_token` - Opaque credential sent as a bearer token
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the client cannot be built.
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let trimmed: &str = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(UpstreamError::InvalidUrl(base_url.to_string()));
        }

        let client: reqwest::Client = reqwest::Client::builder()
            .user_agent(concat!("residuals/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
            api_token: api_token.to_string(),
        })
    }

    fn url(&self, period: PeriodKey, path: &str) -> String {
        format!("{}/residuals/{period}/{path}", self.base_url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamError> {
        let response: reqwest::Response = request.bearer_auth(&self.api_token).send().await?;
        let status: StatusCode = response.status();

        if !status.is_success() {
            let body: String = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, UpstreamError> {
        let body: String = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        debug!(url = %url, "GET");
        let response: reqwest::Response = self.send(self.client.get(url)).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl ResidualsBackend for HttpBackend {
    async fn source_statuses(&self, period: PeriodKey) -> Result<Vec<SourceStatus>, UpstreamError> {
        self.get_json(&self.url(period, "sources")).await
    }

    async fn lead_sheet_status(&self, period: PeriodKey) -> Result<LeadSheetStatus, UpstreamError> {
        self.get_json(&self.url(period, "lead-sheet")).await
    }

    async fn assignment_summary(
        &self,
        period: PeriodKey,
    ) -> Result<AssignmentSummary, UpstreamError> {
        let url: String = self.url(period, "assignments/summary");
        debug!(url = %url, "GET");

        let response: reqwest::Response = self.send(self.client.get(&url)).await?;
        if matches!(
            response.status(),
            StatusCode::ACCEPTED | StatusCode::NO_CONTENT
        ) {
            return Ok(AssignmentSummary::pending());
        }

        let body: AssignmentSummaryBody = Self::decode(response).await?;
        Ok(body.into_summary())
    }

    async fn audit_results(&self, period: PeriodKey) -> Result<Vec<AuditResult>, UpstreamError> {
        self.get_json(&self.url(period, "audits")).await
    }

    async fn run_audit(&self, period: PeriodKey) -> Result<AuditRunResult, UpstreamError> {
        let url: String = self.url(period, "audits/run");
        debug!(url = %url, "POST");

        let response: reqwest::Response = self.send(self.client.post(&url)).await?;
        Self::decode(response).await
    }
}
