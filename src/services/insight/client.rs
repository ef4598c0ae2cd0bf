use serde::Serialize;

use super::{http_client, upstream_error};
use crate::config::EndpointConfig;
use crate::error::{AppError, INSIGHT_FAILURE_MESSAGE};
use crate::models::{InsightResult, Row};

#[derive(Serialize)]
struct InsightRequestBody<'a> {
    data: &'a [Row],
    #[serde(rename = "fileName")]
    file_name: &'a str,
}

/// Calls a remote insight endpoint with the complete rows. One attempt per
/// call, no retry.
#[derive(Debug, Clone)]
pub struct InsightClient {
    http: reqwest::Client,
    endpoint: EndpointConfig,
}

impl InsightClient {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self { http: http_client(), endpoint }
    }

    pub async fn request(&self, data: &[Row], file_name: &str) -> Result<InsightResult, AppError> {
        tracing::info!("Posting {} rows of {} to {}", data.len(), file_name, self.endpoint.url);

        let mut request = self
            .http
            .post(&self.endpoint.url)
            .json(&InsightRequestBody { data, file_name });
        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Insight endpoint unreachable: {}", e);
            AppError::NetworkFailure(INSIGHT_FAILURE_MESSAGE.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Insight endpoint answered {}", status);
            return Err(upstream_error(
                status.as_u16(),
                AppError::NetworkFailure(INSIGHT_FAILURE_MESSAGE.to_string()),
            ));
        }

        response.json::<InsightResult>().await.map_err(|e| {
            tracing::warn!("Insight endpoint returned an unreadable body: {}", e);
            AppError::NetworkFailure(INSIGHT_FAILURE_MESSAGE.to_string())
        })
    }
}
