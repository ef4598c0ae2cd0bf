pub mod client;
pub mod generator;
pub mod reply;

pub use client::InsightClient;
pub use generator::{DataSummary, InsightGenerator};

use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{InsightResult, Row};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Maps a non-success upstream status: 429 and 402 keep their meaning,
/// everything else becomes `fallback`.
pub fn upstream_error(status: u16, fallback: AppError) -> AppError {
    match status {
        429 => AppError::RateLimited,
        402 => AppError::PaymentRequired,
        _ => fallback,
    }
}

/// Where upload sessions get their insights from.
#[derive(Debug, Clone)]
pub enum InsightBackend {
    Remote(InsightClient),
    Local(InsightGenerator),
    Disabled,
}

impl InsightBackend {
    /// A configured remote endpoint wins, then the in-process generator when
    /// a gateway key is present.
    pub fn from_config(config: &Config) -> Self {
        if let Some(endpoint) = &config.insight_endpoint {
            tracing::info!("Insights served by remote endpoint {}", endpoint.url);
            return InsightBackend::Remote(InsightClient::new(endpoint.clone()));
        }
        if config.gateway.api_key.is_some() {
            tracing::info!("Insights generated in-process with {}", config.gateway.model);
            return InsightBackend::Local(InsightGenerator::new(config.gateway.clone()));
        }
        tracing::info!("No insight backend configured; insights disabled");
        InsightBackend::Disabled
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, InsightBackend::Disabled)
    }

    pub async fn generate(&self, data: &[Row], file_name: &str) -> Result<InsightResult, AppError> {
        match self {
            InsightBackend::Remote(client) => client.request(data, file_name).await,
            InsightBackend::Local(generator) => generator.generate(data, file_name).await,
            InsightBackend::Disabled => Err(AppError::Config("insights are disabled".to_string())),
        }
    }
}
