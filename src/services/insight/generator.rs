use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequest, Role,
};
use serde::{Deserialize, Serialize};

use super::reply::parse_reply;
use super::{http_client, upstream_error};
use crate::config::GatewayConfig;
use crate::error::{AppError, GATEWAY_FAILURE_MESSAGE};
use crate::models::{InsightResult, Row};

const SAMPLE_ROWS: usize = 5;

/// What the model gets to see of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSummary<'a> {
    pub file_name: &'a str,
    pub row_count: usize,
    pub columns: Vec<&'a str>,
    pub sample_data: &'a [Row],
}

impl<'a> DataSummary<'a> {
    pub fn new(data: &'a [Row], file_name: &'a str) -> Result<Self, AppError> {
        let first = data
            .first()
            .ok_or_else(|| AppError::InvalidInput("Cannot generate insights for an empty dataset".to_string()))?;
        Ok(Self {
            file_name,
            row_count: data.len(),
            columns: first.keys().collect(),
            sample_data: &data[..data.len().min(SAMPLE_ROWS)],
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ChatReplyChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatReplyChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

/// Server side of the insight endpoint: summarises the rows and asks the
/// chat-completion gateway for insights and an action plan.
#[derive(Debug, Clone)]
pub struct InsightGenerator {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl InsightGenerator {
    pub fn new(config: GatewayConfig) -> Self {
        Self { http: http_client(), config }
    }

    pub async fn generate(&self, data: &[Row], file_name: &str) -> Result<InsightResult, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("AI_GATEWAY_KEY is not configured".to_string()))?;

        let summary = DataSummary::new(data, file_name)?;
        let request = self.build_request(&summary)?;
        let url = format!("{}/chat/completions", self.config.base_url);

        let start = std::time::Instant::now();
        tracing::info!(
            "Requesting insights for {} ({} rows) from model {}",
            file_name,
            summary.row_count,
            self.config.model
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("AI gateway unreachable: {}", e);
                AppError::GatewayFailure(GATEWAY_FAILURE_MESSAGE.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("AI gateway error: {} {}", status, body);
            return Err(upstream_error(
                status.as_u16(),
                AppError::GatewayFailure(GATEWAY_FAILURE_MESSAGE.to_string()),
            ));
        }

        let reply: ChatReply = response.json().await.map_err(|e| {
            tracing::error!("AI gateway returned an unreadable body: {}", e);
            AppError::MalformedReply(e.to_string())
        })?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::MalformedReply("reply has no message content".to_string()))?;

        let result = parse_reply(&content)?;
        tracing::info!(
            "Received {} insights and {} actions in {:?}",
            result.insights.len(),
            result.action_plan.len(),
            start.elapsed()
        );
        Ok(result)
    }

    pub fn build_request(&self, summary: &DataSummary<'_>) -> Result<CreateChatCompletionRequest, AppError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: self.system_prompt(),
                name: None,
                role: Role::System,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(user_prompt(summary)?),
                name: None,
                role: Role::User,
            }),
        ];

        Ok(CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            ..Default::default()
        })
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a data analyst expert. Analyze the provided data and generate actionable insights and recommendations. Keep your response clear, structured, and in {} language.",
            self.config.language
        )
    }
}

fn user_prompt(summary: &DataSummary<'_>) -> Result<String, AppError> {
    let sample = serde_json::to_string(summary.sample_data)
        .map_err(|e| AppError::Internal(format!("Failed to encode sample rows: {}", e)))?;

    Ok(format!(
        r#"Analyze this dataset and provide:
1. Key Insights (3-5 important findings from the data)
2. Action Plan Recommendations (3-5 specific actions to take based on the insights)

Dataset summary:
- File: {file}
- Total rows: {rows}
- Columns: {columns}
- Sample data: {sample}

Format your response as JSON with this structure:
{{
  "insights": ["insight 1", "insight 2", ...],
  "actionPlan": ["action 1", "action 2", ...]
}}"#,
        file = summary.file_name,
        rows = summary.row_count,
        columns = summary.columns.join(", "),
        sample = sample
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                [
                    ("region", Cell::Text(format!("R{i}"))),
                    ("revenue", Cell::Number(i as f64)),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    fn generator() -> InsightGenerator {
        InsightGenerator::new(GatewayConfig {
            base_url: "http://127.0.0.1:9/v1".into(),
            api_key: Some("key".into()),
            model: "test-model".into(),
            language: "Indonesian".into(),
        })
    }

    #[test]
    fn summary_samples_five_rows_and_keeps_count() {
        let data = rows(12);
        let summary = DataSummary::new(&data, "sales.csv").unwrap();
        assert_eq!(summary.row_count, 12);
        assert_eq!(summary.columns, vec!["region", "revenue"]);
        assert_eq!(summary.sample_data.len(), 5);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["fileName"], "sales.csv");
        assert_eq!(json["rowCount"], 12);
        assert_eq!(json["sampleData"][4]["region"], "R4");
    }

    #[test]
    fn empty_data_is_rejected() {
        assert!(matches!(DataSummary::new(&[], "x.csv"), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn request_carries_model_language_and_summary() {
        let data = rows(2);
        let summary = DataSummary::new(&data, "sales.csv").unwrap();
        let request = generator().build_request(&summary).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0]["content"].as_str().unwrap().contains("Indonesian language"));
        let user = json["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("- File: sales.csv"));
        assert!(user.contains("- Columns: region, revenue"));
        assert!(user.contains(r#""actionPlan""#));
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let mut config = generator().config;
        config.api_key = None;
        let err = tokio_test::assert_err!(InsightGenerator::new(config).generate(&rows(1), "a.csv").await);
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_server_error() {
        let err = tokio_test::assert_err!(generator().generate(&rows(2), "a.csv").await);
        assert!(matches!(err, AppError::GatewayFailure(_)));
        assert_eq!(err.to_string(), "AI gateway error");
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
