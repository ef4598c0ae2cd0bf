use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;

pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Unsupported file format. Use .xlsx or .csv";
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
pub const PAYMENT_REQUIRED_MESSAGE: &str = "Payment required. Please add credits to continue.";
pub const INSIGHT_FAILURE_MESSAGE: &str = "Failed to generate insights. Please try again.";
pub const GATEWAY_FAILURE_MESSAGE: &str = "AI gateway error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidFileType(String),
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },
    #[error("Parse error: {0}")]
    ParseFailure(String),
    #[error("{0}")]
    NetworkFailure(String),
    #[error("{0}")]
    GatewayFailure(String),
    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,
    #[error("{}", PAYMENT_REQUIRED_MESSAGE)]
    PaymentRequired,
    #[error("Export failed: {0}")]
    ExportFailure(String),
    #[error("Malformed model reply: {0}")]
    MalformedReply(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ParseFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::GatewayFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            AppError::ExportFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MalformedReply(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ParseFailure(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_payment_messages_are_distinct() {
        assert_eq!(AppError::RateLimited.to_string(), RATE_LIMITED_MESSAGE);
        assert_eq!(AppError::PaymentRequired.to_string(), PAYMENT_REQUIRED_MESSAGE);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::PaymentRequired.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn gateway_failures_are_server_errors() {
        let err = AppError::GatewayFailure(GATEWAY_FAILURE_MESSAGE.to_string());
        assert_eq!(err.to_string(), "AI gateway error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::NetworkFailure("x".into()).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn invalid_file_type_keeps_user_message() {
        let err = AppError::InvalidFileType(UNSUPPORTED_FORMAT_MESSAGE.to_string());
        assert_eq!(err.to_string(), UNSUPPORTED_FORMAT_MESSAGE);
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
