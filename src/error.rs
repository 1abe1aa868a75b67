// Error taxonomy shared by the query layer, the lineup flow and the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Required user input is missing or malformed. The user can fix it and retry.
    #[error("{0}")]
    Validation(String),

    /// A credential or connection parameter is missing. Fatal for the affected feature.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport, status or decoding failure talking to the generative-text service.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// The requested catalog entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to an end user. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Configuration(_) => {
                "Lineup suggestions are not configured on this server.".to_string()
            }
            AppError::ExternalService(_) => {
                "Failed to get suggestions from the AI service. Please try again later."
                    .to_string()
            }
            AppError::NotFound(what) => format!("{what} not found."),
            AppError::RateLimited(_) => {
                "Too many suggestion requests. Please wait before trying again.".to_string()
            }
            AppError::Database(_) => "Internal server error".to_string(),
        }
    }

    /// Log the error at a level matching its severity.
    pub fn log(&self) {
        match self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Configuration(msg) => tracing::error!("Configuration error: {msg}"),
            AppError::ExternalService(msg) => tracing::warn!("External service error: {msg}"),
            AppError::Validation(_) | AppError::NotFound(_) | AppError::RateLimited(_) => {
                tracing::debug!("Request rejected: {self}")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), Json(json!({ "error": self.user_message() }))).into_response()
    }
}
