//! Error types for Papersmith services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for each pipeline failure mode
//! - HTTP status code mapping
//! - Structured error responses
//! - Failure classes separating unreachable providers, bad provider output and storage faults

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Authentication errors (2xxx)
    Unauthorized,

    // Resource errors (4xxx)
    NotFound,

    // Conflict errors (5xxx)
    Conflict,

    // Storage errors (7xxx)
    PersistenceFailure,

    // External service errors (8xxx)
    SearchUnavailable,
    SearchProviderError,
    GenerationUnavailable,
    EmptyGeneration,
    ExtractionFailed,
    MalformedJson,
    SchemaMismatch,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::Unauthorized => 2001,

            ErrorCode::NotFound => 4001,

            ErrorCode::Conflict => 5001,

            ErrorCode::PersistenceFailure => 7001,

            ErrorCode::SearchUnavailable => 8001,
            ErrorCode::SearchProviderError => 8002,
            ErrorCode::GenerationUnavailable => 8003,
            ErrorCode::EmptyGeneration => 8004,
            ErrorCode::ExtractionFailed => 8005,
            ErrorCode::MalformedJson => 8006,
            ErrorCode::SchemaMismatch => 8007,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Broad remediation bucket for an error.
///
/// Unreachable providers are worth retrying later; invalid output points at a
/// provider bug or prompt drift; storage failures mean checking database health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Client,
    Unreachable,
    InvalidOutput,
    Storage,
    Internal,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },

    // Search provider
    #[error("Search service unavailable: {message}")]
    SearchUnavailable { message: String },

    #[error("Search provider error: {message}")]
    SearchProviderError {
        status: Option<u16>,
        message: String,
    },

    // Generation provider
    #[error("Generation service unavailable: {message}")]
    GenerationUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("Generation provider returned an empty response")]
    EmptyGeneration,

    // Structured output
    #[error("No JSON object found in generated text")]
    ExtractionFailed,

    #[error("Generated JSON could not be parsed: {source}")]
    MalformedJson {
        #[source]
        source: serde_json::Error,
        candidate: String,
    },

    #[error("Generated paper does not match schema at `{field}`: {reason}")]
    SchemaMismatch { field: String, reason: String },

    // Storage
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] sea_orm::DbErr),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Duplicate { .. } => ErrorCode::Conflict,
            AppError::SearchUnavailable { .. } => ErrorCode::SearchUnavailable,
            AppError::SearchProviderError { .. } => ErrorCode::SearchProviderError,
            AppError::GenerationUnavailable { .. } => ErrorCode::GenerationUnavailable,
            AppError::EmptyGeneration => ErrorCode::EmptyGeneration,
            AppError::ExtractionFailed => ErrorCode::ExtractionFailed,
            AppError::MalformedJson { .. } => ErrorCode::MalformedJson,
            AppError::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            AppError::PersistenceFailure(_) => ErrorCode::PersistenceFailure,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Which remediation bucket this error belongs to
    pub fn failure_class(&self) -> FailureClass {
        match self {
            AppError::Validation { .. }
            | AppError::Unauthorized { .. }
            | AppError::NotFound { .. }
            | AppError::Duplicate { .. } => FailureClass::Client,

            AppError::SearchUnavailable { .. } | AppError::GenerationUnavailable { .. } => {
                FailureClass::Unreachable
            }

            AppError::SearchProviderError { .. }
            | AppError::EmptyGeneration
            | AppError::ExtractionFailed
            | AppError::MalformedJson { .. }
            | AppError::SchemaMismatch { .. } => FailureClass::InvalidOutput,

            AppError::PersistenceFailure(_) => FailureClass::Storage,

            AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_) => FailureClass::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Duplicate { .. } => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::PersistenceFailure(_)
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::SearchProviderError { .. }
            | AppError::EmptyGeneration
            | AppError::ExtractionFailed
            | AppError::MalformedJson { .. }
            | AppError::SchemaMismatch { .. } => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::SearchUnavailable { .. } | AppError::GenerationUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Extra machine-readable context attached to the response body
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation { field: Some(field), .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            AppError::SchemaMismatch { field, .. } => Some(serde_json::json!({ "field": field })),
            AppError::SearchProviderError { status: Some(status), .. }
            | AppError::GenerationUnavailable { status: Some(status), .. } => {
                Some(serde_json::json!({ "upstream_status": status }))
            }
            _ => None,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            if let AppError::MalformedJson { candidate, .. } = &self {
                let preview: String = candidate.chars().take(200).collect();
                tracing::error!(
                    error = %message,
                    code = ?code,
                    status = status.as_u16(),
                    candidate_preview = %preview,
                    "Server error"
                );
            } else {
                tracing::error!(
                    error = %message,
                    code = ?code,
                    class = ?self.failure_class(),
                    status = status.as_u16(),
                    "Server error"
                );
            }
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            message: rejection.body_text(),
            field: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::NotFound {
            resource_type: "user".into(),
            id: "test".into(),
        };
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "topic must not be empty".into(),
            field: Some("topic".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_failure_classes_are_distinct() {
        let unreachable = AppError::SearchUnavailable {
            message: "connection refused".into(),
        };
        let invalid = AppError::SchemaMismatch {
            field: "sections".into(),
            reason: "missing".into(),
        };
        let storage = AppError::PersistenceFailure(sea_orm::DbErr::Custom("disk full".into()));

        assert_eq!(unreachable.failure_class(), FailureClass::Unreachable);
        assert_eq!(invalid.failure_class(), FailureClass::InvalidOutput);
        assert_eq!(storage.failure_class(), FailureClass::Storage);

        assert_eq!(unreachable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(invalid.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_schema_mismatch_names_field() {
        let err = AppError::SchemaMismatch {
            field: "sections[0].content".into(),
            reason: "expected a non-empty string".into(),
        };
        assert!(err.to_string().contains("sections[0].content"));
        assert_eq!(
            err.details(),
            Some(serde_json::json!({ "field": "sections[0].content" }))
        );
    }

    #[test]
    fn test_internal_kinds_are_server_errors() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let errors = [
            AppError::Internal { message: "x".into() },
            AppError::Configuration { message: "missing key".into() },
            AppError::Serialization(bad_json),
        ];

        for err in errors {
            assert_eq!(err.failure_class(), FailureClass::Internal);
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_numeric_codes() {
        assert_eq!(ErrorCode::EmptyGeneration.as_code(), 8004);
        assert_eq!(ErrorCode::PersistenceFailure.as_code(), 7001);
    }
}
