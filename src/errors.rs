use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Body returned for every failure whose details stay server-side.
pub const GENERIC_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Network failure talking to the provider (DNS, TLS, timeout).
    Transport(String),
    /// Provider answered non-2xx with a readable `<Message>`.
    UpstreamBusiness {
        /// Status code the provider answered with.
        status: StatusCode,
        /// The provider's own message, passed through verbatim.
        message: String,
    },
    /// Provider broke its contract: unreadable error body, missing `Uri`, etc.
    UpstreamProtocol(String),
    /// Anything else that went wrong while handling the request.
    Internal(String),
    /// Inbound body could not be read as the expected JSON.
    BadRequest(String),
    /// Request came from an origin other than the configured one.
    UnauthorizedOrigin(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Strips every context layer and returns the underlying error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::UpstreamBusiness { status, message } => {
                write!(f, "Provider error ({}): {}", status, message)
            }
            AppError::UpstreamProtocol(msg) => write!(f, "Provider protocol error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::UnauthorizedOrigin(origin) => write!(f, "Unauthorized origin: {}", origin),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and a `{"error": ...}` body.
    ///
    /// Only provider business errors reach the client verbatim; everything
    /// else is logged here and answered with a generic message.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Transport(msg) => {
                tracing::error!("Provider transport error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_ERROR_MESSAGE.to_string(),
                )
            }
            AppError::UpstreamBusiness { status, message } => {
                tracing::warn!("Provider rejected request ({}): {}", status, message);
                (*status, message.clone())
            }
            AppError::UpstreamProtocol(msg) => {
                tracing::error!("Provider protocol error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_ERROR_MESSAGE.to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_ERROR_MESSAGE.to_string(),
                )
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::UnauthorizedOrigin(origin) => {
                tracing::warn!("Rejected request from origin {:?}", origin);
                (StatusCode::FORBIDDEN, "Unauthorized".to_string())
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                // Delegate to underlying error's response
                return (**source).clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<roxmltree::Error> for AppError {
    fn from(err: roxmltree::Error) -> Self {
        AppError::Internal(format!("Malformed provider XML: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
