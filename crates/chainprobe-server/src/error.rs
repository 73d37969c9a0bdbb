use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chainprobe_core::{ConfigError, TransportError};

/// Errors surfaced as JSON bodies by the HTTP routes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid network specified")]
    InvalidNetwork,
    /// The request body could not be read as a selector request.
    #[error("{context}: {details}")]
    UnreadableBody {
        context: &'static str,
        details: String,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidNetwork => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": self.to_string() })),
            )
                .into_response(),
            Self::UnreadableBody { context, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": context, "details": details })),
            )
                .into_response(),
        }
    }
}

/// Errors that end a CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
}
