//! Error types for the Wallarm API client.

use wallarm_core::CoreError;

/// Errors returned by [`crate::WallarmClient`] and other [`crate::RulesApi`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered 404.
    #[error("HTTP Status: 404, Body: {body}")]
    NotFound { body: String },

    /// The object being created is already present.
    #[error("HTTP Status: {status}, already exists: {body}")]
    AlreadyExists { status: u16, body: String },

    /// Any other non-2xx answer.
    #[error("HTTP Status: {status}, Body: {body}")]
    Status { status: u16, body: String },

    #[error("invalid credentials: set either api_token or both api_uuid and api_secret")]
    InvalidCredentials,

    #[error("invalid API host {host:?}: {message}")]
    InvalidHost { host: String, message: String },

    /// A 2xx body that does not have the expected shape.
    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    #[must_use]
    pub fn decode(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { operation, source }
    }

    #[must_use]
    pub fn invalid_host(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHost {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Map a non-success status and its body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => Self::NotFound { body },
            409 => Self::AlreadyExists { status, body },
            400 if is_already_exists_body(&body) => Self::AlreadyExists { status, body },
            _ => Self::Status { status, body },
        }
    }

    /// Returns `true` for the "already deleted" signature.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Status { status, .. } => *status == 404,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::AlreadyExists { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn is_already_exists_body(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("body").and_then(|b| b.as_str()).map(str::to_owned))
        .is_some_and(|b| b.eq_ignore_ascii_case("already exists"))
}

pub type Result<T> = std::result::Result<T, ApiError>;
