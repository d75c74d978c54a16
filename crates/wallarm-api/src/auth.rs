use std::fmt;

use crate::error::{ApiError, Result};

pub const TOKEN_HEADER: &str = "X-WallarmAPI-Token";
pub const UUID_HEADER: &str = "X-WallarmAPI-UUID";
pub const SECRET_HEADER: &str = "X-WallarmAPI-Secret";

/// API credentials, sent as custom headers on every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    UuidSecret { uuid: String, secret: String },
}

impl Credentials {
    /// Pick credentials from optional parts. A token wins over a uuid/secret pair.
    pub fn from_parts(
        token: Option<&str>,
        uuid: Option<&str>,
        secret: Option<&str>,
    ) -> Result<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }
        match (present(token), present(uuid), present(secret)) {
            (Some(token), _, _) => Ok(Self::Token(token.to_string())),
            (None, Some(uuid), Some(secret)) => Ok(Self::UuidSecret {
                uuid: uuid.to_string(),
                secret: secret.to_string(),
            }),
            _ => Err(ApiError::InvalidCredentials),
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Token(token) => vec![(TOKEN_HEADER, token.as_str())],
            Self::UuidSecret { uuid, secret } => {
                vec![(UUID_HEADER, uuid.as_str()), (SECRET_HEADER, secret.as_str())]
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Credentials::Token(***)"),
            Self::UuidSecret { uuid, .. } => f
                .debug_struct("Credentials::UuidSecret")
                .field("uuid", uuid)
                .field("secret", &"***")
                .finish(),
        }
    }
}
