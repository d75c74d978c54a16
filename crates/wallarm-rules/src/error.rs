//! Errors raised by the rule lifecycle.

use wallarm_api::ApiError;
use wallarm_core::{CoreError, ResourceId};

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The local declaration is invalid.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// An API call failed.
    #[error("{operation} failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    /// A matching rule already exists remotely and must be imported first.
    #[error(
        "rule {id} already exists; import it with `wallarm rules import {id} --type {rule_type}` \
         or enable ignore_existing to adopt it"
    )]
    ImportRequired { id: ResourceId, rule_type: String },

    #[error("rule {0} not found")]
    NotFound(ResourceId),

    #[error("rule {id} has type {actual}, expected {expected}")]
    TypeMismatch {
        id: ResourceId,
        expected: String,
        actual: String,
    },

    #[error("no client id: set client_id in the configuration or on the rule")]
    MissingClientId,
}

impl RuleError {
    /// Wrap an API error with the operation that produced it.
    pub fn api(operation: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| Self::Api { operation, source }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::MissingClientId)
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
