use http::StatusCode;
use thiserror::Error;

use crate::spi::AccessDenied;

/// Errors raised while obtaining a decision from the OPA backend.
///
/// Denial is deliberately not represented here: a policy saying "no" is a
/// regular verdict ([`AccessDenied`]), while every `OpaError` variant means
/// the bridge could not obtain a trustworthy verdict at all. Operators can
/// tell a misconfigured policy ([`OpaError::PolicyNotFound`]) apart from an
/// unreachable server ([`OpaError::QueryFailed`]) by the variant.
#[derive(Debug, Error)]
pub enum OpaError {
    #[error("Failed to query OPA backend: {0}")]
    QueryFailed(#[source] reqwest::Error),

    #[error("Failed to serialize OPA query input: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Failed to deserialize OPA policy response: {reason}")]
    DeserializeFailed { reason: String },

    #[error("OPA policy at {policy_uri} did not return a value (or does not exist)")]
    PolicyNotFound { policy_uri: String },

    #[error("OPA server returned status {status} when processing policy {policy_uri}: {body}")]
    OpaServerError {
        policy_uri: String,
        status: StatusCode,
        body: String,
    },

    /// A programming error inside the bridge, e.g. building an action that
    /// carries both a resource and a filter-resource list.
    #[error("OPA access control internal error: {0}")]
    Internal(String),
}

/// The error surface of every access control callback.
#[derive(Debug, Error)]
pub enum AccessControlError {
    /// The policy evaluated the request and disallowed it.
    #[error(transparent)]
    Denied(#[from] AccessDenied),

    /// The verdict could not be obtained.
    #[error(transparent)]
    Opa(#[from] OpaError),
}
