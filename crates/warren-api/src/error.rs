//! HTTP error mapping.
//!
//! Configuration and signing-key problems collapse to an opaque 500 so
//! key material and environment details never leak into a response
//! body; the real cause goes to the log.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use warren_licensing::LicenseError;
use warren_tunnel::{ProviderError, WorkflowError};

use crate::models::ErrorBody;

/// API-level errors with an HTTP status for each.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or invalid request input.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid session credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// License key failed verification or lookup. One message for the
    /// whole class, so callers cannot probe which check failed.
    #[error("invalid license")]
    InvalidLicense,

    /// Authenticated but not allowed to act on this organization.
    #[error("forbidden")]
    Forbidden,

    /// Resource does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// Request conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// Too many requests; retry after the given number of seconds.
    #[error("rate limit exceeded, retry in {0}s")]
    RateLimited(u64),

    /// The tunnel provider rejected or failed a remote call.
    #[error("tunnel provider error: {0}")]
    Provider(String),

    /// Opaque server-side failure.
    #[error("internal error")]
    Internal,
}

impl From<LicenseError> for ApiError {
    fn from(e: LicenseError) -> Self {
        match e {
            LicenseError::InvalidTier(tier) => Self::BadRequest(format!("unknown tier: {tier:?}")),
            LicenseError::MissingKey | LicenseError::BadKey(_) => {
                error!(error = %e, "license signing key misconfigured");
                Self::Internal
            }
            LicenseError::Malformed | LicenseError::InvalidSignature | LicenseError::Expired => {
                Self::InvalidLicense
            }
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::OrgNotFound => Self::NotFound("organization not found"),
            WorkflowError::TunnelNotFound => {
                Self::NotFound("no tunnel provisioned for this organization")
            }
            WorkflowError::TunnelExists => {
                Self::Conflict("a tunnel already exists for this organization".into())
            }
            WorkflowError::StaleIdentifiers => {
                Self::Conflict("supplied tunnel identifiers do not match the current record".into())
            }
            WorkflowError::License(e) => e.into(),
            WorkflowError::Provider(e) => match e {
                ProviderError::MissingConfig(var) => {
                    error!(var, "tunnel provider misconfigured");
                    Self::Internal
                }
                other => Self::Provider(other.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, retry_after) = match &self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            Self::Unauthorized | Self::InvalidLicense => (StatusCode::UNAUTHORIZED, None),
            Self::Forbidden => (StatusCode::FORBIDDEN, None),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, None),
            Self::Conflict(_) => (StatusCode::CONFLICT, None),
            Self::RateLimited(secs) => (StatusCode::TOO_MANY_REQUESTS, Some(*secs)),
            Self::Provider(_) => (StatusCode::BAD_GATEWAY, None),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
