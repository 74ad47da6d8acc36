//! Tunnel provisioning error taxonomy.

use thiserror::Error;
use warren_licensing::LicenseError;

/// Errors from the tunnel provider client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required configuration variable is unset.
    #[error("missing provider configuration: {0} is not set")]
    MissingConfig(&'static str),

    /// The provider could not be reached.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-success response.
    ///
    /// Carries the provider's own diagnostic when the body was
    /// parseable; operators need it to debug the integration.
    #[error("provider returned {status} during {operation}: {message}")]
    Api {
        /// HTTP status from the provider.
        status: u16,
        /// Which remote operation failed.
        operation: &'static str,
        /// Provider-supplied error message, or the raw body.
        message: String,
    },
}

/// Errors from the provisioning workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Organization does not exist.
    #[error("organization not found")]
    OrgNotFound,

    /// Organization has no provisioned tunnel.
    #[error("no tunnel provisioned for this organization")]
    TunnelNotFound,

    /// A tunnel already exists for this organization.
    #[error("a tunnel already exists for this organization")]
    TunnelExists,

    /// Supplied tunnel/DNS identifiers do not match the current record.
    ///
    /// Returned before any provider call when a caller rotates or
    /// deletes with identifiers from a stale read.
    #[error("supplied tunnel identifiers do not match the current record")]
    StaleIdentifiers,

    /// Licensing failure.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// Provider failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
