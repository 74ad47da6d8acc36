//! Licensing error taxonomy.

use thiserror::Error;

/// Errors produced when issuing or verifying license keys.
///
/// The three verification failures (`Malformed`, `InvalidSignature`,
/// `Expired`) deliberately share the same display text so an external
/// caller cannot distinguish which check failed. Callers that need to
/// log the real cause can still match on the variant.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// No signing key configured (`LICENSE_SIGNING_KEY` unset).
    #[error("license signing key is not configured (set LICENSE_SIGNING_KEY)")]
    MissingKey,

    /// The configured key could not be parsed as an EC P-256 PEM.
    #[error("license signing key is not a valid EC P-256 PEM: {0}")]
    BadKey(String),

    /// Requested tier is not one of the closed enum.
    #[error("unknown tier: {0:?}")]
    InvalidTier(String),

    /// Token could not be decoded at all.
    #[error("invalid license")]
    Malformed,

    /// Signature mismatch, or the token was signed with a non-pinned
    /// algorithm.
    #[error("invalid license")]
    InvalidSignature,

    /// Token is past its expiry.
    #[error("invalid license")]
    Expired,
}

impl LicenseError {
    /// True for the collapsed "invalid license" class of failures.
    pub fn is_invalid_license(&self) -> bool {
        matches!(
            self,
            Self::Malformed | Self::InvalidSignature | Self::Expired
        )
    }
}
