//! Warren Licensing
//!
//! Signed, tiered license keys for self-hosted deployments.
//!
//! A license is a compact ES256-signed token carrying the customer's
//! identity (organization slug), subscription tier and the numeric
//! entitlement limits for that tier. Tokens are minted on demand, never
//! persisted by this crate, and superseded (not revoked) by issuing a
//! new one.

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod tier;

pub use codec::{LicenseClaims, LicenseCodec};
pub use error::LicenseError;
pub use tier::{limits_for_tier, Tier, TierLimits, UNLIMITED};
