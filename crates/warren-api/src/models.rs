//! Request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use warren_tunnel::TunnelRecord;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// License issuance request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LicenseIssueRequest {
    /// Subscription tier label: "free", "pro" or "enterprise".
    pub tier: String,
    /// License duration in 30-day months.
    pub months: u32,
}

/// License issuance response.
///
/// `tunnel` and `tunnelError` are mutually exclusive: the license half
/// always succeeded when this body is returned, and exactly one of the
/// two fields reports how the tunnel half went.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LicenseIssueResponse {
    /// The freshly minted license key.
    pub license_key: String,
    /// The organization's tunnel, when present or freshly created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<TunnelInfo>,
    /// Why tunnel creation failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_error: Option<String>,
}

/// Tunnel details exposed to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TunnelInfo {
    /// Provider-assigned tunnel id.
    pub tunnel_id: String,
    /// Public hostname.
    pub hostname: String,
    /// Public URL.
    pub url: String,
    /// Agent connector token.
    pub token: String,
    /// Provider-assigned DNS record id.
    pub dns_record_id: String,
    /// Live connectivity, when the handler looked it up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TunnelInfo {
    /// Build from a registry record, optionally with live status.
    pub fn from_record(record: TunnelRecord, connected: Option<bool>) -> Self {
        Self {
            url: record.url(),
            tunnel_id: record.tunnel_id,
            hostname: record.hostname,
            token: record.token,
            dns_record_id: record.dns_record_id,
            connected,
            created_at: record.created_at,
        }
    }
}

/// Wrapper for tunnel reads, so "no tunnel" is a 200 with `null`
/// rather than a 404.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TunnelEnvelope {
    /// The organization's tunnel, if one is provisioned.
    pub tunnel: Option<TunnelInfo>,
}

/// Tunnel creation request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TunnelCreateRequest {
    /// The organization's slug; must match the stored one.
    pub org_slug: String,
}

/// Identifiers a caller last read, for rotation and deletion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TunnelIdentifiers {
    /// Provider-assigned tunnel id.
    pub tunnel_id: String,
    /// Provider-assigned DNS record id.
    pub dns_record_id: String,
}

/// Tunnel deletion response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// Always true; the local record is gone.
    pub deleted: bool,
    /// Present when the remote teardown was incomplete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// CLI bootstrap handshake response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    /// Agent connector token for the data plane.
    pub tunnel_token: String,
    /// Public URL of the tunnel.
    pub tunnel_url: String,
    /// Organization slug from the license subject.
    pub org_slug: String,
    /// Subscription tier label.
    pub tier: String,
    /// Maximum indexed repositories.
    pub max_repos: u32,
    /// Maximum seats.
    pub max_users: u32,
}
