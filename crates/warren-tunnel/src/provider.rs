//! Tunnel provider abstraction.
//!
//! The workflow drives a [`TunnelProvider`] rather than a concrete API
//! client so provisioning logic can be exercised against a double and a
//! different provider can be swapped in at the seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Result of creating (or rotating) a tunnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelEndpoint {
    /// Provider-assigned tunnel id.
    pub tunnel_id: String,
    /// Bearer token the data-plane agent authenticates its outbound
    /// connection with.
    pub token: String,
    /// Public hostname, `{slug}.{tunnel-domain}`.
    pub hostname: String,
    /// Provider-assigned DNS record id for the CNAME.
    pub dns_record_id: String,
}

/// Live connection status for a tunnel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunnelStatus {
    /// Open connections from the customer's agent.
    pub connections: Vec<TunnelConnection>,
}

impl TunnelStatus {
    /// A tunnel is considered connected when at least one agent
    /// connection is open.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }
}

/// A single open agent connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConnection {
    /// Connection id.
    #[serde(default)]
    pub id: Option<String>,
    /// Edge location terminating the connection.
    #[serde(default)]
    pub colo_name: Option<String>,
    /// When the connection opened.
    #[serde(default)]
    pub opened_at: Option<String>,
}

/// Remote tunnel lifecycle operations.
#[async_trait]
pub trait TunnelProvider: Send + Sync {
    /// Create a tunnel, its ingress configuration and its DNS record.
    ///
    /// The steps are sequential; a failure aborts without rolling back
    /// earlier steps, so callers must treat partial creation as
    /// possible.
    async fn create_tunnel(&self, org_slug: &str) -> Result<TunnelEndpoint, ProviderError>;

    /// Tear a tunnel down: DNS record first (so the hostname stops
    /// resolving), then live connections, then the tunnel resource.
    /// Already-deleted resources count as success.
    async fn delete_tunnel(
        &self,
        tunnel_id: &str,
        dns_record_id: &str,
    ) -> Result<(), ProviderError>;

    /// Delete-then-create rotation. The provider has no atomic
    /// regenerate primitive, so there is a window during which no
    /// tunnel exists. The hostname is preserved; id, secret and token
    /// are new.
    async fn rotate_tunnel(
        &self,
        org_slug: &str,
        old_tunnel_id: &str,
        old_dns_record_id: &str,
    ) -> Result<TunnelEndpoint, ProviderError>;

    /// Read-only live status. Callers treat failures as best-effort
    /// "disconnected" rather than failing their request.
    async fn tunnel_status(&self, tunnel_id: &str) -> Result<TunnelStatus, ProviderError>;
}
