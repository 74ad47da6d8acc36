//! Tunnel registry: one record per organization.
//!
//! Owned exclusively by the provisioning workflow. The insert path
//! enforces at-most-one-tunnel-per-org atomically, so an insert
//! conflict is the idempotency signal rather than a separate
//! check-then-act.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::org::OrgId;
use crate::provider::TunnelEndpoint;

/// Persistent tunnel state for one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelRecord {
    /// Owning organization.
    pub org_id: OrgId,
    /// Provider-assigned tunnel id.
    pub tunnel_id: String,
    /// Public hostname.
    pub hostname: String,
    /// Provider-assigned DNS record id.
    pub dns_record_id: String,
    /// Bearer token the data-plane agent connects with.
    pub token: String,
    /// Optional engine-specific API key forwarded with proxied calls.
    pub engine_api_key: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last rotation or update.
    pub updated_at: DateTime<Utc>,
}

impl TunnelRecord {
    /// Record for a freshly created endpoint.
    pub fn new(org_id: OrgId, endpoint: TunnelEndpoint) -> Self {
        let now = Utc::now();
        Self {
            org_id,
            tunnel_id: endpoint.tunnel_id,
            hostname: endpoint.hostname,
            dns_record_id: endpoint.dns_record_id,
            token: endpoint.token,
            engine_api_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public URL of the tunnel.
    pub fn url(&self) -> String {
        format!("https://{}", self.hostname)
    }
}

/// In-memory tunnel registry.
#[derive(Default)]
pub struct TunnelRegistry {
    records: RwLock<HashMap<OrgId, TunnelRecord>>,
}

impl TunnelRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for an organization, if one exists.
    pub fn get(&self, org_id: OrgId) -> Option<TunnelRecord> {
        self.records.read().get(&org_id).cloned()
    }

    /// Insert a record for an organization that has none.
    ///
    /// Returns the existing record as the error when one is already
    /// present; the uniqueness check and the insert happen under one
    /// write lock.
    pub fn insert_new(&self, record: TunnelRecord) -> Result<TunnelRecord, TunnelRecord> {
        let mut records = self.records.write();
        if let Some(existing) = records.get(&record.org_id) {
            return Err(existing.clone());
        }
        records.insert(record.org_id, record.clone());
        Ok(record)
    }

    /// Overwrite an organization's record in place (rotation), keeping
    /// `created_at` and refreshing `updated_at`.
    pub fn replace(&self, org_id: OrgId, endpoint: TunnelEndpoint) -> Option<TunnelRecord> {
        let mut records = self.records.write();
        let record = records.get_mut(&org_id)?;
        record.tunnel_id = endpoint.tunnel_id;
        record.hostname = endpoint.hostname;
        record.dns_record_id = endpoint.dns_record_id;
        record.token = endpoint.token;
        record.updated_at = Utc::now();
        Some(record.clone())
    }

    /// Remove an organization's record.
    pub fn remove(&self, org_id: OrgId) -> Option<TunnelRecord> {
        self.records.write().remove(&org_id)
    }

    /// Number of registered tunnels.
    pub fn count(&self) -> usize {
        self.records.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn endpoint(id: &str) -> TunnelEndpoint {
        TunnelEndpoint {
            tunnel_id: id.to_string(),
            token: format!("token-{id}"),
            hostname: "acme-corp.tunnel.example.com".to_string(),
            dns_record_id: format!("dns-{id}"),
        }
    }

    #[test]
    fn insert_conflict_returns_existing() {
        let registry = TunnelRegistry::new();
        let org = Uuid::new_v4();

        let first = registry
            .insert_new(TunnelRecord::new(org, endpoint("t1")))
            .unwrap();
        let err = registry
            .insert_new(TunnelRecord::new(org, endpoint("t2")))
            .unwrap_err();
        assert_eq!(err.tunnel_id, first.tunnel_id);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn replace_keeps_created_at() {
        let registry = TunnelRegistry::new();
        let org = Uuid::new_v4();
        let first = registry
            .insert_new(TunnelRecord::new(org, endpoint("t1")))
            .unwrap();

        let rotated = registry.replace(org, endpoint("t2")).unwrap();
        assert_eq!(rotated.tunnel_id, "t2");
        assert_eq!(rotated.created_at, first.created_at);
        assert_eq!(rotated.hostname, first.hostname);
    }

    #[test]
    fn replace_without_record_is_none() {
        let registry = TunnelRegistry::new();
        assert!(registry.replace(Uuid::new_v4(), endpoint("t1")).is_none());
    }

    #[test]
    fn url_is_https_hostname() {
        let record = TunnelRecord::new(Uuid::new_v4(), endpoint("t1"));
        assert_eq!(record.url(), "https://acme-corp.tunnel.example.com");
    }
}
