//! Organization model and store interface.
//!
//! Organizations are owned by an external CRUD layer; this core only
//! reads them and writes the license fields, so the store is a trait
//! with an in-memory default used by the service binary and tests.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use warren_licensing::Tier;

/// Organization id.
pub type OrgId = Uuid;

/// A billing and access-control unit; owns zero or one tunnel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Unique id.
    pub id: OrgId,
    /// Unique, DNS-label-safe slug. Tunnel hostnames and license
    /// subjects are derived from it at provisioning/issuance time.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Subscription tier.
    pub tier: Tier,
    /// Last-issued license key, stored verbatim. Doubles as the lookup
    /// key for the CLI bootstrap handshake.
    pub license_key: Option<String>,
    /// Expiry of the stored license key.
    pub license_expires_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// New unlicensed organization.
    pub fn new(slug: &str, name: &str, tier: Tier) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            tier,
            license_key: None,
            license_expires_at: None,
        }
    }

    /// DNS-label-safe slug check: `^[a-z0-9-]+$`.
    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

/// Read/write access to organizations, scoped to what this core needs.
pub trait OrganizationStore: Send + Sync {
    /// Fetch by id.
    fn get(&self, id: OrgId) -> Option<Organization>;

    /// Fetch by verbatim stored license key.
    ///
    /// License tokens are cryptographically verifiable but are also
    /// used as an opaque equality key into storage; both checks must
    /// pass on the bootstrap path.
    fn find_by_license_key(&self, license_key: &str) -> Option<Organization>;

    /// Persist a freshly issued license onto the organization.
    fn set_license(
        &self,
        id: OrgId,
        license_key: &str,
        tier: Tier,
        expires_at: DateTime<Utc>,
    ) -> bool;

    /// Insert an organization (seeding and tests).
    fn insert(&self, org: Organization);
}

/// In-memory organization store.
#[derive(Default)]
pub struct InMemoryOrgStore {
    orgs: RwLock<HashMap<OrgId, Organization>>,
}

impl InMemoryOrgStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrganizationStore for InMemoryOrgStore {
    fn get(&self, id: OrgId) -> Option<Organization> {
        self.orgs.read().get(&id).cloned()
    }

    fn find_by_license_key(&self, license_key: &str) -> Option<Organization> {
        self.orgs
            .read()
            .values()
            .find(|o| o.license_key.as_deref() == Some(license_key))
            .cloned()
    }

    fn set_license(
        &self,
        id: OrgId,
        license_key: &str,
        tier: Tier,
        expires_at: DateTime<Utc>,
    ) -> bool {
        let mut orgs = self.orgs.write();
        match orgs.get_mut(&id) {
            Some(org) => {
                org.license_key = Some(license_key.to_string());
                org.tier = tier;
                org.license_expires_at = Some(expires_at);
                true
            }
            None => false,
        }
    }

    fn insert(&self, org: Organization) {
        self.orgs.write().insert(org.id, org);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation() {
        assert!(Organization::is_valid_slug("acme-corp"));
        assert!(Organization::is_valid_slug("a1"));
        assert!(!Organization::is_valid_slug(""));
        assert!(!Organization::is_valid_slug("Acme"));
        assert!(!Organization::is_valid_slug("acme_corp"));
        assert!(!Organization::is_valid_slug("acme.corp"));
    }

    #[test]
    fn license_lookup_is_verbatim() {
        let store = InMemoryOrgStore::new();
        let org = Organization::new("acme-corp", "Acme", Tier::Pro);
        let id = org.id;
        store.insert(org);

        assert!(store.set_license(id, "tok-123", Tier::Pro, Utc::now()));
        assert_eq!(store.find_by_license_key("tok-123").unwrap().id, id);
        assert!(store.find_by_license_key("tok-12").is_none());

        // Re-issuance supersedes the stored key.
        assert!(store.set_license(id, "tok-456", Tier::Enterprise, Utc::now()));
        assert!(store.find_by_license_key("tok-123").is_none());
        let org = store.find_by_license_key("tok-456").unwrap();
        assert_eq!(org.tier, Tier::Enterprise);
    }

    #[test]
    fn set_license_on_missing_org_fails() {
        let store = InMemoryOrgStore::new();
        assert!(!store.set_license(Uuid::new_v4(), "tok", Tier::Free, Utc::now()));
    }
}
