//! Warren Tunnel Provisioning
//!
//! Per-organization secure tunnels bridging the cloud control plane to a
//! customer-operated indexing engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  PROVISIONING WORKFLOW                           │
//! │   issue-license-and-provision | ensure | rotate | delete         │
//! │   (per-org advisory locks around every check-then-act sequence)  │
//! └───────┬──────────────────┬─────────────────────┬─────────────────┘
//!         │                  │                     │
//! ┌───────▼───────┐  ┌───────▼────────┐  ┌─────────▼────────┐
//! │ TunnelProvider│  │ TunnelRegistry │  │ OrganizationStore│
//! │  (Cloudflare) │  │ (one row/org)  │  │   (external)     │
//! └───────────────┘  └────────────────┘  └──────────────────┘
//! ```

#![warn(missing_docs)]

pub mod cloudflare;
pub mod error;
pub mod org;
pub mod provider;
pub mod registry;
pub mod workflow;

pub use cloudflare::{CloudflareClient, ProviderConfig};
pub use error::{ProviderError, WorkflowError};
pub use org::{InMemoryOrgStore, Organization, OrganizationStore, OrgId};
pub use provider::{TunnelEndpoint, TunnelProvider, TunnelStatus};
pub use registry::{TunnelRecord, TunnelRegistry};
pub use workflow::{DeleteOutcome, ProvisionOutcome, ProvisioningWorkflow};
