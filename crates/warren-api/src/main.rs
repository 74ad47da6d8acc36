//! Warren Provisioning API service binary.

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use warren_api::auth::SessionKeys;
use warren_api::rate_limit::FixedWindowLimiter;
use warren_api::{build_router, AppState};
use warren_licensing::{LicenseCodec, Tier};
use warren_tunnel::{
    CloudflareClient, InMemoryOrgStore, Organization, OrganizationStore, ProvisioningWorkflow,
    TunnelRegistry,
};

const DEV_SESSION_SECRET: &str = "warren-dev-session-secret-change-in-production";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let codec = match LicenseCodec::from_env() {
        Ok(codec) => Arc::new(codec),
        Err(e) => {
            tracing::error!(error = %e, "cannot start without a usable signing key");
            std::process::exit(1);
        }
    };

    let session_secret =
        std::env::var("SESSION_SECRET").unwrap_or_else(|_| DEV_SESSION_SECRET.into());
    let sessions = Arc::new(SessionKeys::from_secret(session_secret.as_bytes()));

    let provider = Arc::new(CloudflareClient::new());
    let registry = Arc::new(TunnelRegistry::new());
    let orgs: Arc<dyn OrganizationStore> = Arc::new(InMemoryOrgStore::new());
    seed_demo_org(orgs.as_ref(), &sessions);

    let workflow = Arc::new(ProvisioningWorkflow::new(
        provider,
        registry.clone(),
        orgs.clone(),
        codec.clone(),
    ));

    let state = AppState {
        workflow,
        orgs,
        registry,
        codec,
        limiter: Arc::new(FixedWindowLimiter::new(5, Duration::from_secs(60))),
        sessions,
    };
    let app = build_router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    tracing::info!("Provisioning API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Seed a demo organization and log an owner session token, so a local
/// deployment is usable without a login flow in front of it.
fn seed_demo_org(orgs: &dyn OrganizationStore, sessions: &SessionKeys) {
    let org = Organization::new("demo-org", "Demo Org", Tier::Free);
    let org_id = org.id;
    orgs.insert(org);

    match sessions.create_token(Uuid::new_v4(), org_id, "owner@demo-org.local", "owner") {
        Ok(token) => {
            tracing::info!(org_id = %org_id, "seeded demo organization");
            tracing::info!("demo owner session token: {}", token);
        }
        Err(e) => tracing::warn!(error = %e, "failed to mint demo session token"),
    }
}
