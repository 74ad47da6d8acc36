//! Warren Provisioning API
//!
//! REST surface over the licensing and tunnel-provisioning core.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       PROVISIONING API                         │
//! │                                                                │
//! │  ┌──────────────────────────────────────────────────────────┐  │
//! │  │                       REST API                           │  │
//! │  │  OpenAPI 3.1 | Session JWTs | Rate Limiting              │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! │                                                                │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │
//! │  │  Dashboard   │   │     CLI      │   │  License keys    │   │
//! │  │  (sessions)  │   │  (bootstrap) │   │  (bearer creds)  │   │
//! │  └──────────────┘   └──────────────┘   └──────────────────┘   │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use warren_licensing::LicenseCodec;
use warren_tunnel::{OrganizationStore, ProvisioningWorkflow, TunnelRegistry};

use crate::auth::SessionKeys;
use crate::rate_limit::RateLimiter;

pub use models::*;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Licensing and tunnel orchestration.
    pub workflow: Arc<ProvisioningWorkflow>,
    /// Organization storage.
    pub orgs: Arc<dyn OrganizationStore>,
    /// Tunnel records.
    pub registry: Arc<TunnelRegistry>,
    /// License key codec.
    pub codec: Arc<LicenseCodec>,
    /// Throttle for the CLI bootstrap endpoint.
    pub limiter: Arc<dyn RateLimiter>,
    /// Dashboard session keys.
    pub sessions: Arc<SessionKeys>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warren Provisioning API",
        version = "1.0.0",
        description = "License issuance, CLI bootstrap and tunnel lifecycle",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::license::issue_license,
        routes::provision::provision,
        routes::tunnels::get_tunnel,
        routes::tunnels::create_tunnel,
        routes::tunnels::rotate_tunnel,
        routes::tunnels::delete_tunnel,
    ),
    components(
        schemas(
            HealthResponse, ErrorBody,
            LicenseIssueRequest, LicenseIssueResponse,
            ProvisionResponse,
            TunnelInfo, TunnelEnvelope,
            TunnelCreateRequest, TunnelIdentifiers,
            DeleteResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "licenses", description = "License issuance"),
        (name = "provision", description = "CLI bootstrap handshake"),
        (name = "tunnels", description = "Tunnel lifecycle")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(routes::provision::router())
        .merge(routes::license::router())
        .merge(routes::tunnels::router())
}
