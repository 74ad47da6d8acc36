//! CLI bootstrap handshake.
//!
//! A fresh install presents its license key as a bearer credential and
//! receives everything it needs to bring the data plane up. Every
//! failure on the verification-and-lookup path returns the same
//! "invalid license" message; only a missing tunnel is distinguishable,
//! because the fix for that is on the operator side.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::error::ApiError;
use crate::models::{ErrorBody, ProvisionResponse};
use crate::rate_limit::RateDecision;
use crate::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/provision", post(provision))
}

/// Exchange a license key for tunnel credentials and plan limits.
#[utoipa::path(
    post,
    path = "/api/v1/provision",
    responses(
        (status = 200, body = ProvisionResponse),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 429, body = ErrorBody),
    ),
    tag = "provision"
)]
pub async fn provision(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProvisionResponse>, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let license_key = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    // Counted before verification so forged keys burn the budget too.
    if let RateDecision::Limited { retry_after } = state.limiter.allow(license_key) {
        return Err(ApiError::RateLimited(retry_after.as_secs().max(1)));
    }

    let claims = state.codec.verify(license_key)?;

    // The key must also be the one currently stored; a superseded or
    // never-issued key fails with the same message as a forged one.
    let org = state
        .orgs
        .find_by_license_key(license_key)
        .ok_or(ApiError::InvalidLicense)?;

    let record = state
        .registry
        .get(org.id)
        .ok_or(ApiError::NotFound(
            "no tunnel provisioned for this organization, contact support",
        ))?;

    info!(org = %org.slug, tier = %claims.tier, "bootstrap handshake completed");
    Ok(Json(ProvisionResponse {
        tunnel_token: record.token.clone(),
        tunnel_url: record.url(),
        org_slug: claims.sub,
        tier: claims.tier.to_string(),
        max_repos: claims.max_repos,
        max_users: claims.max_users,
    }))
}
