//! License issuance endpoint

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use uuid::Uuid;

use warren_licensing::Tier;
use warren_tunnel::ProvisionOutcome;

use crate::auth::Session;
use crate::error::ApiError;
use crate::models::{ErrorBody, LicenseIssueRequest, LicenseIssueResponse, TunnelInfo};
use crate::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/orgs/:org_id/license", post(issue_license))
}

/// Issue a license for an organization and ensure it has a tunnel.
///
/// The new key supersedes any previously stored one. Tunnel creation
/// failure is reported in the body, not as a request failure, since
/// the license half has already been persisted by then.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/license",
    params(("org_id" = Uuid, Path,)),
    request_body = LicenseIssueRequest,
    responses(
        (status = 200, body = LicenseIssueResponse),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody),
    ),
    tag = "licenses"
)]
pub async fn issue_license(
    State(state): State<AppState>,
    session: Session,
    Path(org_id): Path<Uuid>,
    Json(body): Json<LicenseIssueRequest>,
) -> Result<Json<LicenseIssueResponse>, ApiError> {
    session.require_owner(org_id)?;

    // Parse once at the boundary; everything downstream gets the enum.
    let tier = body.tier.parse::<Tier>().map_err(ApiError::from)?;
    if body.months == 0 {
        return Err(ApiError::BadRequest("months must be at least 1".into()));
    }

    let outcome = state
        .workflow
        .issue_license_and_provision(org_id, tier, body.months)
        .await?;

    let response = match outcome {
        ProvisionOutcome::Provisioned {
            license_key,
            tunnel,
        } => LicenseIssueResponse {
            license_key,
            tunnel: Some(TunnelInfo::from_record(tunnel, None)),
            tunnel_error: None,
        },
        ProvisionOutcome::LicensedOnly {
            license_key,
            tunnel_error,
        } => LicenseIssueResponse {
            license_key,
            tunnel: None,
            tunnel_error: Some(tunnel_error),
        },
    };
    Ok(Json(response))
}
