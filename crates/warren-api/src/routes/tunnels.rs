//! Tunnel lifecycle endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use warren_tunnel::{DeleteOutcome, Organization};

use crate::auth::Session;
use crate::error::ApiError;
use crate::models::{
    DeleteResponse, ErrorBody, TunnelCreateRequest, TunnelEnvelope, TunnelIdentifiers, TunnelInfo,
};
use crate::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route(
        "/orgs/:org_id/tunnel",
        get(get_tunnel)
            .post(create_tunnel)
            .patch(rotate_tunnel)
            .delete(delete_tunnel),
    )
}

/// Read the organization's tunnel with live connectivity.
///
/// Absence is a normal state for the dashboard, so it is reported in
/// the body rather than as a 404.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/tunnel",
    params(("org_id" = Uuid, Path,)),
    responses(
        (status = 200, body = TunnelEnvelope),
        (status = 403, body = ErrorBody),
    ),
    tag = "tunnels"
)]
pub async fn get_tunnel(
    State(state): State<AppState>,
    session: Session,
    Path(org_id): Path<Uuid>,
) -> Result<Json<TunnelEnvelope>, ApiError> {
    session.require_org(org_id)?;

    let tunnel = match state.registry.get(org_id) {
        Some(record) => {
            let connected = state.workflow.is_connected(&record.tunnel_id).await;
            Some(TunnelInfo::from_record(record, Some(connected)))
        }
        None => None,
    };
    Ok(Json(TunnelEnvelope { tunnel }))
}

/// Create the organization's tunnel.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/tunnel",
    params(("org_id" = Uuid, Path,)),
    request_body = TunnelCreateRequest,
    responses(
        (status = 201, body = TunnelInfo),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 409, body = ErrorBody),
    ),
    tag = "tunnels"
)]
pub async fn create_tunnel(
    State(state): State<AppState>,
    session: Session,
    Path(org_id): Path<Uuid>,
    Json(body): Json<TunnelCreateRequest>,
) -> Result<(StatusCode, Json<TunnelInfo>), ApiError> {
    session.require_owner(org_id)?;

    if !Organization::is_valid_slug(&body.org_slug) {
        return Err(ApiError::BadRequest(
            "slug must match ^[a-z0-9-]+$".into(),
        ));
    }
    let org = state
        .orgs
        .get(org_id)
        .ok_or(ApiError::NotFound("organization not found"))?;
    if body.org_slug != org.slug {
        return Err(ApiError::BadRequest(
            "slug does not match this organization".into(),
        ));
    }

    let record = state.workflow.create_tunnel(org_id, &org.slug).await?;
    Ok((
        StatusCode::CREATED,
        Json(TunnelInfo::from_record(record, None)),
    ))
}

/// Rotate the tunnel's credentials, keeping the hostname.
///
/// Callers supply the identifiers they last read; stale identifiers
/// are rejected with a conflict before anything is torn down.
#[utoipa::path(
    patch,
    path = "/api/v1/orgs/{org_id}/tunnel",
    params(("org_id" = Uuid, Path,)),
    request_body = TunnelIdentifiers,
    responses(
        (status = 200, body = TunnelInfo),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 409, body = ErrorBody),
    ),
    tag = "tunnels"
)]
pub async fn rotate_tunnel(
    State(state): State<AppState>,
    session: Session,
    Path(org_id): Path<Uuid>,
    Json(body): Json<TunnelIdentifiers>,
) -> Result<Json<TunnelInfo>, ApiError> {
    session.require_owner(org_id)?;

    let org = state
        .orgs
        .get(org_id)
        .ok_or(ApiError::NotFound("organization not found"))?;
    let record = state
        .workflow
        .rotate(org_id, &org.slug, &body.tunnel_id, &body.dns_record_id)
        .await?;
    Ok(Json(TunnelInfo::from_record(record, None)))
}

/// Delete the organization's tunnel.
///
/// The local record is removed even when the remote teardown is
/// incomplete; that case is surfaced as a warning in the body.
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}/tunnel",
    params(("org_id" = Uuid, Path,)),
    request_body = TunnelIdentifiers,
    responses(
        (status = 200, body = DeleteResponse),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 409, body = ErrorBody),
    ),
    tag = "tunnels"
)]
pub async fn delete_tunnel(
    State(state): State<AppState>,
    session: Session,
    Path(org_id): Path<Uuid>,
    Json(body): Json<TunnelIdentifiers>,
) -> Result<Json<DeleteResponse>, ApiError> {
    session.require_owner(org_id)?;

    let outcome = state
        .workflow
        .delete(org_id, &body.tunnel_id, &body.dns_record_id)
        .await?;
    let response = match outcome {
        DeleteOutcome::Deleted => DeleteResponse {
            deleted: true,
            warning: None,
        },
        DeleteOutcome::DeletedWithWarning(warning) => DeleteResponse {
            deleted: true,
            warning: Some(warning),
        },
    };
    Ok(Json(response))
}
