use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use atrium_core::identity::IdentityHeaders;

use crate::error::DirectoryError;
use crate::state::AppState;
use crate::usecase::org_perm::{GrantOrgPermissionUseCase, RevokeOrgPermissionUseCase};

// ── PUT /orgs/{org_id}/apps/{app_id}/permission ──────────────────────────────

pub async fn grant_permission(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, DirectoryError> {
    // Only org-level operators may change app permissions.
    if identity.user_role < 1 {
        return Err(DirectoryError::Forbidden);
    }
    let usecase = GrantOrgPermissionUseCase {
        repo: state.org_perm_repo(),
        signal: state.signal.clone(),
    };
    usecase.execute(org_id, app_id, identity.user_id).await?;
    Ok(StatusCode::CREATED)
}

// ── DELETE /orgs/{org_id}/apps/{app_id}/permission ───────────────────────────

pub async fn revoke_permission(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, DirectoryError> {
    if identity.user_role < 1 {
        return Err(DirectoryError::Forbidden);
    }
    let usecase = RevokeOrgPermissionUseCase {
        repo: state.org_perm_repo(),
        signal: state.signal.clone(),
    };
    usecase.execute(org_id, app_id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
