use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atrium_core::identity::IdentityHeaders;

use crate::error::DirectoryError;
use crate::state::AppState;
use crate::usecase::group::{
    CreateGroupInput, CreateGroupUseCase, DeleteGroupUseCase, RenameGroupInput,
    RenameGroupUseCase,
};

// ── POST /orgs/{org_id}/groups ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(serialize_with = "atrium_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn create_group(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), DirectoryError> {
    let usecase = CreateGroupUseCase {
        repo: state.group_repo(),
        signal: state.signal.clone(),
    };
    let group = usecase
        .execute(CreateGroupInput {
            org_id,
            name: body.name,
            member_ids: body.member_ids,
            actor_id: identity.user_id,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            id: group.id.to_string(),
            org_id: group.org_id.to_string(),
            name: group.name,
            owner_id: group.owner_id.to_string(),
            created_at: group.created_at,
        }),
    ))
}

// ── PATCH /groups/{group_id} ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RenameGroupRequest {
    pub name: String,
}

pub async fn rename_group(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(body): Json<RenameGroupRequest>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = RenameGroupUseCase {
        repo: state.group_repo(),
        signal: state.signal.clone(),
    };
    usecase
        .execute(
            group_id,
            RenameGroupInput {
                name: body.name,
                actor_id: identity.user_id,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /groups/{group_id} ────────────────────────────────────────────────

pub async fn delete_group(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = DeleteGroupUseCase {
        repo: state.group_repo(),
        signal: state.signal.clone(),
    };
    usecase.execute(group_id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
