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
use crate::usecase::contactor::{
    CreateContactorInput, CreateContactorUseCase, DeleteContactorUseCase, RenameContactorInput,
    RenameContactorUseCase,
};

// ── POST /orgs/{org_id}/contactors ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateContactorRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct ContactorResponse {
    pub id: String,
    pub org_id: String,
    pub name: String,
    #[serde(serialize_with = "atrium_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn create_contactor(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<CreateContactorRequest>,
) -> Result<(StatusCode, Json<ContactorResponse>), DirectoryError> {
    let usecase = CreateContactorUseCase {
        repo: state.contactor_repo(),
        signal: state.signal.clone(),
    };
    let contactor = usecase
        .execute(CreateContactorInput {
            org_id,
            name: body.name,
            member_ids: body.member_ids,
            actor_id: identity.user_id,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactorResponse {
            id: contactor.id.to_string(),
            org_id: contactor.org_id.to_string(),
            name: contactor.name,
            created_at: contactor.created_at,
        }),
    ))
}

// ── PATCH /contactors/{contactor_id} ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct RenameContactorRequest {
    pub name: String,
}

pub async fn rename_contactor(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(contactor_id): Path<Uuid>,
    Json(body): Json<RenameContactorRequest>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = RenameContactorUseCase {
        repo: state.contactor_repo(),
        signal: state.signal.clone(),
    };
    usecase
        .execute(
            contactor_id,
            RenameContactorInput {
                name: body.name,
                actor_id: identity.user_id,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /contactors/{contactor_id} ────────────────────────────────────────

pub async fn delete_contactor(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(contactor_id): Path<Uuid>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = DeleteContactorUseCase {
        repo: state.contactor_repo(),
        signal: state.signal.clone(),
    };
    usecase.execute(contactor_id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
