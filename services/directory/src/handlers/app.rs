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
use crate::usecase::app::{
    DeleteAppUseCase, RegisterAppInput, RegisterAppUseCase, UpdateAppInput, UpdateAppUseCase,
};

// ── POST /orgs/{org_id}/apps ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterAppRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct AppResponse {
    pub id: String,
    pub org_id: String,
    pub name: String,
    /// Returned once at registration; not retrievable later.
    pub app_key: String,
    #[serde(serialize_with = "atrium_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn register_app(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<RegisterAppRequest>,
) -> Result<(StatusCode, Json<AppResponse>), DirectoryError> {
    let usecase = RegisterAppUseCase {
        repo: state.app_repo(),
        signal: state.signal.clone(),
    };
    let app = usecase
        .execute(RegisterAppInput {
            org_id,
            name: body.name,
            actor_id: identity.user_id,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AppResponse {
            id: app.id.to_string(),
            org_id: app.org_id.to_string(),
            name: app.name,
            app_key: app.app_key,
            created_at: app.created_at,
        }),
    ))
}

// ── PATCH /apps/{app_id} ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateAppRequest {
    pub name: String,
}

pub async fn update_app(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
    Json(body): Json<UpdateAppRequest>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = UpdateAppUseCase {
        repo: state.app_repo(),
        signal: state.signal.clone(),
    };
    usecase
        .execute(
            app_id,
            UpdateAppInput {
                name: body.name,
                actor_id: identity.user_id,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /apps/{app_id} ────────────────────────────────────────────────────

pub async fn delete_app(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(app_id): Path<Uuid>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = DeleteAppUseCase {
        repo: state.app_repo(),
        signal: state.signal.clone(),
    };
    usecase.execute(app_id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
