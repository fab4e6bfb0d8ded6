use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atrium_core::identity::IdentityHeaders;

use crate::domain::types::Department;
use crate::error::DirectoryError;
use crate::state::AppState;
use crate::usecase::department::{
    AssignUserInput, AssignUserUseCase, CreateDepartmentInput, CreateDepartmentUseCase,
    CreateOrganizationInput, CreateOrganizationUseCase, DeleteDepartmentUseCase,
    GetDepartmentUseCase, ListDepartmentChildrenUseCase, RenameDepartmentInput,
    RenameDepartmentUseCase,
};

#[derive(Serialize)]
pub struct DepartmentResponse {
    pub id: String,
    pub org_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub path: String,
    pub manager_id: Option<String>,
    pub is_root: bool,
    #[serde(serialize_with = "atrium_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "atrium_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Department> for DepartmentResponse {
    fn from(d: Department) -> Self {
        Self {
            id: d.id.to_string(),
            org_id: d.org_id.to_string(),
            parent_id: d.parent_id.map(|id| id.to_string()),
            name: d.name,
            path: d.path.to_string(),
            manager_id: d.manager_id.map(|id| id.to_string()),
            is_root: d.is_root,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

// ── POST /orgs ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

pub async fn create_organization(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<DepartmentResponse>), DirectoryError> {
    // Creating a whole organization tree is an operator-level action.
    if identity.user_role < 2 {
        return Err(DirectoryError::Forbidden);
    }
    let usecase = CreateOrganizationUseCase {
        repo: state.department_repo(),
        signal: state.signal.clone(),
    };
    let department = usecase
        .execute(CreateOrganizationInput {
            name: body.name,
            actor_id: identity.user_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(department.into())))
}

// ── POST /departments/{parent_id}/children ───────────────────────────────────

#[derive(Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub manager_id: Option<Uuid>,
}

pub async fn create_department(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(parent_id): Path<Uuid>,
    Json(body): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<DepartmentResponse>), DirectoryError> {
    let usecase = CreateDepartmentUseCase {
        repo: state.department_repo(),
        signal: state.signal.clone(),
    };
    let department = usecase
        .execute(CreateDepartmentInput {
            parent_id,
            name: body.name,
            manager_id: body.manager_id,
            actor_id: identity.user_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(department.into())))
}

// ── GET /departments/{department_id} ─────────────────────────────────────────

pub async fn get_department(
    _identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
) -> Result<Json<DepartmentResponse>, DirectoryError> {
    let usecase = GetDepartmentUseCase {
        repo: state.department_repo(),
    };
    let department = usecase.execute(department_id).await?;
    Ok(Json(department.into()))
}

// ── GET /departments/{department_id}/children ────────────────────────────────

pub async fn list_children(
    _identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
) -> Result<Json<Vec<DepartmentResponse>>, DirectoryError> {
    let usecase = ListDepartmentChildrenUseCase {
        repo: state.department_repo(),
    };
    let children = usecase.execute(department_id).await?;
    Ok(Json(children.into_iter().map(Into::into).collect()))
}

// ── PATCH /departments/{department_id} ───────────────────────────────────────

#[derive(Deserialize)]
pub struct RenameDepartmentRequest {
    pub name: String,
}

pub async fn rename_department(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
    Json(body): Json<RenameDepartmentRequest>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = RenameDepartmentUseCase {
        repo: state.department_repo(),
        signal: state.signal.clone(),
    };
    usecase
        .execute(
            department_id,
            RenameDepartmentInput {
                name: body.name,
                actor_id: identity.user_id,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /departments/{department_id} ──────────────────────────────────────

pub async fn delete_department(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = DeleteDepartmentUseCase {
        repo: state.department_repo(),
        signal: state.signal.clone(),
    };
    usecase.execute(department_id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /departments/{department_id}/users ──────────────────────────────────

#[derive(Deserialize)]
pub struct AssignUserRequest {
    pub user_id: Uuid,
}

pub async fn assign_user(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
    Json(body): Json<AssignUserRequest>,
) -> Result<StatusCode, DirectoryError> {
    let usecase = AssignUserUseCase {
        repo: state.department_repo(),
        signal: state.signal.clone(),
    };
    usecase
        .execute(
            department_id,
            AssignUserInput {
                user_id: body.user_id,
                actor_id: identity.user_id,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
