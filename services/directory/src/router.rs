use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use tower_http::trace::TraceLayer;

use atrium_core::health::{healthz, readyz};
use atrium_core::middleware::request_id_layer;

use crate::handlers::{
    app::{delete_app, register_app, update_app},
    contactor::{create_contactor, delete_contactor, rename_contactor},
    department::{
        assign_user, create_department, create_organization, delete_department, get_department,
        list_children, rename_department,
    },
    group::{create_group, delete_group, rename_group},
    org_perm::{grant_permission, revoke_permission},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Organizations & departments
        .route("/orgs", post(create_organization))
        .route("/departments/{parent_id}/children", post(create_department))
        .route("/departments/{department_id}", get(get_department))
        .route("/departments/{department_id}/children", get(list_children))
        .route("/departments/{department_id}", patch(rename_department))
        .route("/departments/{department_id}", delete(delete_department))
        .route("/departments/{department_id}/users", post(assign_user))
        // Apps
        .route("/orgs/{org_id}/apps", post(register_app))
        .route("/apps/{app_id}", patch(update_app))
        .route("/apps/{app_id}", delete(delete_app))
        // Groups
        .route("/orgs/{org_id}/groups", post(create_group))
        .route("/groups/{group_id}", patch(rename_group))
        .route("/groups/{group_id}", delete(delete_group))
        // Contactors
        .route("/orgs/{org_id}/contactors", post(create_contactor))
        .route("/contactors/{contactor_id}", patch(rename_contactor))
        .route("/contactors/{contactor_id}", delete(delete_contactor))
        // Org app permissions
        .route(
            "/orgs/{org_id}/apps/{app_id}/permission",
            put(grant_permission),
        )
        .route(
            "/orgs/{org_id}/apps/{app_id}/permission",
            delete(revoke_permission),
        )
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
