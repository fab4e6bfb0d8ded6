use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Directory service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("app not found")]
    AppNotFound,
    #[error("department not found")]
    DepartmentNotFound,
    #[error("group not found")]
    GroupNotFound,
    #[error("contactor not found")]
    ContactorNotFound,
    #[error("permission not found")]
    PermissionNotFound,
    #[error("name already in use")]
    DuplicateName,
    #[error("permission already granted")]
    AlreadyGranted,
    #[error("invalid name")]
    InvalidName,
    #[error("organization root cannot be deleted")]
    CannotDeleteRoot,
    #[error("forbidden")]
    Forbidden,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl DirectoryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AppNotFound => "APP_NOT_FOUND",
            Self::DepartmentNotFound => "DEPARTMENT_NOT_FOUND",
            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::ContactorNotFound => "CONTACTOR_NOT_FOUND",
            Self::PermissionNotFound => "PERMISSION_NOT_FOUND",
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::AlreadyGranted => "ALREADY_GRANTED",
            Self::InvalidName => "INVALID_NAME",
            Self::CannotDeleteRoot => "CANNOT_DELETE_ROOT",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<sea_orm::DbErr> for DirectoryError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

impl From<sea_orm::TransactionError<DirectoryError>> for DirectoryError {
    fn from(e: sea_orm::TransactionError<DirectoryError>) -> Self {
        match e {
            sea_orm::TransactionError::Connection(db) => db.into(),
            sea_orm::TransactionError::Transaction(inner) => inner,
        }
    }
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::AppNotFound
            | Self::DepartmentNotFound
            | Self::GroupNotFound
            | Self::ContactorNotFound
            | Self::PermissionNotFound => StatusCode::NOT_FOUND,
            Self::DuplicateName | Self::AlreadyGranted => StatusCode::CONFLICT,
            Self::InvalidName | Self::CannotDeleteRoot => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn should_return_department_not_found() {
        let resp = DirectoryError::DepartmentNotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], "DEPARTMENT_NOT_FOUND");
        assert_eq!(json["message"], "department not found");
    }

    #[tokio::test]
    async fn should_return_duplicate_name_as_conflict() {
        let resp = DirectoryError::DuplicateName.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], "DUPLICATE_NAME");
    }

    #[tokio::test]
    async fn should_return_cannot_delete_root_as_bad_request() {
        let resp = DirectoryError::CannotDeleteRoot.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], "CANNOT_DELETE_ROOT");
    }

    #[tokio::test]
    async fn should_return_internal_without_leaking_detail() {
        let resp =
            DirectoryError::Internal(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], "INTERNAL");
        assert_eq!(json["message"], "internal error");
    }
}
