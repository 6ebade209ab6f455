pub mod api;
pub mod info;
pub mod registry;
pub mod rename;
pub mod resolve;
pub mod room;

pub use api::ApiError;
pub use info::InfoError;
pub use registry::RegistryError;
pub use rename::RenameError;
pub use resolve::ResolveError;
pub use room::RoomError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;
use wethap_api::ErrorCode;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error_message, error_id) = match self {
            ApiError::RenameError(RenameError::Storage(e)) | ApiError::DatabaseError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageError,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
            ApiError::InfoError(InfoError::Storage(e)) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageError,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
            ApiError::RenameError(e) => (e.status_code(), e.code(), e.to_string(), None),
            ApiError::RoomError(e) => (e.status_code(), e.code(), e.to_string(), None),
            ApiError::InfoError(e) => (e.status_code(), e.code(), e.to_string(), None),
            ApiError::InternalError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageError,
                    "Internal server error".to_string(),
                    Some(error_id.to_string()),
                )
            }
        };

        let mut error_obj = json!({
            "code": status.as_u16(),
            "status": code,
            "message": error_message
        });

        // Only internal failures carry an id to correlate with the server log
        if let Some(error_id) = error_id {
            error_obj["error_id"] = json!(error_id);
        }

        (status, Json(json!({ "error": error_obj }))).into_response()
    }
}
