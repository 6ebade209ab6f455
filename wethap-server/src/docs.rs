use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;
use wethap_api::models::*;
use wethap_api::{ErrorCode, Info};

use crate::handles;

#[derive(OpenApi)]
#[openapi(
    paths(
        handles::get_status,
        handles::add_info,
        handles::get_info,
        handles::is_registered,
        handles::get_registered_rooms,
        handles::preview_data,
        handles::get_manual_info,
        handles::get_senders,
        handles::get_sender_lab_ids,
        handles::get_active_rooms,
        handles::request_info,
        handles::rename_sender,
    ),
    components(schemas(
        ErrorBody,
        ErrorCode,
        ErrorResponse,
        Info,
        InfoResponse,
        RenameSenderRequest,
        RenameSenderResponse,
        RequestInfoResponse,
        RoomsResponse,
        SenderResponse,
        StatusResponse,
    )),
    tags(
        (name = "info", description = "Stored readings"),
        (name = "sender", description = "Sender identities and live sessions"),
    )
)]
pub struct ApiDoc;

pub fn docs_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
