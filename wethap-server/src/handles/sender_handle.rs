use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use wethap_api::ServerPush;
use wethap_api::label;
use wethap_api::models::*;

use crate::errors::{ApiError, RoomError};
use crate::repositories::SenderRepository;
use crate::services::{ConnectionRegistry, RenameCoordinator};

#[derive(Clone)]
pub struct SenderState {
    pub sender_repository: Arc<SenderRepository>,
    pub registry: Arc<ConnectionRegistry>,
    pub rename_coordinator: Arc<RenameCoordinator>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomQuery {
    /// Room label
    #[serde(rename = "labID")]
    pub lab_id: Option<String>,
}

pub fn sender_router(sender_state: SenderState) -> Router {
    Router::new()
        .route("/senders", get(get_senders))
        .route("/senders/labIDs", get(get_sender_lab_ids))
        .route("/senders/activeRooms", get(get_active_rooms))
        .route("/senders/requestInfo", post(request_info))
        .route("/senders/labID", patch(rename_sender))
        .with_state(sender_state)
}

#[utoipa::path(
    get,
    path = "/senders",
    tag = "sender",
    responses(
        (status = 200, description = "Every known sender", body = Vec<SenderResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_senders(
    State(state): State<SenderState>,
) -> Result<Json<Vec<SenderResponse>>, ApiError> {
    let senders = state.sender_repository.find_all().await?;
    let active = state.registry.active_rooms().await;

    let response = senders
        .into_iter()
        .map(|sender| SenderResponse {
            connected: active.contains(&sender.lab_id),
            id: sender.id,
            uuid: sender.uuid,
            identifier: sender.identifier,
            lab_id: sender.lab_id,
        })
        .collect();

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/senders/labIDs",
    tag = "sender",
    responses(
        (status = 200, description = "Room labels of every known sender", body = RoomsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_sender_lab_ids(
    State(state): State<SenderState>,
) -> Result<Json<RoomsResponse>, ApiError> {
    let lab_ids = state.sender_repository.find_lab_ids().await?;

    Ok(Json(RoomsResponse { lab_ids }))
}

#[utoipa::path(
    get,
    path = "/senders/activeRooms",
    tag = "sender",
    responses(
        (status = 200, description = "Rooms with a live, handshaken session", body = RoomsResponse)
    )
)]
pub async fn get_active_rooms(State(state): State<SenderState>) -> Json<RoomsResponse> {
    let lab_ids = state.registry.active_rooms().await.into_iter().collect();

    Json(RoomsResponse { lab_ids })
}

#[utoipa::path(
    post,
    path = "/senders/requestInfo",
    tag = "sender",
    params(RoomQuery),
    responses(
        (status = 200, description = "Reading requested from the room", body = RequestInfoResponse),
        (status = 400, description = "Missing or empty labID", body = ErrorResponse),
        (status = 404, description = "Room is not connected", body = ErrorResponse)
    )
)]
pub async fn request_info(
    State(state): State<SenderState>,
    Query(query): Query<RoomQuery>,
) -> Result<Json<RequestInfoResponse>, ApiError> {
    let lab_id = query
        .lab_id
        .as_deref()
        .and_then(label::normalize)
        .ok_or(RoomError::InvalidLabel)?;

    let push = ServerPush::RequestInfo { num_gen: None };
    if !state.registry.send_to_room(lab_id, &push).await {
        return Err(RoomError::RoomNotConnected(lab_id.to_string()).into());
    }

    tracing::info!(lab_id, "out-of-cycle reading requested");

    Ok(Json(RequestInfoResponse {
        lab_id: lab_id.to_string(),
        status: "requested".to_string(),
    }))
}

#[utoipa::path(
    patch,
    path = "/senders/labID",
    tag = "sender",
    request_body = RenameSenderRequest,
    responses(
        (status = 200, description = "Sender renamed", body = RenameSenderResponse),
        (status = 400, description = "Ambiguous target or empty label", body = ErrorResponse),
        (status = 404, description = "No sender matches the target", body = ErrorResponse),
        (status = 409, description = "Label belongs to another sender", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn rename_sender(
    State(state): State<SenderState>,
    Json(body): Json<RenameSenderRequest>,
) -> Result<Json<RenameSenderResponse>, ApiError> {
    let outcome = state.rename_coordinator.rename_request(&body).await?;

    Ok(Json(RenameSenderResponse {
        id: outcome.id,
        before: outcome.before,
        after: outcome.after,
        notified: outcome.notified,
    }))
}
