use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use wethap_api::label;
use wethap_api::models::*;
use wethap_api::Info as Reading;

use crate::errors::{ApiError, InfoError};
use crate::models::{Info, ManualInfo};
use crate::repositories::{InfoRepository, ManualInfoRepository};
use crate::services::ReadingService;
use crate::services::reading_service::validate_date;

const DEFAULT_MANUAL_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct InfoState {
    pub reading_service: Arc<ReadingService>,
    pub info_repository: Arc<InfoRepository>,
    pub manual_info_repository: Arc<ManualInfoRepository>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InfoQuery {
    /// Room label
    #[serde(rename = "labID")]
    pub lab_id: Option<String>,
    /// Local date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Schedule position
    #[serde(rename = "numGen")]
    pub num_gen: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LabQuery {
    /// Room label
    #[serde(rename = "labID")]
    pub lab_id: Option<String>,
    /// Maximum number of rows, newest first
    pub limit: Option<i64>,
}

impl From<Info> for InfoResponse {
    fn from(info: Info) -> Self {
        InfoResponse {
            id: info.id,
            lab_id: info.lab_id,
            date: info.date,
            time: info.time,
            num_gen: info.num_gen.and_then(|n| u32::try_from(n).ok()),
            temperature: info.temperature,
            humidity: info.humidity,
            pressure: info.pressure,
            weather: info.weather,
        }
    }
}

impl From<ManualInfo> for InfoResponse {
    fn from(info: ManualInfo) -> Self {
        InfoResponse {
            id: info.id,
            lab_id: info.lab_id,
            date: info.date,
            time: info.time,
            num_gen: None,
            temperature: info.temperature,
            humidity: info.humidity,
            pressure: info.pressure,
            weather: info.weather,
        }
    }
}

pub fn info_router(info_state: InfoState) -> Router {
    Router::new()
        .route("/", get(get_status))
        .route("/addInfo", post(add_info))
        .route("/getInfo", get(get_info))
        .route("/isRegistered", get(is_registered))
        .route("/registeredRooms", get(get_registered_rooms))
        .route("/previewData", get(preview_data))
        .route("/manualInfo", get(get_manual_info))
        .with_state(info_state)
}

fn required_label(lab_id: Option<&str>) -> Result<&str, InfoError> {
    match lab_id {
        None => Err(InfoError::MissingParameter("labID")),
        Some(lab_id) => label::normalize(lab_id).ok_or(InfoError::InvalidLabel),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "info",
    responses(
        (status = 200, description = "Server is up", body = StatusResponse)
    )
)]
pub async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse::new("online"))
}

#[utoipa::path(
    post,
    path = "/addInfo",
    tag = "info",
    request_body = Reading,
    responses(
        (status = 200, description = "Reading stored", body = StatusResponse),
        (status = 400, description = "Invalid label or date", body = ErrorResponse),
        (status = 409, description = "Scheduled reading already stored", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn add_info(
    State(state): State<InfoState>,
    Json(body): Json<Reading>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.reading_service.record(&body.lab_id, &body).await?;

    Ok(Json(StatusResponse::new("added")))
}

#[utoipa::path(
    get,
    path = "/getInfo",
    tag = "info",
    params(InfoQuery),
    responses(
        (status = 200, description = "The reading, or the string NoData", body = InfoResponse),
        (status = 400, description = "Missing or invalid parameter", body = ErrorResponse)
    )
)]
pub async fn get_info(
    State(state): State<InfoState>,
    Query(query): Query<InfoQuery>,
) -> Result<Response, ApiError> {
    let lab_id = required_label(query.lab_id.as_deref())?;
    let date = query.date.ok_or(InfoError::MissingParameter("date"))?;
    let num_gen = query.num_gen.ok_or(InfoError::MissingParameter("numGen"))?;
    validate_date(&date)?;

    let response = match state.info_repository.find_one(lab_id, &date, num_gen).await? {
        Some(info) => Json(InfoResponse::from(info)).into_response(),
        None => Json("NoData").into_response(),
    };

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/isRegistered",
    tag = "info",
    params(LabQuery),
    responses(
        (status = 200, description = "Whether readings exist for the room", body = bool),
        (status = 400, description = "Missing labID", body = ErrorResponse)
    )
)]
pub async fn is_registered(
    State(state): State<InfoState>,
    Query(query): Query<LabQuery>,
) -> Result<Json<bool>, ApiError> {
    let lab_id = required_label(query.lab_id.as_deref())?;

    Ok(Json(state.info_repository.exists_for_lab_id(lab_id).await?))
}

#[utoipa::path(
    get,
    path = "/registeredRooms",
    tag = "info",
    responses(
        (status = 200, description = "Rooms with stored readings", body = RoomsResponse)
    )
)]
pub async fn get_registered_rooms(
    State(state): State<InfoState>,
) -> Result<Json<RoomsResponse>, ApiError> {
    let lab_ids = state.info_repository.find_lab_ids().await?;

    Ok(Json(RoomsResponse { lab_ids }))
}

#[utoipa::path(
    get,
    path = "/previewData",
    tag = "info",
    responses(
        (status = 200, description = "Every scheduled reading", body = Vec<InfoResponse>)
    )
)]
pub async fn preview_data(
    State(state): State<InfoState>,
) -> Result<Json<Vec<InfoResponse>>, ApiError> {
    let infos = state.info_repository.find_all().await?;

    Ok(Json(infos.into_iter().map(InfoResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/manualInfo",
    tag = "info",
    params(LabQuery),
    responses(
        (status = 200, description = "Latest manual readings of the room", body = Vec<InfoResponse>),
        (status = 400, description = "Missing labID", body = ErrorResponse)
    )
)]
pub async fn get_manual_info(
    State(state): State<InfoState>,
    Query(query): Query<LabQuery>,
) -> Result<Json<Vec<InfoResponse>>, ApiError> {
    let lab_id = required_label(query.lab_id.as_deref())?;
    let limit = query.limit.unwrap_or(DEFAULT_MANUAL_LIMIT).clamp(1, 1000);

    let infos = state
        .manual_info_repository
        .find_latest_by_lab_id(lab_id, limit)
        .await?;

    Ok(Json(infos.into_iter().map(InfoResponse::from).collect()))
}
