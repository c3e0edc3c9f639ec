use axum::{extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use connectx_types::api::{ConnectionRequestBody, ConnectionStatusResponse, MessageResponse};
use connectx_types::models::{Connection, UserRef};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extract::{Json, Path};
use crate::middleware::AuthUser;
use crate::services::connections;

pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserRef>>> {
    let list = blocking(&state, move |db| connections::list(db, user.id)).await?;
    Ok(Json(list))
}

pub async fn pending_requests(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Connection<UserRef>>>> {
    let pending = blocking(&state, move |db| connections::pending_requests(db, user.id)).await?;
    Ok(Json(pending))
}

pub async fn send_request(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ConnectionRequestBody>,
) -> ApiResult<impl IntoResponse> {
    let created = blocking(&state, move |db| {
        connections::send_request(db, user.id, req.recipient_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn accept(
    user: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<Connection>> {
    let accepted = blocking(&state, move |db| connections::accept(db, user.id, request_id)).await?;
    Ok(Json(accepted))
}

pub async fn reject(
    user: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<Connection>> {
    let rejected = blocking(&state, move |db| connections::reject(db, user.id, request_id)).await?;
    Ok(Json(rejected))
}

pub async fn status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(other): Path<Uuid>,
) -> ApiResult<Json<ConnectionStatusResponse>> {
    let status = blocking(&state, move |db| connections::status(db, user.id, other)).await?;
    Ok(Json(status))
}

pub async fn remove(
    user: AuthUser,
    State(state): State<AppState>,
    Path(other): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let resp = blocking(&state, move |db| connections::remove(db, user.id, other)).await?;
    Ok(Json(resp))
}
