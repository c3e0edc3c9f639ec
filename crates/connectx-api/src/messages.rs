use axum::{extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use connectx_types::api::SendMessageRequest;
use connectx_types::models::{Conversation, Message};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extract::{Json, Path};
use crate::middleware::AuthUser;
use crate::services::messages;

pub async fn conversations(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Conversation>>> {
    let convos = blocking(&state, move |db| messages::conversations(db, user.id)).await?;
    Ok(Json(convos))
}

/// Reading a thread marks the other party's messages as read.
pub async fn thread(
    user: AuthUser,
    State(state): State<AppState>,
    Path(other): Path<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    let thread = blocking(&state, move |db| messages::thread(db, user.id, other)).await?;
    Ok(Json(thread))
}

pub async fn send_message(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = blocking(&state, move |db| {
        messages::send(db, user.id, req.recipient, &req.content)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}
