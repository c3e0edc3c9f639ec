use axum::{extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use connectx_types::api::{CommentRequest, CreatePostRequest, MessageResponse};
use connectx_types::models::Post;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extract::{Json, Path};
use crate::middleware::AuthUser;
use crate::services::posts;

pub async fn feed(State(state): State<AppState>) -> ApiResult<Json<Vec<Post>>> {
    let feed = blocking(&state, posts::feed).await?;
    Ok(Json(feed))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let post = blocking(&state, move |db| posts::create(db, user.id, req)).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Post>> {
    let post = blocking(&state, move |db| posts::get(db, id)).await?;
    Ok(Json(post))
}

pub async fn toggle_like(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Post>> {
    let post = blocking(&state, move |db| posts::toggle_like(db, user.id, id)).await?;
    Ok(Json(post))
}

pub async fn add_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Json<Post>> {
    let post = blocking(&state, move |db| posts::add_comment(db, user.id, id, &req.text)).await?;
    Ok(Json(post))
}

/// Only the author may delete; anyone else gets a 401.
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let resp = blocking(&state, move |db| posts::delete(db, user.id, id)).await?;
    Ok(Json(resp))
}
