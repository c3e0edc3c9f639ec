use axum::extract::State;
use uuid::Uuid;

use connectx_types::api::{SearchQuery, UpdateProfileRequest};
use connectx_types::models::{Profile, PublicUser};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extract::{Json, Path, Query};
use crate::middleware::AuthUser;
use crate::services::users;

/// GET /api/users/search?query=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let query = params.query.unwrap_or_default();
    let found = blocking(&state, move |db| users::search(db, &query)).await?;
    Ok(Json(found))
}

/// GET /api/users/suggested
pub async fn suggested(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let suggestions = blocking(&state, move |db| users::suggested(db, user.id)).await?;
    Ok(Json(suggestions))
}

/// GET /api/users/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Profile>> {
    let profile = blocking(&state, move |db| users::get_profile(db, id)).await?;
    Ok(Json(profile))
}

/// PUT /api/users/profile
pub async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<PublicUser>> {
    let updated = blocking(&state, move |db| users::update_profile(db, user.id, req)).await?;
    Ok(Json(updated))
}
