use axum::{extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use connectx_types::api::{ApplyResponse, CreateOpportunityRequest};
use connectx_types::models::{Opportunity, UserRef};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extract::{Json, Path};
use crate::middleware::AuthUser;
use crate::services::opportunities;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Opportunity>>> {
    let list = blocking(&state, opportunities::list).await?;
    Ok(Json(list))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateOpportunityRequest>,
) -> ApiResult<impl IntoResponse> {
    let opp = blocking(&state, move |db| opportunities::create(db, user.id, req)).await?;
    Ok((StatusCode::CREATED, Json(opp)))
}

pub async fn get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Opportunity<UserRef>>> {
    let opp = blocking(&state, move |db| opportunities::get(db, id)).await?;
    Ok(Json(opp))
}

pub async fn apply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApplyResponse>> {
    let resp = blocking(&state, move |db| opportunities::apply(db, user.id, id)).await?;
    Ok(Json(resp))
}
