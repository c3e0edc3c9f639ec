use axum::extract::State;

use connectx_types::api::{MatchQuery, MatchResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiResult;
use crate::extract::{Json, Query};
use crate::middleware::AuthUser;
use crate::services::matching;

/// GET /api/matching?limit=
pub async fn find_matches(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<MatchQuery>,
) -> ApiResult<Json<MatchResponse>> {
    let limit = params.limit.unwrap_or(matching::DEFAULT_MATCH_LIMIT);
    let resp = blocking(&state, move |db| matching::find_matches(db, user.id, limit)).await?;
    Ok(Json(resp))
}
