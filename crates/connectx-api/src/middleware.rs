use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use connectx_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// The authenticated caller. Taking this as a handler argument makes the
/// route protected: a missing, malformed or expired bearer token is a 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::unauthorized("Not authorized, no token"))?;

        let claims = verify_token(&state.jwt_secret, bearer.token())?;

        Ok(Self {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// Extract and validate the claims of a bearer token.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthorized("Not authorized, token failed"))?;

    Ok(token_data.claims)
}
