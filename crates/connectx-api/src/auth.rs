use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use connectx_db::Database;
use connectx_db::models::UserRow;
use connectx_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::error::{ApiError, ApiResult};
use crate::extract::Json;
use crate::middleware::AuthUser;
use crate::{blocking, services};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

const TOKEN_LIFETIME_DAYS: i64 = 30;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let req = RegisterRequest {
        name: req.name.trim().to_string(),
        email: normalize_email(&req.email),
        password: req.password,
    };
    req.validate()?;

    let secret = state.jwt_secret.clone();
    let response = blocking(&state, move |db| {
        if db.get_user_by_email(&req.email)?.is_some() {
            return Err(ApiError::conflict("User already exists"));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
            .to_string();

        let user = UserRow::new(&req.name, &req.email, &password_hash);
        db.insert_user(&user)?;
        info!(user_id = %user.id, "user registered");

        let token = create_token(&secret, user.id, &user.email)?;
        Ok(AuthResponse {
            token,
            user: services::users::get_profile(db, user.id)?,
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&req.email);
    let secret = state.jwt_secret.clone();

    let response = blocking(&state, move |db| {
        let user = db
            .get_user_by_email(&email)?
            .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored password hash is corrupt: {e}"))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| ApiError::unauthorized("Invalid email or password"))?;

        let token = create_token(&secret, user.id, &user.email)?;
        Ok(AuthResponse {
            token,
            user: services::users::get_profile(db, user.id)?,
        })
    })
    .await?;

    Ok(Json(response))
}

/// GET /api/auth/me
pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let profile = blocking(&state, move |db| services::users::get_profile(db, user.id)).await?;
    Ok(Json(profile))
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
