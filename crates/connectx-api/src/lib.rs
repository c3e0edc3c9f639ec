pub mod auth;
pub mod connections;
pub mod error;
pub mod extract;
pub mod matching;
pub mod messages;
pub mod middleware;
pub mod opportunities;
pub mod posts;
pub mod services;
pub mod users;

use axum::{
    Router,
    http::Uri,
    routing::{delete, get, post, put},
};
use tracing::error;

use connectx_db::Database;
use connectx_types::api::HealthResponse;

pub use auth::{AppState, AppStateInner};
use error::{ApiError, ApiResult};
use extract::Json;

/// Run a store operation on the blocking pool so SQLite never stalls the
/// async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("background task failed: {e}"))
        })?
}

/// Every route of the API. Handlers that take an
/// [`AuthUser`](middleware::AuthUser) are the protected ones.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/users/search", get(users::search))
        .route("/users/suggested", get(users::suggested))
        .route("/users/profile", put(users::update_profile))
        .route("/users/{id}", get(users::get_profile))
        .route("/connections", get(connections::list))
        .route("/connections/requests", get(connections::pending_requests))
        .route("/connections/request", post(connections::send_request))
        .route("/connections/accept/{id}", put(connections::accept))
        .route("/connections/reject/{id}", put(connections::reject))
        .route("/connections/status/{user_id}", get(connections::status))
        .route("/connections/{user_id}", delete(connections::remove))
        .route("/posts", get(posts::feed).post(posts::create))
        .route("/posts/{id}", get(posts::get_post).delete(posts::delete_post))
        .route("/posts/{id}/like", post(posts::toggle_like))
        .route("/posts/{id}/comment", post(posts::add_comment))
        .route("/messages", post(messages::send_message))
        .route("/messages/conversations", get(messages::conversations))
        .route("/messages/{user_id}", get(messages::thread))
        .route("/opportunities", get(opportunities::list).post(opportunities::create))
        .route("/opportunities/{id}", get(opportunities::get_opportunity))
        .route("/opportunities/{id}/apply", post(opportunities::apply))
        .route("/matching", get(matching::find_matches));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "connectx".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Not Found - {uri}"))
}
