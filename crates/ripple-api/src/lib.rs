pub mod auth;
pub mod error;
pub mod friends;
pub mod messages;
pub mod middleware;
pub mod users;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use ripple_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub access_secret: String,
    pub refresh_secret: String,
}

/// The full route table. Guarded routes run the session middleware first;
/// everything else is reachable without cookies.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(index))
        .route("/users/register", post(auth::register))
        .route("/users/login", post(auth::login))
        .route("/users/check-availability", post(auth::check_availability))
        .route("/logout", post(auth::logout))
        .route("/users/{uid}", get(users::profile))
        .route("/messages", get(messages::list).post(messages::create))
        .route("/messages/{id}", get(messages::get_one).patch(messages::set_read))
        .with_state(state.clone());

    let guarded = Router::new()
        .route("/validate", get(auth::validate))
        .route("/users/find/{text}", get(users::search))
        .route("/users/friends/request", post(friends::request))
        .route("/users/friends/accept", post(friends::accept))
        .route("/users/friends/decline", post(friends::decline))
        .route("/users/friends/remove", post(friends::remove))
        .layer(from_fn_with_state(state.clone(), middleware::require_session))
        .with_state(state);

    Router::new()
        .merge(public)
        .merge(guarded)
        .fallback(not_found)
}

async fn index() -> &'static str {
    "Hello"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404")
}
