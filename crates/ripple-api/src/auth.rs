use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use once_cell::sync::Lazy;
use regex::Regex;

use ripple_auth::{password, tokens};
use ripple_types::api::{
    AvailabilityRequest, AvailabilityResponse, LoginRequest, LoginResponse, RegisterRequest,
    UserView,
};

use crate::AppState;
use crate::error::{ApiError, ApiJson};
use crate::middleware::{
    ACCESS_COOKIE, CurrentUser, REFRESH_COOKIE, access_cookie, refresh_cookie, removal,
};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}$").unwrap());

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if jar.get(ACCESS_COOKIE).is_some() || jar.get(REFRESH_COOKIE).is_some() {
        return Err(ApiError::validation(
            "Already logged in. Cannot register while logged in.",
        ));
    }

    validate_registration(&state, &req)?;

    let hash = password::hash_password(&req.password)?;
    let uid = ripple_db::generate_id();

    // The UNIQUE constraint backstops the pre-check against races.
    let created = state.db.create_user(
        &uid,
        &req.username,
        &hash,
        &req.firstname,
        &req.surname,
        &req.email,
    )?;
    if !created {
        return Err(ApiError::validation("Username is already taken."));
    }

    let access = tokens::issue_access_token(&state.access_secret, &uid, &req.username, &req.firstname)?;
    let refresh = tokens::issue_refresh_token(&state.refresh_secret, &uid, &req.username)?;

    let jar = jar.add(access_cookie(access)).add(refresh_cookie(refresh));
    Ok((StatusCode::CREATED, jar, "Registered"))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if jar.get(ACCESS_COOKIE).is_some() || jar.get(REFRESH_COOKIE).is_some() {
        return Err(ApiError::validation("Already logged in."));
    }

    // One failure message for both unknown user and wrong password.
    let user = state
        .db
        .get_user_by_username(&req.username)?
        .ok_or_else(|| ApiError::Auth("Invalid username or password".into()))?;

    if !password::verify_password(&req.password, &user.password)? {
        return Err(ApiError::Auth("Invalid username or password".into()));
    }

    let access =
        tokens::issue_access_token(&state.access_secret, &user.id, &user.username, &user.firstname)?;
    let refresh = tokens::issue_refresh_token(&state.refresh_secret, &user.id, &user.username)?;

    let jar = jar.add(access_cookie(access)).add(refresh_cookie(refresh));
    Ok((
        jar,
        Json(LoginResponse {
            username: user.username,
        }),
    ))
}

/// Clears both cookies unconditionally; no token inspection at all.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(removal(ACCESS_COOKIE)).remove(removal(REFRESH_COOKIE));
    (jar, "Logged out successfully")
}

pub async fn validate(Extension(user): Extension<CurrentUser>) -> Json<UserView> {
    Json(UserView {
        username: user.username,
        uid: user.uid,
        name: user.name,
        friends: user.friends,
        friend_requests: user.friend_requests,
    })
}

pub async fn check_availability(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    if req.username.is_none() && req.email.is_none() {
        return Err(ApiError::validation("Provide a username or email to check."));
    }

    let username_available = match &req.username {
        Some(u) => Some(state.db.get_user_by_username(u)?.is_none()),
        None => None,
    };
    let email_available = match &req.email {
        Some(e) => Some(!state.db.email_in_use(e)?),
        None => None,
    };

    Ok(Json(AvailabilityResponse {
        username_available,
        email_available,
    }))
}

/// Registration rules, checked eagerly before any state mutation.
fn validate_registration(state: &AppState, req: &RegisterRequest) -> Result<(), ApiError> {
    if req.firstname.len() <= 1 {
        return Err(ApiError::validation(
            "First name should be longer than one character.",
        ));
    }
    if req.surname.len() <= 1 {
        return Err(ApiError::validation(
            "Last name should be longer than one character.",
        ));
    }

    if req.username.len() <= 3 {
        return Err(ApiError::validation(
            "Username should be longer than three characters.",
        ));
    }
    if !USERNAME_RE.is_match(&req.username) {
        return Err(ApiError::validation(
            "Username may only contain letters, digits, underscores and hyphens.",
        ));
    }
    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::validation("Username is already taken."));
    }

    let digits = req.password.chars().filter(|c| c.is_ascii_digit()).count();
    if req.password.len() < 8 || digits < 2 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters and contain at least two digits.",
        ));
    }
    if req.password != req.confirm_password {
        return Err(ApiError::validation("Passwords do not match."));
    }

    if !EMAIL_RE.is_match(&req.email) {
        return Err(ApiError::validation("Please enter a valid email address."));
    }

    Ok(())
}
