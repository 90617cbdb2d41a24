use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::debug;

use ripple_auth::tokens::{
    self, ACCESS_TOKEN_MINUTES, REFRESH_TOKEN_DAYS,
};
use ripple_types::api::FriendRequests;

use crate::AppState;

pub const ACCESS_COOKIE: &str = "authToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Resolved caller identity, attached to the request by the session guard
/// and read by handlers via `Extension`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub uid: String,
    pub username: String,
    pub name: String,
    pub friends: Vec<String>,
    pub friend_requests: FriendRequests,
}

pub fn access_cookie(token: String) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::minutes(ACCESS_TOKEN_MINUTES))
        .build()
}

pub fn refresh_cookie(token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::days(REFRESH_TOKEN_DAYS))
        .build()
}

/// Removal cookie; path must match the one the cookie was set with.
pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Session guard: establishes the caller's identity from the access-token
/// cookie, silently renewing it via the refresh token when possible.
///
/// The access token alone authenticates a request. When it is missing,
/// invalid, expired, or names a vanished user, a valid refresh token mints a
/// replacement access token on the response and the request proceeds as if
/// nothing happened. Only when both paths fail is the request rejected.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let access = jar.get(ACCESS_COOKIE).map(|c| c.value().to_owned());
    let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned());

    if access.is_none() && refresh.is_none() {
        return (StatusCode::UNAUTHORIZED, "No tokens provided").into_response();
    }

    if let Some(token) = access.as_deref() {
        if let Ok(claims) = tokens::verify_access(token, &state.access_secret) {
            match load_identity(&state, &claims.sub) {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(user);
                    return next.run(req).await;
                }
                // A vanished user is treated exactly like an invalid
                // token: fall through to the refresh path.
                Ok(None) => {}
                Err(e) => return internal(e),
            }
        }
    }

    let Some(token) = refresh.as_deref() else {
        return (StatusCode::UNAUTHORIZED, "Auth token expired").into_response();
    };

    let claims = match tokens::verify_refresh(token, &state.refresh_secret) {
        Ok(claims) => claims,
        Err(_) => {
            let jar = jar.remove(removal(ACCESS_COOKIE)).remove(removal(REFRESH_COOKIE));
            return (jar, (StatusCode::UNAUTHORIZED, "Refresh token expired")).into_response();
        }
    };

    let user = match load_identity(&state, &claims.sub) {
        Ok(Some(user)) => user,
        // Cookies are left in place on this path: the refresh token itself
        // verified, only its subject is gone.
        Ok(None) => return (StatusCode::UNAUTHORIZED, "User not found").into_response(),
        Err(e) => return internal(e),
    };

    let fresh = match tokens::issue_access_token(
        &state.access_secret,
        &user.uid,
        &user.username,
        &user.name,
    ) {
        Ok(token) => token,
        Err(e) => return internal(e.into()),
    };
    debug!("silently renewed access token for {}", user.username);

    let jar = jar.add(access_cookie(fresh));
    req.extensions_mut().insert(user);
    let res = next.run(req).await;
    (jar, res).into_response()
}

fn load_identity(state: &AppState, uid: &str) -> anyhow::Result<Option<CurrentUser>> {
    let Some(profile) = state.db.load_profile(uid)? else {
        return Ok(None);
    };

    Ok(Some(CurrentUser {
        uid: profile.user.id,
        username: profile.user.username,
        name: profile.user.firstname,
        friends: profile.friends,
        friend_requests: FriendRequests {
            sent: profile.sent,
            received: profile.received,
        },
    }))
}

fn internal(e: anyhow::Error) -> Response {
    tracing::error!("internal error: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
