use axum::Json;
use axum::extract::{Extension, Path, State};

use ripple_types::api::{FriendRequests, SearchMatch, UserView};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub async fn profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    if !ripple_db::valid_id(&uid) {
        return Err(ApiError::validation("Invalid UID format"));
    }

    let profile = state
        .db
        .load_profile(&uid)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(UserView {
        username: profile.user.username,
        uid: profile.user.id,
        name: profile.user.firstname,
        friends: profile.friends,
        friend_requests: FriendRequests {
            sent: profile.sent,
            received: profile.received,
        },
    }))
}

/// Username substring search; the caller never shows up in their own
/// results.
pub async fn search(
    State(state): State<AppState>,
    Path(text): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<SearchMatch>>, ApiError> {
    let hits = state.db.search_users(&text, &user.username)?;

    Ok(Json(
        hits.into_iter()
            .map(|h| SearchMatch {
                name: h.username,
                uid: h.id,
            })
            .collect(),
    ))
}
