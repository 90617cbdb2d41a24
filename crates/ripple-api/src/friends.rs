//! Friend graph endpoints. Identity comes from the session guard; the
//! acting pair comes from the body, and both ids are format-checked before
//! the store sees them. All four operations reject a self-targeted pair
//! outright, whatever the graph state.

use axum::extract::{Extension, State};

use ripple_types::api::{FriendDecisionRequest, FriendLinkRequest};

use crate::AppState;
use crate::error::{ApiError, ApiJson};
use crate::middleware::CurrentUser;

pub async fn request(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<FriendLinkRequest>,
) -> Result<&'static str, ApiError> {
    check_pair(&req.uid, &req.friend_id, "Cannot send friend request to yourself.")?;
    state.db.send_friend_request(&req.uid, &req.friend_id)?;
    Ok("Friend request sent successfully.")
}

pub async fn accept(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<FriendDecisionRequest>,
) -> Result<&'static str, ApiError> {
    check_pair(&req.uid, &req.requester_id, "Cannot accept friend request from yourself.")?;
    state.db.accept_friend_request(&req.uid, &req.requester_id)?;
    Ok("Friend request accepted successfully.")
}

pub async fn decline(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<FriendDecisionRequest>,
) -> Result<&'static str, ApiError> {
    check_pair(&req.uid, &req.requester_id, "Cannot decline friend request from yourself.")?;
    state.db.decline_friend_request(&req.uid, &req.requester_id)?;
    Ok("Friend request declined successfully.")
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<FriendLinkRequest>,
) -> Result<&'static str, ApiError> {
    check_pair(&req.uid, &req.friend_id, "Cannot remove yourself.")?;
    state.db.remove_friend(&req.uid, &req.friend_id)?;
    Ok("Friend removed successfully.")
}

fn check_pair(uid: &str, other: &str, self_msg: &str) -> Result<(), ApiError> {
    if !ripple_db::valid_id(uid) || !ripple_db::valid_id(other) {
        return Err(ApiError::validation("Invalid ID format"));
    }
    if uid == other {
        return Err(ApiError::SelfReference(self_msg.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::middleware::ACCESS_COOKIE;
    use crate::test_util::*;
    use axum::http::StatusCode;
    use serde_json::json;

    /// Seed a user and hand back (uid, session cookie header).
    fn actor(state: &crate::AppState, username: &str, firstname: &str) -> (String, String) {
        let uid = seed_user(state, username, firstname);
        let token = access_token_for(state, &uid, username, firstname);
        (uid, format!("{ACCESS_COOKIE}={token}"))
    }

    async fn graph_of(state: &crate::AppState, cookie: &str) -> serde_json::Value {
        let res = send(state, get("/validate", Some(cookie))).await;
        assert_eq!(res.status(), StatusCode::OK);
        body_json(res).await
    }

    #[tokio::test]
    async fn full_request_accept_remove_flow() {
        let state = test_state();
        let (alice, alice_cookie) = actor(&state, "alice", "Alice");
        let (bob, bob_cookie) = actor(&state, "bob", "Bob");

        // A requests B.
        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/request",
                json!({"uid": alice, "friendID": bob}),
                Some(&alice_cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        // Again: 400, still pending.
        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/request",
                json!({"uid": alice, "friendID": bob}),
                Some(&alice_cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        // B accepts A.
        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/accept",
                json!({"uid": bob, "requesterID": alice}),
                Some(&bob_cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        // Both sides list each other, requests empty.
        let a = graph_of(&state, &alice_cookie).await;
        let b = graph_of(&state, &bob_cookie).await;
        assert_eq!(a["friends"], json!([bob]));
        assert_eq!(b["friends"], json!([alice]));
        assert_eq!(a["friendRequests"], json!({"sent": [], "received": []}));
        assert_eq!(b["friendRequests"], json!({"sent": [], "received": []}));

        // B removes A; both friend lists empty again.
        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/remove",
                json!({"uid": bob, "friendID": alice}),
                Some(&bob_cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let a = graph_of(&state, &alice_cookie).await;
        let b = graph_of(&state, &bob_cookie).await;
        assert_eq!(a["friends"], json!([]));
        assert_eq!(b["friends"], json!([]));
    }

    #[tokio::test]
    async fn decline_flow() {
        let state = test_state();
        let (alice, alice_cookie) = actor(&state, "alice", "Alice");
        let (bob, bob_cookie) = actor(&state, "bob", "Bob");

        send(
            &state,
            json_req(
                "POST",
                "/users/friends/request",
                json!({"uid": alice, "friendID": bob}),
                Some(&alice_cookie),
            ),
        )
        .await;

        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/decline",
                json!({"uid": bob, "requesterID": alice}),
                Some(&bob_cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        // Nothing pending anymore; declining again is a conflict.
        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/decline",
                json!({"uid": bob, "requesterID": alice}),
                Some(&bob_cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn self_reference_always_rejected() {
        let state = test_state();
        let (alice, cookie) = actor(&state, "alice", "Alice");

        for path in [
            "/users/friends/request",
            "/users/friends/remove",
        ] {
            let res = send(
                &state,
                json_req("POST", path, json!({"uid": alice, "friendID": alice}), Some(&cookie)),
            )
            .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "path: {path}");
        }

        for path in [
            "/users/friends/accept",
            "/users/friends/decline",
        ] {
            let res = send(
                &state,
                json_req("POST", path, json!({"uid": alice, "requesterID": alice}), Some(&cookie)),
            )
            .await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "path: {path}");
        }
    }

    #[tokio::test]
    async fn unknown_target_is_404() {
        let state = test_state();
        let (alice, cookie) = actor(&state, "alice", "Alice");
        let ghost = ripple_db::generate_id();

        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/request",
                json!({"uid": alice, "friendID": ghost}),
                Some(&cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_ids_are_400() {
        let state = test_state();
        let (alice, cookie) = actor(&state, "alice", "Alice");

        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/request",
                json!({"uid": alice, "friendID": "nope"}),
                Some(&cookie),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn friend_routes_need_a_session() {
        let state = test_state();
        let a = ripple_db::generate_id();
        let b = ripple_db::generate_id();

        let res = send(
            &state,
            json_req(
                "POST",
                "/users/friends/request",
                json!({"uid": a, "friendID": b}),
                None,
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
