use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Access-token claims shared between ripple-auth (token codec) and
/// ripple-api (session middleware). Canonical definition lives here in
/// ripple-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub username: String,
    pub name: String,
    pub exp: usize,
}

/// Refresh-token claims. Carries less than the access token on purpose:
/// the display name is re-read from the store when a new access token is
/// minted, so a rename survives renewal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub firstname: String,
    pub surname: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvailabilityRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    #[serde(rename = "usernameAvailable", skip_serializing_if = "Option::is_none")]
    pub username_available: Option<bool>,
    #[serde(rename = "emailAvailable", skip_serializing_if = "Option::is_none")]
    pub email_available: Option<bool>,
}

// -- Users --

/// Pending-request halves as seen from one user: ids this user has
/// requested, and ids who have requested this user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendRequests {
    pub sent: Vec<String>,
    pub received: Vec<String>,
}

/// Public view of a user, returned by both `GET /validate` and
/// `GET /users/{uid}`.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub username: String,
    pub uid: String,
    pub name: String,
    pub friends: Vec<String>,
    #[serde(rename = "friendRequests")]
    pub friend_requests: FriendRequests,
}

#[derive(Debug, Serialize)]
pub struct SearchMatch {
    pub name: String,
    pub uid: String,
}

// -- Friend graph --

/// Body for `request` and `remove`: the acting user and the friend (or
/// would-be friend) on the other side.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FriendLinkRequest {
    pub uid: String,
    #[serde(rename = "friendID")]
    pub friend_id: String,
}

/// Body for `accept` and `decline`: the acting user and the sender of the
/// pending request being decided.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FriendDecisionRequest {
    pub uid: String,
    #[serde(rename = "requesterID")]
    pub requester_id: String,
}

// -- Posts --

/// Exactly the five logical fields accepted on creation; anything else
/// rejects the write. `recipient` absent or null means a public post.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub uid: String,
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(rename = "recipientName", default)]
    pub recipient_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: String,
    pub uid: String,
    pub name: String,
    pub body: String,
    pub recipient: Option<String>,
    #[serde(rename = "recipientName")]
    pub recipient_name: String,
    pub date: String,
    #[serde(rename = "usersRead")]
    pub users_read: Vec<String>,
}

/// Body for the read-flag PATCH: the viewer toggling their own flag and the
/// desired state. Exactly these two fields.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadFlagRequest {
    pub id: String,
    pub read: bool,
}
