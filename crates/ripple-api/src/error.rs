use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use ripple_db::graph::GraphError;
use ripple_auth::tokens::TokenError;

/// Request-scoped error taxonomy. Every variant maps to one status code and
/// a terse reason string; internal detail is logged, never sent.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    SelfReference(String),
    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::SelfReference(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!("internal error: {:#}", e);
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::UserMissing => ApiError::NotFound("User or friend not found.".into()),
            GraphError::AlreadyFriends
            | GraphError::RequestPending
            | GraphError::NoPendingRequest
            | GraphError::NotFriends => ApiError::Conflict(e.to_string()),
            GraphError::Store(e) => ApiError::Internal(e),
        }
    }
}

// Token issuance only; verification failures are auth decisions handled in
// the session middleware, never surfaced through this conversion.
impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Internal(anyhow::Error::new(e))
    }
}

/// `axum::Json` wrapper whose rejection is a 400, not axum's default 422:
/// a malformed body is a plain validation failure here.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Ok(ApiJson(value))
    }
}
