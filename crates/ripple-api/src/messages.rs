use std::collections::HashMap;

use anyhow::anyhow;
use axum::Json;
use axum::extract::{Path, State};
use tracing::error;

use ripple_db::models::PostRow;
use ripple_types::api::{CreatePostRequest, CreatePostResponse, PostView, ReadFlagRequest};

use crate::AppState;
use crate::error::{ApiError, ApiJson};

const MAX_BODY_CHARS: usize = 140;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<PostView>>, ApiError> {
    // Run the blocking DB work off the async runtime
    let db = state.clone();
    let (rows, read_rows) = tokio::task::spawn_blocking(move || {
        let rows = db.db.list_posts()?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let reads = db.db.reads_for_posts(&ids)?;
        Ok::<_, anyhow::Error>((rows, reads))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow!("join error: {}", e))
    })??;

    let mut reads_map: HashMap<String, Vec<String>> = HashMap::new();
    for r in read_rows {
        reads_map.entry(r.post_id).or_default().push(r.user_id);
    }

    let posts = rows
        .into_iter()
        .map(|row| {
            let users_read = reads_map.remove(&row.id).unwrap_or_default();
            post_view(row, users_read)
        })
        .collect();

    Ok(Json(posts))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> Result<Json<CreatePostResponse>, ApiError> {
    if !ripple_db::valid_id(&req.uid) {
        return Err(ApiError::validation("Invalid ID format"));
    }

    let trimmed = req.body.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Post body must not be empty."));
    }
    if trimmed.chars().count() > MAX_BODY_CHARS {
        return Err(ApiError::validation("Post body must be 140 characters or fewer."));
    }

    // A recipient makes the post directed and requires the denormalized
    // display name alongside it; without one the post is public and the
    // name snapshot is empty.
    let (recipient_id, recipient_name) = match (&req.recipient, &req.recipient_name) {
        (Some(rid), Some(rname)) => {
            if !ripple_db::valid_id(rid) {
                return Err(ApiError::validation("Invalid ID format"));
            }
            (Some(rid.as_str()), rname.as_str())
        }
        (Some(_), None) => {
            return Err(ApiError::validation("Directed posts need a recipientName."));
        }
        (None, _) => (None, ""),
    };

    let id = ripple_db::generate_id();
    let date = chrono::Local::now().format("%d/%m/%Y - %H:%M").to_string();

    state.db.insert_post(
        &id,
        &req.uid,
        &req.name,
        &req.body,
        recipient_id,
        recipient_name,
        &date,
    )?;

    Ok(Json(CreatePostResponse { id }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    if !ripple_db::valid_id(&id) {
        return Err(ApiError::validation("Invalid ID format"));
    }

    let row = state
        .db
        .get_post(&id)?
        .ok_or_else(|| ApiError::NotFound("404".into()))?;
    let users_read = state.db.reads_for_post(&id)?;

    Ok(Json(post_view(row, users_read)))
}

/// Toggle the caller-supplied viewer's read flag to the requested state.
/// Setting an already-set flag, or clearing an absent one, is a no-op.
pub async fn set_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ReadFlagRequest>,
) -> Result<String, ApiError> {
    if !ripple_db::valid_id(&id) {
        return Err(ApiError::validation("Invalid ID format"));
    }
    if !ripple_db::valid_id(&req.id) {
        return Err(ApiError::validation("Invalid ID format"));
    }
    if state.db.get_post(&id)?.is_none() {
        return Err(ApiError::validation("Unknown post."));
    }

    state.db.set_read_flag(&id, &req.id, req.read)?;

    Ok(if req.read { "true".into() } else { "false".into() })
}

fn post_view(row: PostRow, users_read: Vec<String>) -> PostView {
    PostView {
        id: row.id,
        uid: row.author_id,
        name: row.author_name,
        body: row.body,
        recipient: row.recipient_id,
        recipient_name: row.recipient_name,
        date: row.created_at,
        users_read,
    }
}
