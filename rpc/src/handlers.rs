//! RPC request handlers.
//!
//! Storage and aggregation are synchronous, so each handler moves its work
//! onto tokio's blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use murmur_store::{CommentRecord, NewComment};
use murmur_types::{CommentId, Timestamp, VoteCounts, VoteDirection};

use crate::error::RpcError;
use crate::server::RpcState;

/// Comment text length bounds, in characters.
const MIN_TEXT_LEN: usize = 3;
const MAX_TEXT_LEN: usize = 65_535;

// ── Comments ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ThreadQuery {
    pub uri: String,
}

#[derive(Deserialize, Serialize)]
pub struct NewCommentRequest {
    pub text: String,
}

/// A comment as returned to clients. Never includes the author fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommentView {
    pub id: u64,
    pub uri: String,
    pub text: String,
    pub created: u64,
    pub likes: u64,
    pub dislikes: u64,
}

impl From<CommentRecord> for CommentView {
    fn from(c: CommentRecord) -> Self {
        Self {
            id: c.id.as_u64(),
            uri: c.thread,
            text: c.text,
            created: c.created.as_secs(),
            likes: c.likes,
            dislikes: c.dislikes,
        }
    }
}

/// The body is parsed as JSON whatever its `Content-Type`.
pub async fn create_comment(
    State(state): State<Arc<RpcState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(query): Query<ThreadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<CommentView>), RpcError> {
    let req: NewCommentRequest = serde_json::from_slice(&body)
        .map_err(|e| RpcError::InvalidRequest(format!("malformed comment body: {e}")))?;
    let text = req.text.trim().to_string();
    let len = text.chars().count();
    if !(MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&len) {
        return Err(RpcError::InvalidRequest(format!(
            "text must be between {MIN_TEXT_LEN} and {MAX_TEXT_LEN} characters"
        )));
    }
    if query.uri.is_empty() {
        return Err(RpcError::InvalidRequest("uri is required".to_string()));
    }

    let new = NewComment {
        thread: query.uri,
        author: state.fingerprint(peer),
        text,
        created: Timestamp::now(),
    };
    let comments = Arc::clone(&state.comments);
    let comment = tokio::task::spawn_blocking(move || comments.create_comment(&new)).await??;
    tracing::info!(id = %comment.id, thread = %comment.thread, "comment created");

    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn get_comment(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<u64>,
) -> Result<Json<Option<CommentView>>, RpcError> {
    let comments = Arc::clone(&state.comments);
    let comment =
        tokio::task::spawn_blocking(move || comments.get_comment(CommentId::new(id))).await??;
    Ok(Json(comment.map(CommentView::from)))
}

// ── Votes ────────────────────────────────────────────────────────────────

pub async fn like(
    State(state): State<Arc<RpcState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<u64>,
) -> Result<Json<Option<VoteCounts>>, RpcError> {
    cast_vote(state, peer, id, VoteDirection::Like).await
}

pub async fn dislike(
    State(state): State<Arc<RpcState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<u64>,
) -> Result<Json<Option<VoteCounts>>, RpcError> {
    cast_vote(state, peer, id, VoteDirection::Dislike).await
}

/// Duplicate and self votes answer with the current counts, exactly like a
/// counted vote; an unknown comment answers `null`.
async fn cast_vote(
    state: Arc<RpcState>,
    peer: SocketAddr,
    id: u64,
    direction: VoteDirection,
) -> Result<Json<Option<VoteCounts>>, RpcError> {
    let voter = state.fingerprint(peer);
    let outcome = tokio::task::spawn_blocking(move || {
        state.aggregator.vote(CommentId::new(id), voter, direction)
    })
    .await??;
    Ok(Json(outcome.counts()))
}
