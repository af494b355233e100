//! HTTP API for the Murmur comment server.
//!
//! Provides endpoints for:
//! - Comment creation and lookup (`/new`, `/id/{id}`)
//! - Likes and dislikes (`/id/{id}/like`, `/id/{id}/dislike`)
//!
//! Voters are identified by the TCP peer address of the request, run
//! through the installation's fingerprint deriver.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use handlers::{CommentView, NewCommentRequest};
pub use server::{build_router, RpcServer, RpcState};
