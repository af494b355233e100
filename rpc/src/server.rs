//! Axum-based RPC server.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use murmur_crypto::{anonymize, FingerprintDeriver};
use murmur_store::CommentStore;
use murmur_types::Fingerprint;
use murmur_votes::VoteAggregator;

use crate::error::RpcError;
use crate::handlers;

/// Shared state handed to every handler.
pub struct RpcState {
    pub aggregator: Arc<VoteAggregator>,
    pub comments: Arc<dyn CommentStore>,
    pub deriver: Arc<dyn FingerprintDeriver>,
    /// Mask peer addresses to their subnet before fingerprinting.
    pub anonymize_addresses: bool,
}

impl RpcState {
    /// Fingerprint of the requester behind `peer`.
    pub fn fingerprint(&self, peer: SocketAddr) -> Fingerprint {
        let ip: IpAddr = if self.anonymize_addresses {
            anonymize(&peer.ip())
        } else {
            peer.ip()
        };
        self.deriver.derive(&ip)
    }
}

/// Build the router. An empty `cors_origins` allows any origin.
pub fn build_router(state: Arc<RpcState>, cors_origins: &[String]) -> Result<Router, RpcError> {
    Ok(Router::new()
        .route("/new", post(handlers::create_comment))
        .route("/id/:id", get(handlers::get_comment))
        .route("/id/:id/like", post(handlers::like))
        .route("/id/:id/dislike", post(handlers::dislike))
        .layer(cors_layer(cors_origins)?)
        .with_state(state))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, RpcError> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| RpcError::InvalidRequest(format!("bad CORS origin {o:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: Arc<RpcState>,
    pub cors_origins: Vec<String>,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: Arc<RpcState>, cors_origins: Vec<String>) -> Self {
        Self {
            addr,
            state,
            cors_origins,
        }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let app = build_router(self.state, &self.cors_origins)?;
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        tracing::info!(addr = %self.addr, "HTTP API listening");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))
    }
}
