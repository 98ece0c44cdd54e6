//! HTTP transport for the message router

use super::router::{MessageRouter, Response};
use crate::background::HealthReport;
use crate::config::ServerConfig;
use crate::error::WriteRightError;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

#[derive(Clone)]
struct AppState {
    router: Arc<MessageRouter>,
}

pub struct ApiServer {
    config: ServerConfig,
    router: Arc<MessageRouter>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, router: Arc<MessageRouter>) -> Self {
        Self { config, router }
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/message", post(message_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Axum app without a listener, for embedding and tests
    pub fn app(&self) -> Router {
        Self::build_router(AppState {
            router: self.router.clone(),
        })
    }

    /// Start serving
    ///
    /// Tries the configured address first, then the next ten ports if it is
    /// taken.
    pub async fn serve(self) -> anyhow::Result<()> {
        let app = self.app();

        match tokio::net::TcpListener::bind(self.config.addr).await {
            Ok(listener) => {
                info!("WriteRight server listening on http://{}", self.config.addr);
                axum::serve(listener, app).await?;
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                debug!(
                    "Port {} in use, trying alternative ports...",
                    self.config.addr.port()
                );
            }
            Err(e) => return Err(e.into()),
        }

        let base_port = self.config.addr.port();
        let alternatives = fallback_ports(base_port);
        let last_port = alternatives.last().copied().unwrap_or(base_port);
        for port in alternatives {
            let alt_addr = SocketAddr::new(self.config.addr.ip(), port);

            match tokio::net::TcpListener::bind(alt_addr).await {
                Ok(listener) => {
                    info!("WriteRight server listening on http://{}", alt_addr);
                    axum::serve(listener, app).await?;
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(anyhow::anyhow!(
            "All ports ({}-{}) are in use",
            base_port,
            last_port
        ))
    }
}

/// Up to ten ports after `base`, stopping at the top of the port range
fn fallback_ports(base: u16) -> Vec<u16> {
    (1..=10).map_while(|offset| base.checked_add(offset)).collect()
}

/// Route one message; failures are carried in the response body
///
/// Bodies axum cannot read as JSON get a structured `invalidInput` response
/// rather than a plain-text rejection.
async fn message_handler(
    State(state): State<AppState>,
    message: Result<Json<Value>, JsonRejection>,
) -> Json<Response> {
    match message {
        Ok(Json(message)) => Json(state.router.dispatch_value(message).await),
        Err(rejection) => {
            debug!("Rejected message body: {}", rejection.body_text());
            Json(Response::error(&WriteRightError::InvalidInput(
                rejection.body_text(),
            )))
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.router.service().health())
}
