//! HTTP server command

use super::helpers::start_service;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use writeright_core::{error::Result, ApiServer, MessageRouter};

/// Run the background service behind the HTTP transport until Ctrl-C
pub async fn handle(addr: Option<SocketAddr>, config_path: Option<&Path>) -> Result<()> {
    let service = start_service(config_path).await?;
    let mut server_config = service.config().server.clone();
    if let Some(addr) = addr {
        server_config.addr = addr;
    }

    service.start_sweeper();
    let server = ApiServer::new(server_config, Arc::new(MessageRouter::new(service.clone())));

    tokio::select! {
        result = server.serve() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping server...");
        }
    }

    service.stop_sweeper();
    info!("Server shut down");
    Ok(())
}
