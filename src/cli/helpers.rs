//! Shared helper functions for CLI commands

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use writeright_core::{
    error::{Result, WriteRightError},
    BackgroundService, MessageRouter, Response, WriteRightConfig,
};

/// Load configuration and build an installed background service
pub async fn start_service(config_path: Option<&Path>) -> Result<Arc<BackgroundService>> {
    let config = WriteRightConfig::load(config_path)?;
    let service = BackgroundService::from_config(config)?;
    service.install().await?;
    debug!("Background service ready");
    Ok(Arc::new(service))
}

pub async fn start_router(config_path: Option<&Path>) -> Result<MessageRouter> {
    Ok(MessageRouter::new(start_service(config_path).await?))
}

/// Use `arg`, or read all of stdin when it is absent or `-`
pub fn text_or_stdin(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Parse a CLI value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Payload of a successful response, or its error
pub fn expect_data(response: Response) -> Result<serde_json::Value> {
    if !response.success && response.error.is_none() {
        return Err(WriteRightError::Other("request failed".to_string()));
    }
    response.into_data()
}
