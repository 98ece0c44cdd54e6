//! Raw router message

use super::helpers::{print_json, start_router, text_or_stdin};
use std::path::Path;
use writeright_core::error::Result;

/// Dispatch one JSON message and print the response
///
/// Returns whether the router reported success.
pub async fn handle(json: Option<String>, config_path: Option<&Path>) -> Result<bool> {
    let raw = text_or_stdin(json)?;
    let message: serde_json::Value = serde_json::from_str(&raw)?;

    let router = start_router(config_path).await?;
    let response = router.dispatch_value(message).await;
    print_json(&response)?;
    Ok(response.success)
}
