//! Usage statistics

use super::helpers::{expect_data, print_json, start_router};
use std::path::Path;
use writeright_core::{error::Result, Request, Stats};

/// Handle stats command
pub async fn handle(json: bool, config_path: Option<&Path>) -> Result<()> {
    let router = start_router(config_path).await?;
    let data = expect_data(router.handle(Request::GetStats).await)?;

    if json {
        return print_json(&data);
    }

    let stats: Stats = serde_json::from_value(data)?;
    println!("Checks performed:     {}", stats.checks_performed);
    println!("Errors found:         {}", stats.errors_found);
    println!("Suggestions accepted: {}", stats.suggestions_accepted);
    if let Some(installed) = stats.install_date {
        println!("Installed:            {}", installed.format("%Y-%m-%d"));
    }
    Ok(())
}
