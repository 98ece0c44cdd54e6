//! Settings inspection and editing

use super::helpers::{expect_data, parse_value, print_json, start_router};
use clap::Subcommand;
use serde_json::{Map, Value};
use std::path::Path;
use writeright_core::{
    error::{Result, WriteRightError},
    Request,
};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show all settings, or one key
    Get {
        /// camelCase settings key (e.g. checkFrequency)
        key: Option<String>,
    },

    /// Set one key; the value is parsed as JSON when possible
    Set { key: String, value: String },
}

/// Handle settings command
pub async fn handle(action: SettingsAction, config_path: Option<&Path>) -> Result<()> {
    let router = start_router(config_path).await?;

    match action {
        SettingsAction::Get { key } => {
            let settings = expect_data(router.handle(Request::GetSettings).await)?;
            match key {
                None => print_json(&settings),
                Some(key) => match settings.get(&key) {
                    Some(value) => print_json(value),
                    None => Err(WriteRightError::InvalidInput(format!(
                        "unknown settings key '{}'",
                        key
                    ))),
                },
            }
        }
        SettingsAction::Set { key, value } => {
            let mut partial = Map::new();
            partial.insert(key.clone(), parse_value(&value));
            let saved = expect_data(
                router
                    .handle(Request::SaveSettings {
                        settings: Value::Object(partial),
                    })
                    .await,
            )?;
            println!("{} = {}", key, saved.get(&key).unwrap_or(&Value::Null));
            Ok(())
        }
    }
}
