//! One-off grammar check

use super::helpers::{print_json, start_router, text_or_stdin};
use std::path::Path;
use writeright_core::{
    error::Result, types::apply_all, CheckResult, OptionOverrides, Provider, Request,
};

pub struct CheckArgs {
    pub text: Option<String>,
    pub language: Option<String>,
    pub provider: Option<Provider>,
    pub offline: bool,
    pub fix: bool,
    pub json: bool,
}

/// Handle the check command
pub async fn handle(args: CheckArgs, config_path: Option<&Path>) -> Result<()> {
    let text = text_or_stdin(args.text)?;
    let router = start_router(config_path).await?;

    let provider = if args.offline {
        Some(Provider::Basic)
    } else {
        args.provider
    };
    let options = OptionOverrides {
        language: args.language,
        provider,
        level: None,
    };

    let response = router
        .handle(Request::CheckGrammar {
            text: text.clone(),
            options,
        })
        .await;
    let cached = response.cached.unwrap_or(false);

    if args.json {
        return print_json(&response);
    }

    let result: CheckResult = response.into_data()?;

    if args.fix {
        println!("{}", apply_all(&text, &result.matches));
        return Ok(());
    }

    if result.matches.is_empty() {
        println!("No issues found");
        return Ok(());
    }

    let mut notes = Vec::new();
    if result.fallback {
        notes.push("offline rules");
    }
    if cached {
        notes.push("cached");
    }
    if notes.is_empty() {
        println!("Found {} issue(s):", result.matches.len());
    } else {
        println!("Found {} issue(s) ({}):", result.matches.len(), notes.join(", "));
    }
    println!();

    for (i, m) in result.matches.iter().enumerate() {
        let flagged = writeright_core::types::char_slice(&text, m.offset, m.end());
        println!(
            "  {}. [{:?}/{}] \"{}\" at {}: {}",
            i + 1,
            m.severity,
            m.category.as_str(),
            flagged,
            m.offset,
            m.message
        );
        if let Some(best) = m.best_replacement() {
            println!("     -> {}", best);
        }
    }

    Ok(())
}
