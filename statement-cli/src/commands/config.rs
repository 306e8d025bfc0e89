//! Config command - show and change settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use statement_core::config::Config;
use statement_core::services::{BalanceMode, TextDirection};

use super::get_statement_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the display language (e.g. en, ar)
    SetLanguage { language: String },
    /// Set the balance contract agreed with the API (client or backend)
    SetBalanceMode { mode: BalanceMode },
    /// Set the statement API root URL
    SetApiUrl { url: String },
}

pub fn run(command: Option<ConfigCommands>) -> Result<()> {
    let statement_dir = get_statement_dir()?;
    let mut config = Config::load(&statement_dir)?;

    match command {
        Some(ConfigCommands::Show { json }) => show(&config, json),
        None => show(&config, false),
        Some(ConfigCommands::SetLanguage { language }) => {
            config.language = language.trim().to_string();
            config.save(&statement_dir)?;
            let direction = match config.direction() {
                TextDirection::Ltr => "left-to-right",
                TextDirection::Rtl => "right-to-left",
            };
            output::success(&format!("Language set to {} ({})", config.language, direction));
            Ok(())
        }
        Some(ConfigCommands::SetBalanceMode { mode }) => {
            config.balance_mode = mode;
            config.save(&statement_dir)?;
            output::success(&format!("Balance mode set to {}", mode));
            Ok(())
        }
        Some(ConfigCommands::SetApiUrl { url }) => {
            statement_core::adapters::http::parse_base_url(&url)?;
            config.api_base_url = url;
            config.save(&statement_dir)?;
            output::success(&format!("API URL set to {}", config.api_base_url));
            Ok(())
        }
    }
}

fn show(config: &Config, json: bool) -> Result<()> {
    if json {
        let value = json!({
            "apiBaseUrl": config.api_base_url,
            "analyticsUrl": config.analytics_endpoint(),
            "pageSize": config.page_size,
            "balanceMode": config.balance_mode,
            "language": config.language,
            "requestTimeoutSecs": config.request_timeout_secs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Settings".bold());
    let mut table = output::create_table();
    table.add_row(vec!["API URL".to_string(), config.api_base_url.clone()]);
    table.add_row(vec!["Analytics URL".to_string(), config.analytics_endpoint()]);
    table.add_row(vec!["Page size".to_string(), config.page_size.to_string()]);
    table.add_row(vec!["Balance mode".to_string(), config.balance_mode.to_string()]);
    table.add_row(vec!["Language".to_string(), config.language.clone()]);
    table.add_row(vec!["Request timeout".to_string(), format!("{}s", config.request_timeout_secs)]);
    println!("{}", table);
    Ok(())
}
