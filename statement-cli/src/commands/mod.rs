//! CLI command implementations

pub mod config;
pub mod demo;
pub mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};
use statement_core::StatementContext;

/// Get the statement directory from environment or default
pub fn get_statement_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("STATEMENT_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".statement"))
        .context("Could not find home directory; set STATEMENT_DIR")
}

/// Create the live statement context
pub fn get_context() -> Result<StatementContext> {
    let statement_dir = get_statement_dir()?;
    StatementContext::new(&statement_dir).context("Failed to initialize statement context")
}
