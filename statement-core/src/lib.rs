//! Statement Core - the account statement data pipeline
//!
//! This crate implements the statement pipeline following hexagonal architecture:
//!
//! - **domain**: Core entities (StatementEntry, AccountProfile, CompositeKey, LoadState)
//! - **ports**: Trait definitions for collaborators (StatementTransport, StatementStore, AnalyticsSink)
//! - **services**: Normalizer, cache, balance engine, view derivation, disclosure, load coordination
//! - **adapters**: Concrete implementations (reqwest transport, demo data, analytics sinks)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use adapters::analytics::HttpAnalytics;
use adapters::demo::DemoTransport;
use adapters::http::HttpTransport;
use adapters::memory::MemoryStore;
use config::Config;
use ports::{AnalyticsSink, StatementTransport};
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    AccountProfile, AccountRole, CompositeKey, LoadState, Money, Statement, StatementEntry, Timestamp,
};
pub use domain::result::Error;

/// Main context for statement operations
///
/// Wires the transport, cache and analytics sink together once. Sessions
/// opened from the same context share the cache, so a statement fetched by
/// one view is served from memory to the next. Each session supersedes only
/// its own loads.
pub struct StatementContext {
    pub config: Config,
    pub coordinator: Arc<LoadCoordinator>,
}

impl StatementContext {
    /// Context talking to the configured statement API
    pub fn new(statement_dir: &Path) -> Result<Self> {
        let config = Config::load(statement_dir)?;

        let transport = HttpTransport::with_timeout(&config.api_base_url, config.request_timeout())
            .context("Failed to set up the statement API client")?;
        let analytics = HttpAnalytics::new(&config.analytics_endpoint())
            .context("Failed to set up the analytics client")?;

        Ok(Self::with_collaborators(config, Arc::new(transport), Arc::new(analytics)))
    }

    /// Context serving the built-in demo statements, no network access
    pub fn demo(statement_dir: &Path, analytics: Arc<dyn AnalyticsSink>) -> Result<Self> {
        let config = Config::load(statement_dir)?;
        Ok(Self::with_collaborators(config, Arc::new(DemoTransport::new()), analytics))
    }

    /// Context over explicit collaborators
    pub fn with_collaborators(
        config: Config,
        transport: Arc<dyn StatementTransport>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        debug!(transport = transport.name(), balance_mode = %config.balance_mode, "creating statement context");

        let cache = Arc::new(StatementCache::new(Arc::new(MemoryStore::new()), analytics));
        let coordinator = Arc::new(LoadCoordinator::new(transport, cache));

        Self { config, coordinator }
    }

    /// Session options derived from the config
    pub fn session_options(&self, disclosure_mode: DisclosureMode) -> SessionOptions {
        SessionOptions {
            balance_mode: self.config.balance_mode,
            page_size: self.config.page_size,
            disclosure_mode,
            direction: self.config.direction(),
        }
    }

    /// Open a view over this context's shared cache
    pub fn session(&self, disclosure_mode: DisclosureMode) -> StatementSession {
        StatementSession::new(self.coordinator.clone(), self.session_options(disclosure_mode))
    }
}
