//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for StatementTransport
//! - Demo transport serving fixed statements offline
//! - HTTP, tracing and in-memory AnalyticsSink
//! - In-memory StatementStore

pub mod analytics;
pub mod demo;
pub mod http;
pub mod memory;

#[cfg(test)]
pub mod mock_api;
