//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for the pipeline's collaborators. The services
//! depend only on these traits, not on concrete implementations.

mod analytics;
mod store;
mod transport;

pub use analytics::{AnalyticsEvent, AnalyticsSink, LINK_CLICK_EVENT, PAGE_LINK_EVENT};
pub use store::StatementStore;
pub use transport::StatementTransport;
