//! Core domain entities
//!
//! Statement data as the rest of the pipeline sees it. Pure data structures
//! with light validation logic - no I/O or external dependencies.

mod entry;
mod key;
mod load_state;
mod profile;
pub mod result;
mod statement;

pub use entry::{Money, StatementEntry, Timestamp};
pub use key::CompositeKey;
pub use load_state::LoadState;
pub use profile::{AccountProfile, AccountRole};
pub use statement::Statement;
