//! Service layer - the statement data pipeline
//!
//! Services coordinate domain logic and port interactions. Data flows from
//! the load coordinator through the normalizer and cache into the balance
//! engine, then view derivation and disclosure.

pub mod balance;
pub mod cache;
pub mod disclosure;
pub mod load;
pub mod normalize;
pub mod session;
pub mod view;

pub use balance::{chronological, current_balance, paid_in, paid_out, running_balance, BalanceMode, Ledger};
pub use cache::StatementCache;
pub use disclosure::{DisclosureController, DisclosureMode, Page, Viewport, DEFAULT_PAGE_SIZE};
pub use load::{Completion, LoadCoordinator, LoadOutcome, LoadSequence, Ticket};
pub use normalize::{normalize_entries, normalize_profile};
pub use session::{SessionOptions, StatementSession};
pub use view::{
    derive_view, filter, sort, Column, ColumnOrder, FilterCriteria, FilterMode, FilterSet, SortDirection,
    SortKey, TextDirection,
};
