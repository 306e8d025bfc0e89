//! Statement session - the inbound interface for a presentation layer
//!
//! One session backs one statement view. It owns the load state, the settled
//! ledger, the active filters/sort/column order and the disclosure cursor.
//! Methods take `&self` so overlapping loads can be driven concurrently; the
//! session's own load sequence decides which of them wins. Sessions sharing
//! a coordinator share its cache and nothing else.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{AccountProfile, AccountRole, CompositeKey, LoadState, Money, Statement, StatementEntry};
use crate::ports::{AnalyticsEvent, AnalyticsSink};
use crate::ports::LINK_CLICK_EVENT;
use crate::services::balance::{BalanceMode, Ledger};
use crate::services::disclosure::{DisclosureController, DisclosureMode, Page, Viewport, DEFAULT_PAGE_SIZE};
use crate::services::load::{LoadCoordinator, LoadOutcome, LoadSequence};
use crate::services::view::{
    derive_view, Column, ColumnOrder, FilterCriteria, FilterMode, FilterSet, SortKey, TextDirection,
};

/// Per-view settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub balance_mode: BalanceMode,
    pub page_size: usize,
    pub disclosure_mode: DisclosureMode,
    pub direction: TextDirection,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            balance_mode: BalanceMode::default(),
            page_size: DEFAULT_PAGE_SIZE,
            disclosure_mode: DisclosureMode::default(),
            direction: TextDirection::default(),
        }
    }
}

struct SessionState {
    current: Option<(CompositeKey, AccountRole)>,
    load_state: LoadState,
    statement: Option<Statement>,
    ledger: Ledger,
    filters: FilterSet,
    sort_keys: Vec<SortKey>,
    columns: ColumnOrder,
    view: Vec<StatementEntry>,
    disclosure: DisclosureController,
}

impl SessionState {
    fn filter_mode(&self) -> FilterMode {
        // Constrained viewports filter one column at a time
        match self.disclosure.mode() {
            DisclosureMode::Paged => FilterMode::Single,
            DisclosureMode::Full => FilterMode::Combined,
        }
    }

    /// Recompute the visible view and restart disclosure from the first page
    fn rederive(&mut self) {
        self.view = derive_view(&self.ledger.entries, &self.filters, &self.sort_keys);
        self.disclosure.reset(&self.view);
    }

    fn clear_data(&mut self, mode: BalanceMode) {
        self.statement = None;
        self.ledger = Ledger::derive(&[], mode);
        self.rederive();
    }
}

pub struct StatementSession {
    coordinator: Arc<LoadCoordinator>,
    sequence: LoadSequence,
    analytics: Arc<dyn AnalyticsSink>,
    options: SessionOptions,
    state: Mutex<SessionState>,
}

impl StatementSession {
    pub fn new(coordinator: Arc<LoadCoordinator>, options: SessionOptions) -> Self {
        let analytics = coordinator.cache().analytics().clone();
        let state = SessionState {
            current: None,
            load_state: LoadState::Idle,
            statement: None,
            ledger: Ledger::derive(&[], options.balance_mode),
            filters: FilterSet::new(),
            sort_keys: Vec::new(),
            columns: ColumnOrder::default(),
            view: Vec::new(),
            disclosure: DisclosureController::new(options.page_size, options.disclosure_mode),
        };

        Self {
            coordinator,
            sequence: LoadSequence::new(),
            analytics,
            options,
            state: Mutex::new(state),
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // Session state is plain data; a panic mid-update leaves nothing to repair
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load the statement for a key/hash pair
    ///
    /// Returns the load state after this call. If a newer load was issued
    /// while this one was in flight, nothing is applied and the returned state
    /// is whatever the newer load left behind.
    pub async fn load_statement(
        &self,
        account_key: &str,
        access_hash: &str,
        role: AccountRole,
    ) -> Result<LoadState> {
        let key = CompositeKey::new(account_key, access_hash)?;
        self.load_key(key, role).await
    }

    async fn load_key(&self, key: CompositeKey, role: AccountRole) -> Result<LoadState> {
        let ticket = {
            let mut state = self.lock();
            let switching = state.current.as_ref() != Some(&(key.clone(), role));
            if switching {
                state.clear_data(self.options.balance_mode);
            }
            state.current = Some((key.clone(), role));
            state.load_state = LoadState::Loading;
            self.sequence.issue(key, role)
        };

        let completion = self.coordinator.fetch(ticket).await;
        let outcome = self.coordinator.commit(&self.sequence, completion);

        let mut state = self.lock();
        match outcome {
            LoadOutcome::Applied(statement) => {
                state.ledger = Ledger::derive(&statement.entries, self.options.balance_mode);
                state.statement = Some(statement);
                state.load_state = LoadState::Loaded;
                state.rederive();
            }
            LoadOutcome::Failed(e) => {
                state.load_state = match e.user_message() {
                    None => LoadState::TransientlyFailed,
                    Some(message) => LoadState::Failed { message },
                };
            }
            LoadOutcome::Superseded => {}
        }
        Ok(state.load_state.clone())
    }

    /// Drop the cached statement and load it again
    pub async fn refresh(&self) -> Result<LoadState> {
        let (key, role) = self
            .lock()
            .current
            .clone()
            .ok_or_else(|| Error::validation("no statement has been loaded"))?;

        self.coordinator.cache().invalidate(&key);
        self.load_key(key, role).await
    }

    // =========================================================================
    // View manipulation
    // =========================================================================

    /// Set the filter for one column
    ///
    /// In paged mode this replaces any filter on another column. Empty
    /// criteria clear the column's filter.
    pub fn apply_filter(&self, column: Column, criteria: FilterCriteria) -> Result<()> {
        let mut state = self.lock();
        let mode = state.filter_mode();
        state.filters.set(column, criteria, mode)?;
        debug!(column = %column, active = state.filters.len(), "filter applied");
        state.rederive();
        Ok(())
    }

    pub fn clear_filter(&self, column: Column) {
        let mut state = self.lock();
        if state.filters.clear(column) {
            state.rederive();
        }
    }

    pub fn clear_filters(&self) {
        let mut state = self.lock();
        state.filters.clear_all();
        state.rederive();
    }

    /// Replace the sort keys; an empty list restores ledger order
    pub fn apply_sort(&self, keys: Vec<SortKey>) {
        let mut state = self.lock();
        state.sort_keys = keys;
        state.rederive();
    }

    /// Move a column using on-screen positions
    pub fn reorder_column(&self, from: usize, to: usize) -> Result<()> {
        let mut state = self.lock();
        state.columns = state.columns.move_column(from, to, self.options.direction)?;
        Ok(())
    }

    /// Switch between paged and full-table disclosure
    ///
    /// Leaving full mode with several filters active keeps only the first
    /// one, since paged mode filters a single column.
    pub fn set_disclosure_mode(&self, mode: DisclosureMode) {
        let mut state = self.lock();
        if mode == DisclosureMode::Paged {
            state.filters.retain_first();
        }
        state.view = derive_view(&state.ledger.entries, &state.filters, &state.sort_keys);
        let SessionState { disclosure, view, .. } = &mut *state;
        disclosure.set_mode(mode, view);
    }

    // =========================================================================
    // Disclosure
    // =========================================================================

    pub fn load_more(&self) -> Page {
        let mut state = self.lock();
        let SessionState { disclosure, view, .. } = &mut *state;
        disclosure.load_more(view)
    }

    /// Scroll notification from the presentation layer
    pub fn on_scroll(&self, sentinel_top: f64, viewport: Viewport) -> Option<Page> {
        let mut state = self.lock();
        let SessionState { disclosure, view, .. } = &mut *state;
        disclosure.on_scroll(sentinel_top, viewport, view)
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Report that the user followed an outbound link
    pub fn record_link_click(&self, url: &str) {
        let state = self.lock();
        let mut event = AnalyticsEvent::new(LINK_CLICK_EVENT).with_url(url);
        if let Some((key, role)) = &state.current {
            event = event.with_account_key(key.account_key()).with_role(*role);
        }
        if let Some(statement) = &state.statement {
            event = event.with_account_name(statement.profile.name.clone());
        }
        drop(state);
        self.analytics.emit(event);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> LoadState {
        self.lock().load_state.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().load_state.is_loading()
    }

    pub fn error_message(&self) -> Option<String> {
        self.lock().load_state.error_message().map(str::to_string)
    }

    pub fn role(&self) -> Option<AccountRole> {
        self.lock().current.as_ref().map(|(_, role)| *role)
    }

    pub fn profile(&self) -> Option<AccountProfile> {
        self.lock().statement.as_ref().map(|s| s.profile.clone())
    }

    /// The full ledger in chronological order with balances settled
    pub fn ledger(&self) -> Ledger {
        self.lock().ledger.clone()
    }

    pub fn current_balance(&self) -> Money {
        self.lock().ledger.current_balance
    }

    /// Filtered and sorted rows, before disclosure
    pub fn view(&self) -> Vec<StatementEntry> {
        self.lock().view.clone()
    }

    /// Rows revealed so far
    pub fn visible_rows(&self) -> Vec<StatementEntry> {
        self.lock().disclosure.revealed().to_vec()
    }

    pub fn has_more(&self) -> bool {
        let state = self.lock();
        state.disclosure.has_more(&state.view)
    }

    pub fn filters(&self) -> FilterSet {
        self.lock().filters.clone()
    }

    pub fn sort_keys(&self) -> Vec<SortKey> {
        self.lock().sort_keys.clone()
    }

    pub fn columns(&self) -> Vec<Column> {
        self.lock().columns.columns().to_vec()
    }
}
