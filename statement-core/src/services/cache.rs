//! Cache service - per-key statement cache with first-load analytics

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::{AccountRole, CompositeKey, Statement};
use crate::ports::{AnalyticsEvent, AnalyticsSink, StatementStore};

/// Statement cache
///
/// Wraps a [`StatementStore`] and emits one `Page_Link` event the first time
/// a key is populated for a role. Pairs seen once stay seen for the life of
/// the cache, so an invalidate-and-reload does not count as a new visit.
///
/// The store holds one statement per key whatever its role; a lookup only
/// hits when the cached statement was loaded for the requested role.
pub struct StatementCache {
    store: Arc<dyn StatementStore>,
    analytics: Arc<dyn AnalyticsSink>,
    seen: Mutex<HashSet<(CompositeKey, AccountRole)>>,
}

impl StatementCache {
    pub fn new(store: Arc<dyn StatementStore>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            store,
            analytics,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn get(&self, key: &CompositeKey, role: AccountRole) -> Option<Statement> {
        let hit = self.store.get(key).filter(|statement| statement.role == role);
        debug!(key = %key, role = %role, hit = hit.is_some(), "statement cache lookup");
        hit
    }

    /// Store a statement, replacing any previous value for the key
    pub fn put(&self, key: CompositeKey, statement: Statement) {
        let first_population = match self.seen.lock() {
            Ok(mut seen) => seen.insert((key.clone(), statement.role)),
            // A poisoned set only means a panic elsewhere; treat the key as seen
            Err(_) => false,
        };

        if first_population {
            let event = AnalyticsEvent::page_link(&key, &statement.profile.name, statement.role);
            self.analytics.emit(event);
        }

        self.store.put(key, statement);
    }

    /// Drop the cached statement so the next load goes to the transport
    pub fn invalidate(&self, key: &CompositeKey) -> bool {
        let removed = self.store.invalidate(key);
        debug!(key = %key, removed, "statement cache invalidated");
        removed
    }

    pub fn analytics(&self) -> &Arc<dyn AnalyticsSink> {
        &self.analytics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::analytics::MemoryAnalytics;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::AccountProfile;

    fn cache() -> (StatementCache, Arc<MemoryAnalytics>) {
        let analytics = Arc::new(MemoryAnalytics::new());
        let cache = StatementCache::new(Arc::new(MemoryStore::new()), analytics.clone());
        (cache, analytics)
    }

    fn statement(name: &str) -> Statement {
        Statement::new(AccountRole::Client, AccountProfile::new(name), Vec::new())
    }

    #[test]
    fn test_get_after_put() {
        let (cache, _) = cache();
        let key = CompositeKey::new("K1", "H1").unwrap();
        assert!(cache.get(&key, AccountRole::Client).is_none());

        cache.put(key.clone(), statement("Acme"));
        assert_eq!(cache.get(&key, AccountRole::Client).unwrap().profile.name, "Acme");
    }

    #[test]
    fn test_last_write_wins() {
        let (cache, _) = cache();
        let key = CompositeKey::new("K1", "H1").unwrap();
        cache.put(key.clone(), statement("old"));
        cache.put(key.clone(), statement("new"));
        assert_eq!(cache.get(&key, AccountRole::Client).unwrap().profile.name, "new");
    }

    #[test]
    fn test_keys_differ_by_hash() {
        let (cache, _) = cache();
        let a = CompositeKey::new("K1", "H1").unwrap();
        let b = CompositeKey::new("K1", "H2").unwrap();
        cache.put(a.clone(), statement("a"));
        assert!(cache.get(&b, AccountRole::Client).is_none());
    }

    #[test]
    fn test_page_link_once_per_key() {
        let (cache, analytics) = cache();
        let key = CompositeKey::new("K1", "H1").unwrap();

        cache.put(key.clone(), statement("Acme"));
        cache.put(key.clone(), statement("Acme"));
        assert!(cache.invalidate(&key));
        cache.put(key.clone(), statement("Acme"));

        let events = analytics.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "Page_Link");
        assert_eq!(events[0].account_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_lookup_misses_for_other_role() {
        let (cache, analytics) = cache();
        let key = CompositeKey::new("K1", "H1").unwrap();
        cache.put(key.clone(), statement("Acme"));
        assert!(cache.get(&key, AccountRole::Supplier).is_none());

        let supplier = Statement::new(AccountRole::Supplier, AccountProfile::new("Acme Supplies"), Vec::new());
        cache.put(key.clone(), supplier);
        assert_eq!(cache.get(&key, AccountRole::Supplier).unwrap().profile.name, "Acme Supplies");
        assert!(cache.get(&key, AccountRole::Client).is_none());

        // Each role's page counts as its own visit
        assert_eq!(analytics.count("Page_Link"), 2);
    }

    #[test]
    fn test_invalidate_missing_key() {
        let (cache, _) = cache();
        let key = CompositeKey::new("K9", "H9").unwrap();
        assert!(!cache.invalidate(&key));
    }
}
