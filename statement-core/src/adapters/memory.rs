//! In-memory statement store

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{CompositeKey, Statement};
use crate::ports::StatementStore;

/// Process-lifetime store, one statement per composite key
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CompositeKey, Statement>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatementStore for MemoryStore {
    fn get(&self, key: &CompositeKey) -> Option<Statement> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: CompositeKey, statement: Statement) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, statement);
        }
    }

    fn invalidate(&self, key: &CompositeKey) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }
}
