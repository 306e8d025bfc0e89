//! Statement store port - the per-key cache

use crate::domain::{CompositeKey, Statement};

/// Keyed store holding at most one normalized statement per composite key
///
/// No size bound and no expiry: entries stay until invalidated. Writes are
/// last-write-wins per key.
pub trait StatementStore: Send + Sync {
    /// Look up the statement cached for this key
    fn get(&self, key: &CompositeKey) -> Option<Statement>;

    /// Store (or replace) the statement for this key
    fn put(&self, key: CompositeKey, statement: Statement);

    /// Drop the entry for this key, returning whether one existed
    fn invalidate(&self, key: &CompositeKey) -> bool;
}
