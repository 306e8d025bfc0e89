//! Load coordinator - fetch, normalize and cache with supersession
//!
//! Every load captures a generation number from its view's sequence when it
//! is issued. Its result is committed only if that view has issued no newer
//! load since; otherwise it is dropped on the floor. Superseded requests are
//! not aborted, only ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{AccountRole, CompositeKey, Statement};
use crate::ports::StatementTransport;
use crate::services::cache::StatementCache;
use crate::services::normalize::{normalize_entries, normalize_profile};

/// Handle for one issued load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    key: CompositeKey,
    role: AccountRole,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn key(&self) -> &CompositeKey {
        &self.key
    }

    pub fn role(&self) -> AccountRole {
        self.role
    }
}

/// A finished fetch, not yet committed
#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: Result<Statement>,
    pub from_cache: bool,
}

/// What committing a completion did
#[derive(Debug)]
pub enum LoadOutcome {
    /// The load was current and succeeded
    Applied(Statement),
    /// The load was current and failed
    Failed(Error),
    /// A newer load was issued; the result was discarded
    Superseded,
}

/// Generation counter for one view
///
/// Each view owns its own sequence, so a load in one view never supersedes
/// a load in another. Views still share the coordinator and its cache.
#[derive(Debug, Default)]
pub struct LoadSequence {
    generation: AtomicU64,
}

impl LoadSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new load, superseding every earlier one in this view
    pub fn issue(&self, key: CompositeKey, role: AccountRole) -> Ticket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(key = %key, role = %role, generation, "load issued");
        Ticket { generation, key, role }
    }

    /// Whether no load has been issued after this one
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }
}

/// Fetches statements through the transport and the shared cache
pub struct LoadCoordinator {
    transport: Arc<dyn StatementTransport>,
    cache: Arc<StatementCache>,
}

impl LoadCoordinator {
    pub fn new(transport: Arc<dyn StatementTransport>, cache: Arc<StatementCache>) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &Arc<StatementCache> {
        &self.cache
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Resolve the statement for a ticket, from cache or transport
    ///
    /// Both sub-fetches are polled together. The first error ends the load
    /// without waiting for the other one.
    pub async fn fetch(&self, ticket: Ticket) -> Completion {
        if let Some(statement) = self.cache.get(&ticket.key, ticket.role) {
            return Completion {
                ticket,
                result: Ok(statement),
                from_cache: true,
            };
        }

        let result = self.fetch_remote(&ticket.key, ticket.role).await;
        Completion {
            ticket,
            result,
            from_cache: false,
        }
    }

    async fn fetch_remote(&self, key: &CompositeKey, role: AccountRole) -> Result<Statement> {
        let (header, transactions) = tokio::try_join!(
            self.transport.fetch_statement(key, role),
            self.transport.fetch_transactions(key, role),
        )?;

        let profile = normalize_profile(&header)?;
        let entries = normalize_entries(&transactions)?;
        Ok(Statement::new(role, profile, entries))
    }

    /// Apply a completion if it still belongs to the latest load of its view
    pub fn commit(&self, sequence: &LoadSequence, completion: Completion) -> LoadOutcome {
        let Completion {
            ticket,
            result,
            from_cache,
        } = completion;

        if !sequence.is_current(&ticket) {
            warn!(
                key = %ticket.key,
                generation = ticket.generation,
                "Discarding response from superseded load"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(statement) => {
                if !from_cache {
                    self.cache.put(ticket.key.clone(), statement.clone());
                }
                info!(
                    key = %ticket.key,
                    role = %ticket.role,
                    entries = statement.entries.len(),
                    from_cache,
                    "statement loaded"
                );
                LoadOutcome::Applied(statement)
            }
            Err(e) => {
                if e.is_transient() {
                    debug!(key = %ticket.key, error = %e, "load aborted in transport");
                } else {
                    warn!(key = %ticket.key, error = %e, "load failed");
                }
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Issue, fetch and commit in one go
    pub async fn load(&self, sequence: &LoadSequence, key: CompositeKey, role: AccountRole) -> LoadOutcome {
        let ticket = sequence.issue(key, role);
        let completion = self.fetch(ticket).await;
        self.commit(sequence, completion)
    }
}
