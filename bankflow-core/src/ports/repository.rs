//! Repository port - storage abstraction for the `banks` table

use crate::domain::result::Result;
use crate::domain::{BankRecord, PersistedBank};

/// A unit of work against the store
///
/// Opening a session begins a transaction. `commit` and `rollback` consume
/// the session; dropping a session that was neither committed nor rolled
/// back must roll it back and release its connection.
pub trait Session {
    /// Insert one row per record, in order. Returns the number inserted.
    fn insert_banks(&mut self, banks: &[BankRecord]) -> Result<usize>;

    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}

/// Storage for persisted banks
pub trait BankRepository: Send + Sync {
    /// Create the table (and supporting objects) if absent
    fn ensure_schema(&self) -> Result<()>;

    /// Open a new session with its own transaction
    fn open_session(&self) -> Result<Box<dyn Session + '_>>;

    /// Number of stored rows
    fn count_banks(&self) -> Result<i64>;

    /// All stored rows ordered by id
    fn get_banks(&self) -> Result<Vec<PersistedBank>>;
}
