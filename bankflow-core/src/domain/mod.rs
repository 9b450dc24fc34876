//! Core domain entities
//!
//! Pure data structures and their mapping rules - no I/O.

mod bank;
pub mod result;
pub mod schema;

pub use bank::{BankRecord, PersistedBank, RawBankRecord};
pub use schema::{ColumnDef, ColumnType, TableSchema};
