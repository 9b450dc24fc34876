//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on concrete implementations.

mod bank_source;
mod repository;

pub use bank_source::BankSource;
pub use repository::{BankRepository, Session};
