//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - BrasilAPI HTTP client for the BankSource port
//! - DuckDB for the BankRepository port

pub mod brasilapi;
pub mod duckdb;

#[cfg(test)]
pub mod brasilapi_mock;
