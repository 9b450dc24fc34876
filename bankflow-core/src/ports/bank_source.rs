//! Bank source port
//!
//! Defines the interface for fetching the raw bank list from an external
//! source (the public REST endpoint, a cache in front of it, test doubles).

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::RawBankRecord;

/// Fetches raw bank records
///
/// Implementations perform at most one outbound read per call and return
/// the records in the order the source produced them.
pub trait BankSource: Send + Sync {
    /// Source name used in logs (e.g. "brasilapi")
    fn name(&self) -> &str;

    /// Fetch every raw record available at `source_url`
    fn fetch(&self, source_url: &str) -> Result<Vec<RawBankRecord>>;
}

impl<S: BankSource + ?Sized> BankSource for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, source_url: &str) -> Result<Vec<RawBankRecord>> {
        (**self).fetch(source_url)
    }
}
