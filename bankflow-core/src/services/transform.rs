//! Transform step - reshape raw records into the target schema
//!
//! Pure functions: no I/O, same output for the same input.

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::{BankRecord, RawBankRecord};

/// What to do with a record missing a required field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Abort the whole batch with `Error::MalformedRecord`
    #[default]
    Fail,
    /// Skip the record and keep going
    Skip,
}

/// Output of a transform run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    pub banks: Vec<BankRecord>,
    /// Records dropped for having a null code
    pub dropped: usize,
    /// Malformed records skipped under `MalformedPolicy::Skip`
    pub skipped: usize,
}

/// Transform with the strict policy
pub fn transform(records: &[RawBankRecord]) -> Result<TransformOutput> {
    transform_with_policy(records, MalformedPolicy::Fail)
}

/// Map each raw record to a `BankRecord`, preserving input order.
///
/// Null-code records are dropped silently. Malformed records either abort
/// the batch or are skipped, depending on `policy`.
pub fn transform_with_policy(
    records: &[RawBankRecord],
    policy: MalformedPolicy,
) -> Result<TransformOutput> {
    let mut output = TransformOutput {
        banks: Vec::with_capacity(records.len()),
        ..Default::default()
    };

    for (index, raw) in records.iter().enumerate() {
        match BankRecord::from_raw(raw, index) {
            Ok(Some(bank)) => output.banks.push(bank),
            Ok(None) => output.dropped += 1,
            Err(err @ Error::MalformedRecord { .. }) => match policy {
                MalformedPolicy::Fail => return Err(err),
                MalformedPolicy::Skip => output.skipped += 1,
            },
            Err(err) => return Err(err),
        }
    }

    Ok(output)
}
