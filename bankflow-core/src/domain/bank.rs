//! Bank record models
//!
//! `RawBankRecord` is whatever the remote source sent, kept untyped so shape
//! problems surface during transformation. `BankRecord` is the target shape
//! and `PersistedBank` is a stored row read back from the `banks` table.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};

/// A bank entry exactly as received from the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBankRecord(JsonValue);

impl RawBankRecord {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Look up a top-level field. Returns `None` when the record is not an
    /// object or the key is absent.
    pub fn field(&self, key: &str) -> Option<&JsonValue> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }

    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_value(self) -> JsonValue {
        self.0
    }
}

impl From<JsonValue> for RawBankRecord {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// A bank in the target schema
///
/// Only ever built from a raw record whose `code` is non-null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRecord {
    pub ispb: String,
    pub name: String,
    pub code: i32,
    pub full_name: String,
}

impl BankRecord {
    /// Columns written for each record, in bind order
    pub const COLUMNS: [&'static str; 4] = ["ispb", "name", "code", "full_name"];

    pub fn new(
        ispb: impl Into<String>,
        name: impl Into<String>,
        code: i32,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            ispb: ispb.into(),
            name: name.into(),
            code,
            full_name: full_name.into(),
        }
    }

    /// Map a raw record into the target shape.
    ///
    /// Returns `Ok(None)` when `code` is null. The `code` key is looked up
    /// first, so a null-code record is dropped even if other keys are missing.
    /// `index` is the record position in its batch and only feeds errors.
    pub fn from_raw(raw: &RawBankRecord, index: usize) -> Result<Option<Self>> {
        if !raw.as_value().is_object() {
            return Err(Error::malformed(index, "record is not a JSON object"));
        }

        let code = match raw.field("code") {
            None => return Err(Error::malformed(index, "missing field 'code'")),
            Some(JsonValue::Null) => return Ok(None),
            Some(value) => value
                .as_i64()
                .and_then(|c| i32::try_from(c).ok())
                .ok_or_else(|| {
                    Error::malformed(index, format!("field 'code' is not an integer: {}", value))
                })?,
        };

        Ok(Some(Self {
            ispb: required_str(raw, "ispb", index)?,
            name: required_str(raw, "name", index)?,
            code,
            full_name: required_str(raw, "fullName", index)?,
        }))
    }
}

fn required_str(raw: &RawBankRecord, key: &str, index: usize) -> Result<String> {
    match raw.field(key) {
        None => Err(Error::malformed(index, format!("missing field '{}'", key))),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::malformed(
            index,
            format!("field '{}' is not a string: {}", key, other),
        )),
    }
}

/// A row of the `banks` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBank {
    pub id: i64,
    pub ispb: String,
    pub name: String,
    /// Nullable in the column definition, always set by this pipeline
    pub code: Option<i32>,
    pub full_name: String,
}

impl PersistedBank {
    /// Whether this row holds exactly the given record
    pub fn matches(&self, record: &BankRecord) -> bool {
        self.ispb == record.ispb
            && self.name == record.name
            && self.code == Some(record.code)
            && self.full_name == record.full_name
    }
}
