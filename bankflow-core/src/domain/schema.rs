//! Table descriptors
//!
//! A `TableSchema` is built once at startup and handed to the storage
//! adapter, which derives its DDL from it. There is no global registry of
//! tables.

use crate::domain::result::{Error, Result};

/// Column storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    /// Variable-length string with a maximum character length
    Varchar(usize),
}

impl ColumnType {
    fn sql(&self) -> String {
        match self {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Varchar(len) => format!("VARCHAR({})", len),
        }
    }
}

/// A single column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub nullable: bool,
}

impl ColumnDef {
    /// A nullable, non-unique column
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            primary_key: false,
            auto_increment: false,
            unique: false,
            nullable: true,
        }
    }

    /// An auto-incrementing integer primary key
    pub fn identity(name: &'static str) -> Self {
        Self {
            primary_key: true,
            auto_increment: true,
            nullable: false,
            ..Self::new(name, ColumnType::Integer)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Descriptor for one relational table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// The `banks` table
    pub fn banks() -> Self {
        Self {
            name: "banks",
            columns: vec![
                ColumnDef::identity("id"),
                ColumnDef::new("ispb", ColumnType::Varchar(20)).not_null().unique(),
                ColumnDef::new("name", ColumnType::Varchar(255)).not_null(),
                ColumnDef::new("code", ColumnType::Integer),
                ColumnDef::new("full_name", ColumnType::Varchar(255)).not_null(),
            ],
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Fail unless every named column is declared
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            if self.column(name).is_none() {
                return Err(Error::Config(format!(
                    "table '{}' has no column '{}'",
                    self.name, name
                )));
            }
        }
        Ok(())
    }

    /// The auto-increment column, if the table has one
    pub fn identity_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.auto_increment)
    }

    /// Name of the sequence backing the identity column
    pub fn sequence_name(&self) -> String {
        format!("{}_id_seq", self.name)
    }

    /// Idempotent DDL creating the table (and its id sequence) if absent.
    ///
    /// Varchar lengths are enforced with CHECK constraints since DuckDB
    /// accepts but ignores the declared length.
    pub fn create_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();

        if self.identity_column().is_some() {
            statements.push(format!(
                "CREATE SEQUENCE IF NOT EXISTS {} START 1",
                self.sequence_name()
            ));
        }

        let mut defs = Vec::new();
        for col in &self.columns {
            let mut def = format!("{} {}", col.name, col.column_type.sql());
            if col.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if col.auto_increment {
                def.push_str(&format!(" DEFAULT nextval('{}')", self.sequence_name()));
            }
            if !col.nullable && !col.primary_key {
                def.push_str(" NOT NULL");
            }
            if col.unique {
                def.push_str(" UNIQUE");
            }
            if let ColumnType::Varchar(len) = col.column_type {
                def.push_str(&format!(" CHECK (length({}) <= {})", col.name, len));
            }
            defs.push(def);
        }

        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            defs.join(",\n    ")
        ));

        statements
    }

    /// Parameterized INSERT for the given columns
    pub fn insert_sql(&self, columns: &[&str]) -> String {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            columns.join(", "),
            placeholders
        )
    }
}
