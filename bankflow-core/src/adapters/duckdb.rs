//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use duckdb::{params, Connection};

use crate::domain::result::{Error, Result};
use crate::domain::{BankRecord, PersistedBank, TableSchema};
use crate::ports::{BankRepository, Session};

/// DuckDB-backed bank store
///
/// One connection guarded by a mutex; a `DuckDbSession` holds the lock for
/// its whole transaction.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    schema: TableSchema,
    insert_sql: String,
}

impl DuckDbRepository {
    /// Open (or create) a database file
    pub fn new(db_path: &Path, schema: TableSchema) -> Result<Self> {
        // Extension autoloading is disabled so no cached extensions are pulled in
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Self::from_connection(conn, Some(db_path.to_path_buf()), schema)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory(schema: TableSchema) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None, schema)
    }

    fn from_connection(
        conn: Connection,
        db_path: Option<PathBuf>,
        schema: TableSchema,
    ) -> Result<Self> {
        schema.require_columns(&BankRecord::COLUMNS)?;
        let insert_sql = schema.insert_sql(&BankRecord::COLUMNS);

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            schema,
            insert_sql,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Database file path, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            [table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::persistence(format!("Lock poisoned: {}", e)))
    }
}

impl BankRepository for DuckDbRepository {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        for statement in self.schema.create_statements() {
            conn.execute_batch(&statement)?;
        }
        Ok(())
    }

    fn open_session(&self) -> Result<Box<dyn Session + '_>> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")?;

        Ok(Box::new(DuckDbSession {
            conn,
            insert_sql: &self.insert_sql,
            open: true,
        }))
    }

    fn count_banks(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.schema.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn get_banks(&self) -> Result<Vec<PersistedBank>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, ispb, name, code, full_name FROM {} ORDER BY id",
            self.schema.name
        ))?;

        let banks = stmt
            .query_map([], |row| {
                Ok(PersistedBank {
                    id: row.get(0)?,
                    ispb: row.get(1)?,
                    name: row.get(2)?,
                    code: row.get(3)?,
                    full_name: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(banks)
    }
}

/// An open DuckDB transaction
///
/// Holds the connection lock until committed, rolled back or dropped.
pub struct DuckDbSession<'a> {
    conn: MutexGuard<'a, Connection>,
    insert_sql: &'a str,
    open: bool,
}

impl Session for DuckDbSession<'_> {
    fn insert_banks(&mut self, banks: &[BankRecord]) -> Result<usize> {
        let mut stmt = self.conn.prepare(self.insert_sql)?;

        for bank in banks {
            stmt.execute(params![bank.ispb, bank.name, bank.code, bank.full_name])
                .map_err(|e| {
                    Error::persistence(format!("Failed to insert bank {}: {}", bank.ispb, e))
                })?;
        }

        Ok(banks.len())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        // Cleared first: a failed ROLLBACK should not be retried from drop
        self.open = false;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for DuckDbSession<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}
