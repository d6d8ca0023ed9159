use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

use crate::application::errors::StorageError;

/// A result row, one value per selected column
pub type Row = Vec<Value>;

/// Storage accessor handed to plugins.
///
/// Every call runs a single statement in autocommit mode, so the change is
/// durable once `query` returns. There is no cross-call transaction.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!("Database opened: {}", path.display());
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Run one parameterised statement and return every row it produced
    pub fn query<P>(&self, sql: &str, params: P) -> Result<Vec<Row>, StorageError>
    where
        P: IntoIterator,
        P::Item: Into<Value>,
    {
        let params: Vec<Value> = params.into_iter().map(Into::into).collect();
        let mut stmt = self.conn.prepare(sql)?;
        let columns = stmt.column_count();

        let rows = stmt.query_map(params_from_iter(params.iter()), |row| -> rusqlite::Result<Row> {
            (0..columns).map(|i| row.get::<_, Value>(i)).collect()
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Convenience for statements that take no parameters
    pub fn execute(&self, sql: &str) -> Result<Vec<Row>, StorageError> {
        self.query(sql, std::iter::empty::<Value>())
    }
}
