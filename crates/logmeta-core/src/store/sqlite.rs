//! # SQLite Store
//!
//! Reads the `log_metadata` table through a read-only connection opened per
//! engine call. Every operand is bound as a parameter.

use super::{parse_date_operand, MetadataStore, ReadConnection, TABLE};
use crate::error::QueryError;
use crate::model::LogMetadataRecord;
use crate::predicate::{Column, Predicate, SortKey};
use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};

/// Layout of the relation this store reads. Rows are written by the
/// ingestion process; this crate never writes.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS log_metadata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    server_name TEXT NOT NULL,
    log_file_name TEXT NOT NULL,
    log_date DATE NOT NULL,
    blob_url TEXT NOT NULL,
    file_size_mb REAL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
";

const RECORD_COLUMNS: &str =
    "id, server_name, log_file_name, log_date, blob_url, file_size_mb, created_at";

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataStore for SqliteStore {
    fn connect(&self) -> Result<Box<dyn ReadConnection + '_>, QueryError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            QueryError::StorageUnavailable {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        tracing::trace!("Opened read connection to {:?}", self.path);
        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection {
    conn: Connection,
}

/// Bind values for `predicate`, in clause order. Date operands are parsed
/// first so a malformed date never reaches SQLite as text.
fn bind_values(predicate: &Predicate) -> Result<Vec<Box<dyn ToSql>>, QueryError> {
    predicate
        .clauses()
        .iter()
        .map(|c| -> Result<Box<dyn ToSql>, QueryError> {
            match c.column {
                Column::LogDate => Ok(Box::new(parse_date_operand(&c.value)?)),
                Column::ServerName | Column::LogFileName => Ok(Box::new(c.value.clone())),
            }
        })
        .collect()
}

/// `ORDER BY` for `order`, with `id` as the final tie-breaker so rows that
/// tie on every key come back in insertion order.
fn order_with_tiebreak(order: &[SortKey]) -> String {
    if order.is_empty() {
        " ORDER BY id ASC".to_string()
    } else {
        format!("{}, id ASC", SortKey::order_sql(order))
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<LogMetadataRecord> {
    Ok(LogMetadataRecord {
        id: row.get(0)?,
        server_name: row.get(1)?,
        log_file_name: row.get(2)?,
        log_date: row.get(3)?,
        blob_url: row.get(4)?,
        file_size_mb: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl ReadConnection for SqliteConnection {
    fn select(
        &self,
        predicate: &Predicate,
        order: &[SortKey],
    ) -> Result<Vec<LogMetadataRecord>, QueryError> {
        let values = bind_values(predicate)?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM {TABLE}{}{}",
            predicate.where_sql(),
            order_with_tiebreak(order)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn count(&self, predicate: &Predicate) -> Result<u64, QueryError> {
        let values = bind_values(predicate)?;
        let sql = format!("SELECT COUNT(*) FROM {TABLE}{}", predicate.where_sql());
        let total: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(total as u64)
    }

    fn count_distinct(&self, column: Column) -> Result<u64, QueryError> {
        let sql = format!("SELECT COUNT(DISTINCT {column}) FROM {TABLE}");
        let total: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(total as u64)
    }

    fn distinct(&self, column: Column, predicate: &Predicate) -> Result<Vec<String>, QueryError> {
        let values = bind_values(predicate)?;
        let sql = format!(
            "SELECT DISTINCT {column} FROM {TABLE}{} ORDER BY {column}",
            predicate.where_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let out = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(out)
    }

    fn date_bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), QueryError> {
        let sql = format!("SELECT MIN(log_date), MAX(log_date) FROM {TABLE}");
        let bounds: (Option<NaiveDate>, Option<NaiveDate>) = self
            .conn
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Clause, CompareOp, LISTING_ORDER};
    use rusqlite::params;
    use tempfile::TempDir;

    fn seeded(rows: &[(&str, &str, &str)]) -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        for (server, file, date) in rows {
            conn.execute(
                "INSERT INTO log_metadata (server_name, log_file_name, log_date, blob_url, file_size_mb)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![server, file, date, format!("https://blobs/{server}/{date}/{file}"), 12.5],
            )
            .unwrap();
        }
        (dir, SqliteStore::new(path))
    }

    #[test]
    fn test_missing_database_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("absent.db"));
        assert!(matches!(
            store.connect(),
            Err(QueryError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_select_orders_and_reads_all_columns() {
        let (_dir, store) = seeded(&[
            ("B", "y", "2024-01-01"),
            ("A", "x", "2024-01-01"),
            ("A", "x", "2024-01-02"),
        ]);
        let conn = store.connect().unwrap();
        let rows = conn.select(&Predicate::new(), &LISTING_ORDER).unwrap();
        let keys: Vec<(String, String, String)> = rows
            .iter()
            .map(|r| (r.log_date.to_string(), r.server_name.clone(), r.log_file_name.clone()))
            .collect();
        let expected: Vec<(String, String, String)> = [
            ("2024-01-02", "A", "x"),
            ("2024-01-01", "A", "x"),
            ("2024-01-01", "B", "y"),
        ]
        .iter()
        .map(|(d, s, f)| (d.to_string(), s.to_string(), f.to_string()))
        .collect();
        assert_eq!(keys, expected);
        assert_eq!(rows[0].file_size_mb, Some(12.5));
        assert!(rows[0].blob_url.ends_with("/A/2024-01-02/x"));
    }

    #[test]
    fn test_injection_shaped_value_is_just_a_value() {
        let (_dir, store) = seeded(&[("A", "x", "2024-01-01")]);
        let conn = store.connect().unwrap();
        let p = Predicate::new().with(Clause::new(
            Column::ServerName,
            CompareOp::Eq,
            "A' OR '1'='1",
        ));
        assert_eq!(conn.count(&p).unwrap(), 0);
        assert_eq!(conn.count(&Predicate::new()).unwrap(), 1);
    }

    #[test]
    fn test_malformed_date_is_rejected_before_query() {
        let (_dir, store) = seeded(&[("A", "x", "2024-01-01")]);
        let conn = store.connect().unwrap();
        let p = Predicate::new().with(Clause::new(Column::LogDate, CompareOp::Gte, "2024-13-45"));
        assert!(matches!(
            conn.select(&p, &LISTING_ORDER),
            Err(QueryError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_aggregates_on_empty_table() {
        let (_dir, store) = seeded(&[]);
        let conn = store.connect().unwrap();
        assert_eq!(conn.count(&Predicate::new()).unwrap(), 0);
        assert_eq!(conn.count_distinct(Column::ServerName).unwrap(), 0);
        assert_eq!(conn.date_bounds().unwrap(), (None, None));
        assert!(conn
            .distinct(Column::LogFileName, &Predicate::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_distinct_with_filter() {
        let (_dir, store) = seeded(&[
            ("A", "y", "2024-01-01"),
            ("A", "x", "2024-01-01"),
            ("B", "z", "2024-01-01"),
            ("A", "x", "2024-01-02"),
        ]);
        let conn = store.connect().unwrap();
        let p = Predicate::new().with(Clause::new(Column::ServerName, CompareOp::Eq, "A"));
        assert_eq!(
            conn.distinct(Column::LogFileName, &p).unwrap(),
            vec!["x", "y"]
        );
    }
}
