//! # In-Memory Store
//!
//! A [`MetadataStore`] over a vector of records in insertion order. Used as
//! the substitute backend in tests and for small fixed fixtures.

use super::{parse_date_operand, MetadataStore, ReadConnection};
use crate::error::QueryError;
use crate::model::LogMetadataRecord;
use crate::predicate::{Column, CompareOp, Predicate, SortDirection, SortKey};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

pub struct MemoryStore {
    records: Vec<LogMetadataRecord>,
    online: AtomicBool,
}

impl MemoryStore {
    pub fn new(records: Vec<LogMetadataRecord>) -> Self {
        Self {
            records,
            online: AtomicBool::new(true),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// While offline every `connect` fails with `StorageUnavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, AtomicOrdering::SeqCst);
    }
}

impl MetadataStore for MemoryStore {
    fn connect(&self) -> Result<Box<dyn ReadConnection + '_>, QueryError> {
        if !self.online.load(AtomicOrdering::SeqCst) {
            return Err(QueryError::StorageUnavailable {
                path: PathBuf::from(":memory:"),
                reason: "store is offline".into(),
            });
        }
        Ok(Box::new(MemoryConnection {
            records: &self.records,
        }))
    }
}

struct MemoryConnection<'a> {
    records: &'a [LogMetadataRecord],
}

enum Operand {
    Text(String),
    Date(NaiveDate),
}

struct CompiledClause {
    column: Column,
    op: CompareOp,
    operand: Operand,
}

impl CompiledClause {
    fn matches(&self, record: &LogMetadataRecord) -> bool {
        match (&self.operand, self.column) {
            (Operand::Date(d), _) => self.op.holds(&record.log_date, d),
            (Operand::Text(v), column) => self.op.holds(text_of(record, column), v.as_str()),
        }
    }
}

fn compile(predicate: &Predicate) -> Result<Vec<CompiledClause>, QueryError> {
    predicate
        .clauses()
        .iter()
        .map(|c| {
            let operand = match c.column {
                Column::LogDate => Operand::Date(parse_date_operand(&c.value)?),
                Column::ServerName | Column::LogFileName => Operand::Text(c.value.clone()),
            };
            Ok(CompiledClause {
                column: c.column,
                op: c.op,
                operand,
            })
        })
        .collect()
}

fn text_of(record: &LogMetadataRecord, column: Column) -> &str {
    match column {
        Column::ServerName => &record.server_name,
        Column::LogFileName => &record.log_file_name,
        // Dates are compiled to `Operand::Date` and never compared as text.
        Column::LogDate => "",
    }
}

fn value_of(record: &LogMetadataRecord, column: Column) -> String {
    match column {
        Column::LogDate => record.log_date.to_string(),
        other => text_of(record, other).to_string(),
    }
}

fn compare_by(a: &LogMetadataRecord, b: &LogMetadataRecord, key: &SortKey) -> Ordering {
    let ord = match key.column {
        Column::LogDate => a.log_date.cmp(&b.log_date),
        column => text_of(a, column).cmp(text_of(b, column)),
    };
    match key.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

impl MemoryConnection<'_> {
    fn matching(&self, predicate: &Predicate) -> Result<Vec<&LogMetadataRecord>, QueryError> {
        let clauses = compile(predicate)?;
        Ok(self
            .records
            .iter()
            .filter(|r| clauses.iter().all(|c| c.matches(r)))
            .collect())
    }
}

impl ReadConnection for MemoryConnection<'_> {
    fn select(
        &self,
        predicate: &Predicate,
        order: &[SortKey],
    ) -> Result<Vec<LogMetadataRecord>, QueryError> {
        let mut rows: Vec<LogMetadataRecord> = self
            .matching(predicate)?
            .into_iter()
            .cloned()
            .collect();
        // Stable: equal rows keep insertion order.
        rows.sort_by(|a, b| {
            order
                .iter()
                .map(|k| compare_by(a, b, k))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(rows)
    }

    fn count(&self, predicate: &Predicate) -> Result<u64, QueryError> {
        Ok(self.matching(predicate)?.len() as u64)
    }

    fn count_distinct(&self, column: Column) -> Result<u64, QueryError> {
        let values: BTreeSet<String> = self.records.iter().map(|r| value_of(r, column)).collect();
        Ok(values.len() as u64)
    }

    fn distinct(&self, column: Column, predicate: &Predicate) -> Result<Vec<String>, QueryError> {
        let values: BTreeSet<String> = self
            .matching(predicate)?
            .into_iter()
            .map(|r| value_of(r, column))
            .collect();
        Ok(values.into_iter().collect())
    }

    fn date_bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), QueryError> {
        let earliest = self.records.iter().map(|r| r.log_date).min();
        let latest = self.records.iter().map(|r| r.log_date).max();
        Ok((earliest, latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{Clause, LISTING_ORDER};

    fn record(id: i64, server: &str, file: &str, date: &str) -> LogMetadataRecord {
        let log_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        LogMetadataRecord {
            id,
            server_name: server.into(),
            log_file_name: file.into(),
            log_date,
            blob_url: format!("https://blobs/{server}/{date}/{file}"),
            file_size_mb: Some(1.5),
            created_at: log_date.and_hms_opt(1, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_offline_store_refuses_connections() {
        let store = MemoryStore::empty();
        store.set_online(false);
        assert!(matches!(
            store.connect(),
            Err(QueryError::StorageUnavailable { .. })
        ));
        store.set_online(true);
        assert!(store.connect().is_ok());
    }

    #[test]
    fn test_duplicate_triples_keep_insertion_order() {
        let store = MemoryStore::new(vec![
            record(1, "A", "x", "2024-01-01"),
            record(2, "A", "x", "2024-01-01"),
            record(3, "A", "x", "2024-01-02"),
        ]);
        let conn = store.connect().unwrap();
        let ids: Vec<i64> = conn
            .select(&Predicate::new(), &LISTING_ORDER)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_date_range_compares_as_dates() {
        let store = MemoryStore::new(vec![
            record(1, "A", "x", "2024-01-09"),
            record(2, "A", "x", "2024-01-10"),
        ]);
        let conn = store.connect().unwrap();
        let p = Predicate::new().with(Clause::new(Column::LogDate, CompareOp::Gte, "2024-01-10"));
        assert_eq!(conn.count(&p).unwrap(), 1);
    }

    #[test]
    fn test_malformed_date_operand_is_invalid_argument() {
        let store = MemoryStore::new(vec![record(1, "A", "x", "2024-01-01")]);
        let conn = store.connect().unwrap();
        let p = Predicate::new().with(Clause::new(Column::LogDate, CompareOp::Lte, "not-a-date"));
        assert!(matches!(
            conn.select(&p, &LISTING_ORDER),
            Err(QueryError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_distinct_dates_render_iso() {
        let store = MemoryStore::new(vec![
            record(1, "A", "x", "2024-01-02"),
            record(2, "B", "x", "2024-01-01"),
            record(3, "B", "y", "2024-01-01"),
        ]);
        let conn = store.connect().unwrap();
        assert_eq!(
            conn.distinct(Column::LogDate, &Predicate::new()).unwrap(),
            vec!["2024-01-01", "2024-01-02"]
        );
        assert_eq!(conn.count_distinct(Column::LogFileName).unwrap(), 2);
    }
}
