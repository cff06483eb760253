//! # Query Engine
//!
//! Stateless front door over a [`MetadataStore`]. Each operation opens one
//! connection, runs its reads, and drops the connection before returning.
//! Failures are never retried or swallowed.

use crate::error::QueryError;
use crate::filter::FilterRequest;
use crate::model::{LogMetadataRecord, StatsSummary};
use crate::predicate::{Clause, Column, CompareOp, Predicate, LISTING_ORDER};
use crate::store::MetadataStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn MetadataStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// All records matching `request`, most recent day first, then by
    /// server and log file. No pagination: the full match set is returned.
    pub fn list(&self, request: &FilterRequest) -> Result<Vec<LogMetadataRecord>, QueryError> {
        let predicate = request.normalize().predicate();
        let conn = self.store.connect()?;
        let records = conn.select(&predicate, &LISTING_ORDER)?;
        tracing::debug!(
            clauses = predicate.len(),
            rows = records.len(),
            "list executed"
        );
        Ok(records)
    }

    /// `total_count` honours the server/log file filters; the distinct
    /// counts and date bounds always cover the whole index. Date filters in
    /// `request` are ignored.
    pub fn stats(&self, request: &FilterRequest) -> Result<StatsSummary, QueryError> {
        let predicate = request.normalize().identity_predicate();
        let conn = self.store.connect()?;

        let total_count = conn.count(&predicate)?;
        let distinct_server_count = conn.count_distinct(Column::ServerName)?;
        let distinct_logfile_count = conn.count_distinct(Column::LogFileName)?;
        let (earliest_date, latest_date) = conn.date_bounds()?;

        tracing::debug!(clauses = predicate.len(), total_count, "stats executed");
        Ok(StatsSummary {
            total_count,
            distinct_server_count,
            distinct_logfile_count,
            earliest_date,
            latest_date,
        })
    }

    /// Every server name in the index, ascending.
    pub fn servers(&self) -> Result<Vec<String>, QueryError> {
        let conn = self.store.connect()?;
        conn.distinct(Column::ServerName, &Predicate::new())
    }

    /// Every log file name, ascending, optionally restricted to one server.
    /// The value is used as given: no sentinel handling.
    pub fn log_files(&self, server: Option<&str>) -> Result<Vec<String>, QueryError> {
        let mut predicate = Predicate::new();
        if let Some(server) = server.filter(|s| !s.is_empty()) {
            predicate.push(Clause::new(Column::ServerName, CompareOp::Eq, server));
        }
        let conn = self.store.connect()?;
        conn.distinct(Column::LogFileName, &predicate)
    }
}
