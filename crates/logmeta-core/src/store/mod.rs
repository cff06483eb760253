//! # Storage Read Contract
//!
//! The engine depends on storage by capability only. A [`MetadataStore`]
//! hands out one [`ReadConnection`] per engine call; the connection is
//! released when it is dropped, on success and on error alike.

pub mod memory;
pub mod sqlite;

use crate::error::QueryError;
use crate::model::LogMetadataRecord;
use crate::predicate::{Column, Predicate, SortKey};
use chrono::NaiveDate;

/// Relation name every backend reads from.
pub const TABLE: &str = "log_metadata";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait MetadataStore: Send + Sync {
    /// Open a fresh read connection for a single engine call.
    fn connect(&self) -> Result<Box<dyn ReadConnection + '_>, QueryError>;
}

pub trait ReadConnection {
    /// Rows matching `predicate`, ordered by `order`. Rows that tie on every
    /// key keep insertion order.
    fn select(
        &self,
        predicate: &Predicate,
        order: &[SortKey],
    ) -> Result<Vec<LogMetadataRecord>, QueryError>;

    fn count(&self, predicate: &Predicate) -> Result<u64, QueryError>;

    /// Number of distinct values of `column` over the whole relation.
    fn count_distinct(&self, column: Column) -> Result<u64, QueryError>;

    /// Distinct values of `column` among matching rows, ascending.
    fn distinct(&self, column: Column, predicate: &Predicate) -> Result<Vec<String>, QueryError>;

    /// `(MIN(log_date), MAX(log_date))` over the whole relation.
    fn date_bounds(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), QueryError>;
}

/// Date operands arrive as opaque strings; they must be calendar dates to
/// be compared against `log_date`.
pub(crate) fn parse_date_operand(value: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| QueryError::InvalidArgument {
        column: Column::LogDate.sql_name(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_operand() {
        assert_eq!(
            parse_date_operand("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date_operand("2023-02-29").is_err());
        assert!(parse_date_operand("yesterday").is_err());
        assert!(matches!(
            parse_date_operand("01/02/2024"),
            Err(QueryError::InvalidArgument { column: "log_date", .. })
        ));
    }
}
