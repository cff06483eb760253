//! # Data Model
//!
//! One [`LogMetadataRecord`] per observed log file instance. Records are
//! written by an external ingestion process and are read-only here.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMetadataRecord {
    pub id: i64,
    pub server_name: String,
    pub log_file_name: String,
    /// The day the log pertains to (`YYYY-MM-DD` on the wire).
    pub log_date: NaiveDate,
    /// Opaque locator of the stored blob. Never dereferenced.
    pub blob_url: String,
    pub file_size_mb: Option<f64>,
    pub created_at: NaiveDateTime,
}

/// Aggregate statistics over the index.
///
/// Only `total_count` honours the server/log file filters. The remaining
/// four fields are global aggregates over the whole relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(rename = "total_logs")]
    pub total_count: u64,
    #[serde(rename = "server_count")]
    pub distinct_server_count: u64,
    #[serde(rename = "logfile_count")]
    pub distinct_logfile_count: u64,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_wire_keys() {
        let stats = StatsSummary {
            total_count: 3,
            distinct_server_count: 2,
            distinct_logfile_count: 1,
            earliest_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            latest_date: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_logs"], 3);
        assert_eq!(json["server_count"], 2);
        assert_eq!(json["logfile_count"], 1);
        assert_eq!(json["earliest_date"], "2024-01-01");
        assert!(json["latest_date"].is_null());
    }

    #[test]
    fn test_record_serializes_date_as_iso() {
        let record = LogMetadataRecord {
            id: 7,
            server_name: "app-server-01".into(),
            log_file_name: "error.log".into(),
            log_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            blob_url: "https://blobs/app-server-01/2024-03-09/error.log".into(),
            file_size_mb: None,
            created_at: NaiveDate::from_ymd_opt(2024, 3, 10)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["log_date"], "2024-03-09");
        assert!(json["file_size_mb"].is_null());
    }
}
