//! # Filter Normalization
//!
//! Dashboards send filter values shaped by their template variables rather
//! than by the data: a wildcard token for "All", or a brace list such as
//! `{app-01,app-02}` when several values are selected. Those shapes are
//! recognised exactly once, here, and resolved to a plain `Option<String>`
//! before any predicate is built.
//!
//! A brace list collapses to "no filter", not to an OR of its members.

use crate::predicate::{Clause, Column, CompareOp, Predicate};
use serde::Deserialize;

/// The wildcard token a dashboard sends for "All".
pub const ALL_SENTINEL: &str = "$__all";

/// One parsed filter dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Unset,
    All,
    One(String),
    ManyCollapsedToAll(Vec<String>),
}

impl FilterValue {
    /// Parse a raw transport value. Order matters: the sentinel is checked
    /// before the brace form, and anything empty is `Unset`.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw {
            Some(v) if !v.is_empty() => v,
            _ => return Self::Unset,
        };

        if raw == ALL_SENTINEL {
            return Self::All;
        }

        if let Some(inner) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            let values = inner
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            return Self::ManyCollapsedToAll(values);
        }

        Self::One(raw.to_string())
    }

    /// Only a single concrete value constrains its dimension.
    pub fn resolve(self) -> Option<String> {
        match self {
            Self::One(v) => Some(v),
            Self::Unset | Self::All | Self::ManyCollapsedToAll(_) => None,
        }
    }
}

/// Raw filter parameters as the transport extracts them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRequest {
    pub server: Option<String>,
    pub logfile: Option<String>,
    pub date: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl FilterRequest {
    pub fn normalize(&self) -> NormalizedFilter {
        NormalizedFilter {
            server: FilterValue::parse(self.server.as_deref()).resolve(),
            logfile: FilterValue::parse(self.logfile.as_deref()).resolve(),
            date: non_empty(self.date.as_deref()),
            from_date: non_empty(self.from_date.as_deref()),
            to_date: non_empty(self.to_date.as_deref()),
        }
    }
}

// Dates are opaque operands; the store decides whether they compare.
fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Filter dimensions after normalization. `None` contributes no clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedFilter {
    pub server: Option<String>,
    pub logfile: Option<String>,
    pub date: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl NormalizedFilter {
    /// The listing predicate: every surviving dimension, AND-combined.
    pub fn predicate(&self) -> Predicate {
        let mut predicate = self.identity_predicate();
        if let Some(date) = &self.date {
            predicate.push(Clause::new(Column::LogDate, CompareOp::Eq, date));
        }
        if let Some(from) = &self.from_date {
            predicate.push(Clause::new(Column::LogDate, CompareOp::Gte, from));
        }
        if let Some(to) = &self.to_date {
            predicate.push(Clause::new(Column::LogDate, CompareOp::Lte, to));
        }
        predicate
    }

    /// Server and log file clauses only. Date dimensions never reach the
    /// statistics queries.
    pub fn identity_predicate(&self) -> Predicate {
        let mut predicate = Predicate::new();
        if let Some(server) = &self.server {
            predicate.push(Clause::new(Column::ServerName, CompareOp::Eq, server));
        }
        if let Some(logfile) = &self.logfile {
            predicate.push(Clause::new(Column::LogFileName, CompareOp::Eq, logfile));
        }
        predicate
    }
}
