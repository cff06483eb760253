//! # Predicate Builder
//!
//! A predicate is an ordered list of typed clauses combined with AND.
//! Clauses carry their operands as values, never as SQL text: the SQL
//! rendering below only ever emits column names and numbered placeholders.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    ServerName,
    LogFileName,
    LogDate,
}

impl Column {
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::ServerName => "server_name",
            Self::LogFileName => "log_file_name",
            Self::LogDate => "log_date",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Gte,
    Lte,
}

impl CompareOp {
    pub const fn sql_operator(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }

    /// Evaluate `lhs <op> rhs` for any totally ordered operand type.
    pub fn holds<T: Ord + ?Sized>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Gte => lhs >= rhs,
            Self::Lte => lhs <= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub column: Column,
    pub op: CompareOp,
    pub value: String,
}

impl Clause {
    pub fn new(column: Column, op: CompareOp, value: impl Into<String>) -> Self {
        Self {
            column,
            op,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn with(mut self, clause: Clause) -> Self {
        self.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render as a `WHERE` fragment with `?1..?N` placeholders, one per
    /// clause in order. An empty predicate renders as an empty string.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let terms: Vec<String> = self
            .clauses
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} {} ?{}", c.column, c.op.sql_operator(), i + 1))
            .collect();
        format!(" WHERE {}", terms.join(" AND "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortKey {
    pub const fn asc(column: Column) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(column: Column) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }

    pub fn order_sql(keys: &[SortKey]) -> String {
        if keys.is_empty() {
            return String::new();
        }
        let terms: Vec<String> = keys
            .iter()
            .map(|k| match k.direction {
                SortDirection::Asc => format!("{} ASC", k.column),
                SortDirection::Desc => format!("{} DESC", k.column),
            })
            .collect();
        format!(" ORDER BY {}", terms.join(", "))
    }
}

/// Most recent day first, then server, then log file.
pub const LISTING_ORDER: [SortKey; 3] = [
    SortKey::desc(Column::LogDate),
    SortKey::asc(Column::ServerName),
    SortKey::asc(Column::LogFileName),
];
