//! # logmeta-core — Log Metadata Query Engine
//!
//! Indexes facts about log files produced by a fleet of servers (which
//! server, which log type, which day, where the blob lives) and answers
//! filtered listing and statistics queries against that index.
//!
//! The flow of every query is the same:
//!
//! 1. Raw transport strings arrive as a [`FilterRequest`].
//! 2. Each dimension is parsed once into a [`FilterValue`] and resolved to
//!    an optional value ([`NormalizedFilter`]).
//! 3. Surviving dimensions become typed [`Clause`]s in a [`Predicate`].
//! 4. The [`QueryEngine`] hands the predicate to a [`MetadataStore`]
//!    connection and shapes the rows into records or a [`StatsSummary`].

pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod predicate;
pub mod store;

pub use engine::QueryEngine;
pub use error::QueryError;
pub use filter::{FilterRequest, FilterValue, NormalizedFilter, ALL_SENTINEL};
pub use model::{LogMetadataRecord, StatsSummary};
pub use predicate::{Clause, Column, CompareOp, Predicate, SortDirection, SortKey, LISTING_ORDER};
pub use store::memory::MemoryStore;
pub use store::sqlite::SqliteStore;
pub use store::{MetadataStore, ReadConnection};
