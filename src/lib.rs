//! anime-refs: in-memory search, filter and sort over anime reference tables
//!
//! - Parse comma-separated reference tables into records
//! - Cache parsed sources, loading many of them concurrently
//! - Query one source or all of them with provenance tagging
//! - Sort results by title, timestamp, excitement or source
//! - Drive it all from a single session state snapshot

pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use config::{SourceListing, ViewerConfig};
pub use data::filter::{evaluate, RecordFilter, Scope};
pub use data::loader::parse_records;
pub use data::markdown::markdown_table_to_csv;
pub use data::model::{
    ExcitementFilter, ExcitementLevel, Record, RecordSet, Source, TaggedRecord,
};
pub use data::registry::{DirFetcher, LoadReport, MemoryFetcher, SourceFetcher, SourceRegistry};
pub use data::sort::{sort_records, timestamp_to_seconds, SortDirection, SortKey};
pub use error::{Error, Result};
pub use state::{Session, SessionState, Transition, View, ViewStatus};
