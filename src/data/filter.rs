use std::sync::Arc;

use crate::Result;

use super::model::{ExcitementFilter, Record, TaggedRecord};
use super::registry::SourceRegistry;

// ---------------------------------------------------------------------------
// Query scope and predicate
// ---------------------------------------------------------------------------

/// Which records a query runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One registered source; results are untagged.
    Source(String),
    /// Every registered source, newest first; results carry provenance.
    All,
}

/// Text search plus excitement filter, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Lowercased search term; empty matches everything.
    search: String,
    excitement: ExcitementFilter,
}

impl RecordFilter {
    pub fn new(search_term: &str, excitement: ExcitementFilter) -> Self {
        Self {
            search: search_term.to_lowercase(),
            excitement,
        }
    }

    /// Case-insensitive substring match against title or notes.
    pub fn matches_search(&self, record: &Record) -> bool {
        self.search.is_empty()
            || record.title().to_lowercase().contains(&self.search)
            || record.notes().to_lowercase().contains(&self.search)
    }

    /// Case-sensitive substring match against the excitement column.
    pub fn matches_excitement(&self, record: &Record) -> bool {
        match self.excitement.needle() {
            None => true,
            Some(needle) => record.excitement().contains(needle),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record) && self.matches_excitement(record)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Keep the records passing `filter`, in input order.
pub fn filter_records<'a, I>(records: I, filter: &RecordFilter, tag: bool) -> Vec<TaggedRecord>
where
    I: IntoIterator<Item = &'a Arc<Record>>,
{
    records
        .into_iter()
        .filter(|rec| filter.matches(rec))
        .map(|rec| {
            if tag {
                TaggedRecord::global(Arc::clone(rec))
            } else {
                TaggedRecord::scoped(Arc::clone(rec))
            }
        })
        .collect()
}

/// Run a query against whatever the registry holds right now.
///
/// Fails with `NotFound` when a scoped id is not registered.
pub fn evaluate(
    registry: &SourceRegistry,
    scope: &Scope,
    search_term: &str,
    excitement: ExcitementFilter,
) -> Result<Vec<TaggedRecord>> {
    let filter = RecordFilter::new(search_term, excitement);
    match scope {
        Scope::Source(id) => {
            let source = registry.get(id)?;
            Ok(filter_records(&source.records, &filter, false))
        }
        Scope::All => {
            let sources = registry.sources_ordered();
            let records = sources.iter().flat_map(|s| s.records.iter());
            Ok(filter_records(records, &filter, true))
        }
    }
}
