use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::model::TaggedRecord;

// ---------------------------------------------------------------------------
// Sort key and direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Title,
    Timestamp,
    Excited,
    Source,
}

impl std::str::FromStr for SortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortKey::Title),
            "timestamp" => Ok(SortKey::Timestamp),
            "excited" => Ok(SortKey::Excited),
            "source" => Ok(SortKey::Source),
            other => Err(crate::Error::Parse(format!("unknown sort key '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

/// `"M:SS"` → `M*60+S`, `"H:MM:SS"` → `H*3600+M*60+S`, anything else → 0.
/// Unparseable components count as 0; oversized values saturate.
pub fn timestamp_to_seconds(timestamp: &str) -> i64 {
    let parts: Vec<i64> = timestamp
        .split(':')
        .map(|p| p.trim().parse().unwrap_or(0))
        .collect();
    match parts[..] {
        [m, s] => m.saturating_mul(60).saturating_add(s),
        [h, m, s] => h
            .saturating_mul(3600)
            .saturating_add(m.saturating_mul(60))
            .saturating_add(s),
        _ => 0,
    }
}

/// Base letters only: accents stripped, lowercased. `"Éclair"` → `"eclair"`.
fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Accent- and case-insensitive order. Ties fall back to accents
/// (unaccented first), then case (lowercase first).
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

fn compare(a: &TaggedRecord, b: &TaggedRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => locale_compare(a.record.title(), b.record.title()),
        SortKey::Excited => locale_compare(a.record.excitement(), b.record.excitement()),
        SortKey::Source => locale_compare(a.record.source(), b.record.source()),
        SortKey::Timestamp => {
            let secs =
                |r: &TaggedRecord| timestamp_to_seconds(r.record.timestamp().unwrap_or("0:00"));
            secs(a).cmp(&secs(b))
        }
    }
}

// ---------------------------------------------------------------------------
// Entry-point
// ---------------------------------------------------------------------------

/// Stable sort in place. `None` leaves the order untouched.
pub fn sort_records(records: &mut [TaggedRecord], key: Option<SortKey>, direction: SortDirection) {
    let Some(key) = key else {
        return;
    };
    records.sort_by(|a, b| direction.apply(compare(a, b, key)));
}
