use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub const TITLE: &str = "Anime Title";
pub const TIMESTAMP: &str = "Timestamp";
pub const EXCITED: &str = "Gigguk Excited?";
pub const NOTES: &str = "Notes";
/// Provenance column attached to every record at registration.
pub const SOURCE: &str = "Source";

/// Filename suffixes produced by the upstream extractor, stripped from
/// display names.
const KNOWN_SUFFIXES: &[&str] = &["_anime_references", "_references"];

// ---------------------------------------------------------------------------
// Record – one row of a source table
// ---------------------------------------------------------------------------

/// A single parsed row: field name → trimmed value.
///
/// Columns are kept as a mapping so that unknown columns pass through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub fields: BTreeMap<String, String>,
}

impl Record {
    /// Field value, or `""` when the column is absent.
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.get(TITLE)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get(TIMESTAMP).map(String::as_str)
    }

    pub fn excitement(&self) -> &str {
        self.get(EXCITED)
    }

    pub fn notes(&self) -> &str {
        self.get(NOTES)
    }

    pub fn source(&self) -> &str {
        self.get(SOURCE)
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordSet – output of the parser
// ---------------------------------------------------------------------------

/// Parsed table: header order plus rows.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    /// Header names in file order (may contain duplicates).
    pub column_names: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Source – a registered, provenance-tagged record set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Source {
    pub id: String,
    pub display_name: String,
    pub column_names: Vec<String>,
    pub records: Vec<Arc<Record>>,
}

impl Source {
    /// Tag every record with the display name of `id` and wrap it for sharing.
    pub fn from_record_set(id: &str, set: RecordSet) -> Self {
        let display_name = display_name(id);
        let records = set
            .records
            .into_iter()
            .map(|mut rec| {
                rec.fields.insert(SOURCE.to_string(), display_name.clone());
                Arc::new(rec)
            })
            .collect();

        Source {
            id: id.to_string(),
            display_name,
            column_names: set.column_names,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Source identifiers → display name and ordering key
// ---------------------------------------------------------------------------

/// `"Fall 2024 Anime in a Nutshell_anime_references.csv"` →
/// `"Fall 2024 Anime in a Nutshell"`.
pub fn display_name(id: &str) -> String {
    let mut name = match id.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_extension(ext) => stem,
        _ => id,
    };
    for suffix in KNOWN_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
            break;
        }
    }
    name.replace('_', " ").trim().to_string()
}

fn is_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Season rank used for presentation ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Season {
    Unknown,
    Winter,
    Fall,
    Summer,
    Spring,
}

impl Season {
    pub fn rank(self) -> i32 {
        match self {
            Season::Spring => 3,
            Season::Summer => 2,
            Season::Fall => 1,
            Season::Winter => 0,
            Season::Unknown => -1,
        }
    }

    pub fn detect(id: &str) -> Self {
        let lower = id.to_lowercase();
        [
            ("spring", Season::Spring),
            ("summer", Season::Summer),
            ("fall", Season::Fall),
            ("winter", Season::Winter),
        ]
        .into_iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, season)| season)
        .unwrap_or(Season::Unknown)
    }
}

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Static pattern; cannot fail.
    Regex::new(r"(?:^|[^0-9])(20[0-9]{2})(?:[^0-9]|$)").unwrap()
});

/// `(year, season rank)`; larger sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceOrderKey {
    pub year: i32,
    pub season: i32,
}

impl SourceOrderKey {
    pub fn from_id(id: &str) -> Self {
        let year = YEAR_RE
            .captures(id)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        SourceOrderKey {
            year,
            season: Season::detect(id).rank(),
        }
    }
}

// ---------------------------------------------------------------------------
// Excitement
// ---------------------------------------------------------------------------

/// Categorical filter over the excitement column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExcitementFilter {
    #[default]
    All,
    Yes,
    Neutral,
    No,
}

impl ExcitementFilter {
    /// Substring a record's excitement value must contain; `None` for `All`.
    pub fn needle(self) -> Option<&'static str> {
        match self {
            ExcitementFilter::All => None,
            ExcitementFilter::Yes => Some("yes"),
            ExcitementFilter::Neutral => Some("neutral"),
            ExcitementFilter::No => Some("no"),
        }
    }

    pub fn as_str(self) -> &'static str {
        self.needle().unwrap_or("all")
    }
}

impl std::str::FromStr for ExcitementFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ExcitementFilter::All),
            "yes" => Ok(ExcitementFilter::Yes),
            "neutral" => Ok(ExcitementFilter::Neutral),
            "no" => Ok(ExcitementFilter::No),
            other => Err(crate::Error::Parse(format!(
                "unknown excitement filter '{other}'"
            ))),
        }
    }
}

/// Display classification of an excitement value (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcitementLevel {
    Yes,
    Neutral,
    No,
}

impl ExcitementLevel {
    pub fn classify(value: &str) -> Option<Self> {
        let lower = value.to_lowercase();
        if lower.contains("yes") {
            Some(ExcitementLevel::Yes)
        } else if lower.contains("neutral") {
            Some(ExcitementLevel::Neutral)
        } else if lower.contains("no") {
            Some(ExcitementLevel::No)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExcitementLevel::Yes => "yes",
            ExcitementLevel::Neutral => "neutral",
            ExcitementLevel::No => "no",
        }
    }
}

// ---------------------------------------------------------------------------
// TaggedRecord – a record as it leaves the query engine
// ---------------------------------------------------------------------------

/// A result row. `provenance` is set only for global-mode queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub record: Arc<Record>,
    pub provenance: Option<String>,
}

impl TaggedRecord {
    pub fn scoped(record: Arc<Record>) -> Self {
        TaggedRecord {
            record,
            provenance: None,
        }
    }

    pub fn global(record: Arc<Record>) -> Self {
        let provenance = Some(record.source().to_string());
        TaggedRecord { record, provenance }
    }
}
