/// Data layer: parsing, source registry, querying and sorting.
///
/// Architecture:
/// ```text
///  source listing + fetcher
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  raw text → RecordSet
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ registry  │  id → Source (tagged with display name)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  search term AND excitement → TaggedRecord rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   sort    │  stable, type-aware ordering
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod markdown;
pub mod model;
pub mod registry;
pub mod sort;
