/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TrackTable
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ TrackTable  │  Vec<Track>, genre index
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  genre set + year range → FilteredTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  genre counts, yearly mean popularity, scatter rows
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
