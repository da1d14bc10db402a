/// Data layer: loading, cleaning, filtering and aggregation.
///
/// Architecture:
/// ```text
///  smart_manufacturing_data.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawDataset        (quality: per-column report)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  split timestamp, drop rows/columns, impute → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  Selection → FilteredView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  FilteredView → AggregateTables + Correlation
///   └───────────┘
/// ```
/// `snapshot::render` runs filter + aggregate in one go for each UI change.

pub mod aggregate;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod quality;
pub mod snapshot;
