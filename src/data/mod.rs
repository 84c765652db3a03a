/// Data layer: core types, loading, outlier removal and plot filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, decode fuel codes, drop Natural Gas → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, per-fuel-type counts
///   └──────────┘
///        │                         │
///        ▼                         ▼
///   ┌──────────┐             ┌──────────┐
///   │ outliers  │ z-score     │  filter   │ fuel-type selection → visible indices
///   └──────────┘ → Cleaned   └──────────┘   (plots only)
///                  Subset
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod outliers;
