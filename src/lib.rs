//! Query engine behind the Sri Lanka displaced-population dashboard.
//!
//! The pipeline is load → filter → aggregate → format. Each stage is a pure
//! function of its inputs; the loaded [`Dataset`] is immutable and can be
//! shared freely between requests.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod output;
pub mod reports;
pub mod schema;
pub mod series;
pub mod types;
pub mod util;

pub use aggregate::{
    cagr, group_by, group_sum, percent_pivot, series_cagr, summarize, top_n, value_counts,
    yoy_change, Aggregate, AggregationResult, Group, PercentPivot, YoyPoint,
};
pub use error::{DomainError, LoadError, SchemaError};
pub use filter::{facet_values, filter, FilterSpec};
pub use loader::{load_dataset, load_from_reader, LoadReport};
pub use output::{export_csv, write_dataset_csv};
pub use reports::Page;
pub use schema::Column;
pub use series::{stacked_matrix, to_long_form, StackedMatrix};
pub use types::{Dataset, Dimension, Facet, GroupKey, KeyValue, Measure, Record};
