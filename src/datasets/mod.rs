//! Fetching, normalizing and caching the COVID-19 datasets.
//!
//! Three upstream sources are combined into one [`DatasetBundle`]:
//!
//! - The Italian civil protection national feed, mapped through [`Schema::italy`].
//! - The covidtracking.com US national daily series.
//! - The covidtracking.com per-state daily series, one request per state listed
//!   in the state summary document.
//!
//! Raw records go through [`map_record`] onto canonical field names and are then
//! gathered into a date-ordered, column-oriented [`Series`]. State requests are
//! retried by the [`RegionFetcher`] when the upstream answers with its transient
//! error page. The [`DatasetCache`] composes the pipeline and persists its output.

mod cache_doc;
mod cache_lock;
mod data_error;
mod dataset_bundle;
mod dataset_cache;
mod field_mapper;
mod progress;
mod region_fetcher;
mod regions;
mod schema;
mod series;
mod transport;
mod value;

pub use data_error::DataError;
pub use dataset_bundle::DatasetBundle;
pub use dataset_cache::{BUNDLE_FILE_NAME, DatasetCache, Sources};
pub use field_mapper::{DayRecord, map_payload, map_record};
pub use progress::{NoProgress, Progress};
pub use region_fetcher::{Attempt, REGION_PLACEHOLDER, RegionFailure, RegionFetchReport, RegionFetcher, RetryPolicy};
pub use regions::discover_regions;
pub use schema::{DateFormat, FieldMapping, Schema, SchemaSpec};
pub use series::Series;
pub use transport::{HttpTransport, RawResponse, Transport, fetch_json};
pub use value::Value;
