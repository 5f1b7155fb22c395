//! Human-readable views of the dataset bundle
//!
//! - **Console**: per-dataset summary with optional ANSI colors
//! - **CSV**: one series as a spreadsheet-compatible table
//!
//! Both share the threshold alignment used to compare outbreaks of different
//! sizes from the day they reach the same number of cases.

mod alignment;
mod console;
mod csv;

pub use alignment::{DEFAULT_THRESHOLD, align_from_threshold, days_since_threshold};
pub use console::{ITALY_HEADLINE, US_HEADLINE, generate as generate_console};
pub use csv::generate as generate_csv;
