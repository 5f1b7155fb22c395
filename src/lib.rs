//! covid-fetch crate
//!
//! Library half of the `covid-fetch` tool: the data pipeline, its configuration
//! and the reports built on top of it. This crate's API is fluid and may change
//! without warning and in a semver-incompatible way.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod config;

pub mod datasets;

#[doc(hidden)]
pub mod reports;
