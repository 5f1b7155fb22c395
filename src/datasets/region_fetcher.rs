//! Per-region fetches with a fixed retry bound and a fixed pause between attempts.
//!
//! covidtracking.com intermittently answers with an error page from its hosting
//! provider instead of data. Such a body is recognised by a marker substring and
//! the region is tried again later; a region that never succeeds is left out of
//! the result and reported as a failure instead of aborting the whole run.

use super::{DataError, NoProgress, Progress, SchemaSpec, Series, Transport, map_payload};
use core::fmt::{self, Debug, Formatter};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LOG_TARGET: &str = "   regions";

/// Placeholder replaced by the region code in the endpoint template.
pub const REGION_PLACEHOLDER: &str = "{region}";

/// How often and how patiently a region is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts per region, first attempt included.
    pub limit: u32,

    /// Pause between two attempts of the same region.
    pub delay: Duration,
}

/// Result of a single attempt at one region.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Success(Series),

    /// The upstream answered with its transient-failure signature.
    Transient,
}

impl Attempt {
    /// The `(success, series)` pair view of this attempt.
    #[must_use]
    pub fn into_pair(self) -> (bool, Option<Series>) {
        match self {
            Self::Success(series) => (true, Some(series)),
            Self::Transient => (false, None),
        }
    }
}

/// A region that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFailure {
    pub region: String,
    pub attempts: u32,
}

impl RegionFailure {
    #[must_use]
    pub fn to_error(&self) -> DataError {
        DataError::TransientUpstream {
            region: self.region.clone(),
            attempts: self.attempts,
        }
    }
}

/// Outcome of fetching every region.
///
/// `series` only holds regions that succeeded; every other attempted region is in `failures`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionFetchReport {
    pub series: BTreeMap<String, Series>,
    pub failures: Vec<RegionFailure>,
}

/// Fetches region-scoped daily series through a [`Transport`].
pub struct RegionFetcher<'a, T> {
    transport: &'a T,
    url_template: String,
    marker: String,
    progress: &'a dyn Progress,
}

impl<T> Debug for RegionFetcher<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionFetcher")
            .field("url_template", &self.url_template)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Transport> RegionFetcher<'a, T> {
    /// `url_template` must contain [`REGION_PLACEHOLDER`]; `marker` is the transient-failure signature.
    #[must_use]
    pub fn new(transport: &'a T, url_template: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            transport,
            url_template: url_template.into(),
            marker: marker.into(),
            progress: &NoProgress,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn region_url(&self, region: &str) -> String {
        self.url_template.replace(REGION_PLACEHOLDER, region)
    }

    /// Make one attempt at `region`.
    ///
    /// Only a body carrying the marker is an [`Attempt::Transient`]. Any other
    /// body that is not valid JSON is [`DataError::MalformedPayload`] whatever the
    /// status code, and a request that does not complete is [`DataError::Transport`].
    pub async fn fetch_region(&self, region: &str) -> Result<Attempt, DataError> {
        let url = self.region_url(region);

        let response = self.transport.get(&url).await?;

        if !self.marker.is_empty() && response.body.contains(&self.marker) {
            log::debug!(target: LOG_TARGET, "Upstream error signature in HTTP {} response for region '{region}'", response.status);
            return Ok(Attempt::Transient);
        }

        let payload = serde_json::from_str(&response.body).map_err(|e| DataError::MalformedPayload {
            url: url.clone(),
            reason: format!("HTTP {} with a body that is not valid JSON: {e}", response.status),
        })?;

        let (schema, records) = map_payload(&payload, &SchemaSpec::covid_tracking(region), &url)?;
        Ok(Attempt::Success(Series::normalize(&schema, records)))
    }

    /// Fetch every region in turn, retrying each according to `policy`.
    ///
    /// Regions that never succeed are omitted from [`RegionFetchReport::series`]
    /// and listed in [`RegionFetchReport::failures`]. Schema and payload errors
    /// abort the whole call.
    pub async fn fetch_all_regions(&self, regions: &[String], policy: RetryPolicy) -> Result<RegionFetchReport, DataError> {
        let mut report = RegionFetchReport::default();
        let total = regions.len() as u64;

        for (index, region) in regions.iter().enumerate() {
            self.progress.set_position(index as u64, total, region);
            log::info!(target: LOG_TARGET, "Fetching daily series for region '{region}'");

            match self.fetch_with_retry(region, policy).await? {
                Ok(series) => {
                    let _ = report.series.insert(region.clone(), series);
                }
                Err(failure) => {
                    log::warn!(target: LOG_TARGET, "{}", failure.to_error());
                    report.failures.push(failure);
                }
            }
        }

        self.progress.set_position(total, total, "");
        Ok(report)
    }

    async fn fetch_with_retry(&self, region: &str, policy: RetryPolicy) -> Result<Result<Series, RegionFailure>, DataError> {
        let mut attempts = 0;

        while attempts < policy.limit {
            attempts += 1;

            match self.fetch_region(region).await? {
                Attempt::Success(series) => {
                    log::debug!(target: LOG_TARGET, "Region '{region}' fetched with {} day(s) on attempt {attempts}", series.len());
                    return Ok(Ok(series));
                }
                Attempt::Transient => {
                    log::warn!(target: LOG_TARGET, "{region} failed. Retry {attempts} of {}.", policy.limit);
                    if attempts < policy.limit && !policy.delay.is_zero() {
                        tokio::time::sleep(policy.delay).await;
                    }
                }
            }
        }

        Ok(Err(RegionFailure {
            region: region.to_string(),
            attempts,
        }))
    }
}
