use super::{RegionFailure, Series};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// Everything one refresh produces, persisted and reloaded as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetBundle {
    /// When the refresh that produced this bundle finished fetching.
    pub collected_at: DateTime<Utc>,

    /// US national daily series.
    pub us: Series,

    /// Italy national daily series.
    pub italy: Series,

    /// Per-state daily series, only for states that were fetched successfully.
    pub regions: BTreeMap<String, Series>,

    /// The state summary document as the upstream returned it.
    pub region_summary: Vec<Json>,

    /// States that kept failing upstream during the refresh.
    #[serde(default)]
    pub failed_regions: Vec<RegionFailure>,
}

impl DatasetBundle {
    /// Split the bundle into `(us, regions, region_summary, italy)`.
    #[must_use]
    pub fn into_parts(self) -> (Series, BTreeMap<String, Series>, Vec<Json>, Series) {
        (self.us, self.regions, self.region_summary, self.italy)
    }
}
