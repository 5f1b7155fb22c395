//! Acquisition of the full dataset bundle and its on-disk cache.

use super::cache_doc;
use super::cache_lock::acquire_cache_lock;
use super::transport::fetch_json;
use super::{
    DataError, DatasetBundle, NoProgress, Progress, RegionFetcher, RetryPolicy, Schema, SchemaSpec, Series, Transport, discover_regions,
    map_payload,
};
use chrono::Utc;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::path::PathBuf;

const LOG_TARGET: &str = "     cache";

/// File name of the persisted bundle inside the cache directory.
pub const BUNDLE_FILE_NAME: &str = "covid.json";

/// Where each dataset comes from and how hard to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub italy_url: String,
    pub us_url: String,
    pub states_url: String,

    /// Per-state endpoint, with `{region}` standing for the state code.
    pub state_daily_url: String,

    /// Key of the state code in each entry of the summary document.
    pub region_key: String,

    pub transient_marker: String,
    pub retry: RetryPolicy,
}

/// Fetches, persists and reloads the [`DatasetBundle`].
pub struct DatasetCache<T> {
    transport: T,
    sources: Sources,
    cache_dir: PathBuf,
    progress: Box<dyn Progress>,
}

impl<T> core::fmt::Debug for DatasetCache<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("sources", &self.sources)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DatasetCache<T> {
    #[must_use]
    pub fn new(transport: T, sources: Sources, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            sources,
            cache_dir: cache_dir.into(),
            progress: Box::new(NoProgress),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn bundle_path(&self) -> PathBuf {
        self.cache_dir.join(BUNDLE_FILE_NAME)
    }

    /// Produce the bundle, either from the upstream APIs or from disk.
    ///
    /// With `refresh` set, every dataset is fetched again and the persisted
    /// bundle is replaced once all of them are in hand. A failure before that
    /// point leaves any earlier bundle untouched. Without `refresh`, the
    /// persisted bundle is returned, or [`DataError::CacheMiss`] if there is none.
    pub async fn load(&self, refresh: bool) -> Result<DatasetBundle, DataError> {
        if !refresh {
            return cache_doc::load(self.bundle_path(), "datasets");
        }

        let _lock = acquire_cache_lock(&self.cache_dir).await?;
        let result = self.refresh().await;
        self.progress.done();

        let bundle = result?;
        cache_doc::save(&bundle, self.bundle_path())?;

        log::info!(
            target: LOG_TARGET,
            "Saved {} state series to '{}' ({} state(s) failed)",
            bundle.regions.len(),
            self.bundle_path().display(),
            bundle.failed_regions.len()
        );

        Ok(bundle)
    }

    /// Like [`Self::load`], returning `(us, regions, region_summary, italy)`.
    pub async fn get_datasets(&self, refresh: bool) -> Result<(Series, BTreeMap<String, Series>, Vec<Json>, Series), DataError> {
        Ok(self.load(refresh).await?.into_parts())
    }

    async fn refresh(&self) -> Result<DatasetBundle, DataError> {
        self.progress.set_phase("Italy");
        let italy = self.fetch_italy().await?;

        self.progress.set_phase("Summary");
        let region_summary = self.fetch_region_summary().await?;
        let regions = discover_regions(&region_summary, &self.sources.region_key);
        log::info!(target: LOG_TARGET, "Discovered {} state(s) in the summary", regions.len());

        self.progress.set_phase("States");
        let report = RegionFetcher::new(&self.transport, &self.sources.state_daily_url, &self.sources.transient_marker)
            .with_progress(self.progress.as_ref())
            .fetch_all_regions(&regions, self.sources.retry)
            .await?;

        self.progress.set_phase("US");
        let us = self.fetch_us().await?;

        Ok(DatasetBundle {
            collected_at: Utc::now(),
            us,
            italy,
            regions: report.series,
            region_summary,
            failed_regions: report.failures,
        })
    }

    async fn fetch_italy(&self) -> Result<Series, DataError> {
        let url = &self.sources.italy_url;
        let payload = fetch_json(&self.transport, url).await?;
        let (schema, records) = map_payload(&payload, &SchemaSpec::Fixed(Schema::italy()), url)?;

        // The national feed is published in chronological order
        Ok(Series::normalize_ordered(&schema, records))
    }

    async fn fetch_us(&self) -> Result<Series, DataError> {
        let url = &self.sources.us_url;
        let payload = fetch_json(&self.transport, url).await?;
        let (schema, records) = map_payload(&payload, &SchemaSpec::covid_tracking("us"), url)?;
        Ok(Series::normalize(&schema, records))
    }

    async fn fetch_region_summary(&self) -> Result<Vec<Json>, DataError> {
        let url = &self.sources.states_url;
        match fetch_json(&self.transport, url).await? {
            Json::Array(entries) => Ok(entries),
            _ => Err(DataError::MalformedPayload {
                url: url.clone(),
                reason: "expected a JSON array of state entries".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::Value;
    use crate::datasets::transport::testing::ScriptedTransport;
    use core::time::Duration;

    const ITALY: &str = "test://italy";
    const US: &str = "test://us";
    const STATES: &str = "test://states";

    const ITALY_BODY: &str = r#"[
        {"data": "2020-02-24T18:00:00", "stato": "ITA", "ricoverati_con_sintomi": 101, "terapia_intensiva": 26,
         "totale_ospedalizzati": 127, "isolamento_domiciliare": 94, "totale_attualmente_positivi": 221, "nuovi_attualmente_positivi": 221,
         "dimessi_guariti": 1, "deceduti": 7, "totale_casi": 229, "tamponi": 4324},
        {"data": "2020-02-25T18:00:00", "stato": "ITA", "ricoverati_con_sintomi": 114, "terapia_intensiva": 35,
         "totale_ospedalizzati": 150, "isolamento_domiciliare": 162, "totale_attualmente_positivi": 311, "nuovi_attualmente_positivi": 93,
         "dimessi_guariti": 1, "deceduti": 10, "totale_casi": 322, "tamponi": 8623}
    ]"#;

    const US_BODY: &str = r#"[{"date": 20200321, "positive": 23197, "death": 272}, {"date": 20200320, "positive": 17033, "death": null}]"#;

    fn sources() -> Sources {
        Sources {
            italy_url: ITALY.to_string(),
            us_url: US.to_string(),
            states_url: STATES.to_string(),
            state_daily_url: "test://states/{region}".to_string(),
            region_key: "state".to_string(),
            transient_marker: "Cloud".to_string(),
            retry: RetryPolicy {
                limit: 2,
                delay: Duration::ZERO,
            },
        }
    }

    fn upstream() -> ScriptedTransport {
        ScriptedTransport::new()
            .respond(ITALY, 200, ITALY_BODY)
            .respond(US, 200, US_BODY)
            .respond(STATES, 200, r#"[{"state": "WA"}, {"state": "CA"}, {"state": null}]"#)
            .respond("test://states/CA", 200, r#"[{"date": 20200321, "positive": 1279}]"#)
            .respond("test://states/WA", 200, "CloudBase error")
    }

    #[tokio::test]
    async fn test_refresh_fetches_in_order_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(upstream(), sources(), dir.path());

        let bundle = cache.load(true).await.unwrap();

        assert_eq!(
            cache.transport.requests(),
            vec![ITALY, STATES, "test://states/CA", "test://states/WA", "test://states/WA", US]
        );
        assert_eq!(bundle.regions.keys().collect::<Vec<_>>(), vec!["CA"]);
        assert_eq!(bundle.failed_regions[0].region, "WA");
        assert_eq!(bundle.region_summary.len(), 3);
        assert_eq!(bundle.italy.latest("totalPositive"), Some(&Value::Count(311)));
        assert_eq!(bundle.us.column("positive").unwrap(), &[Value::Count(17033), Value::Count(23197)]);
        assert!(cache.bundle_path().exists());
    }

    #[tokio::test]
    async fn test_load_without_refresh_returns_persisted_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(upstream(), sources(), dir.path());
        let fetched = cache.load(true).await.unwrap();

        let offline = DatasetCache::new(ScriptedTransport::new(), sources(), dir.path());
        let loaded = offline.load(false).await.unwrap();

        assert_eq!(loaded, fetched);
        assert!(offline.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fractional_values_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new()
            .respond(ITALY, 200, ITALY_BODY)
            .respond(US, 200, US_BODY)
            .respond(STATES, 200, r#"[{"state": "CA", "score": 0.11849e31}]"#)
            .respond("test://states/CA", 200, r#"[{"date": 20200321, "positive": 1279, "rate": 0.11849e31, "ratio": 0.1}]"#);
        let fetched = DatasetCache::new(transport, sources(), dir.path()).load(true).await.unwrap();
        assert!(matches!(fetched.regions["CA"].latest("rate"), Some(Value::Number(_))));

        let offline = DatasetCache::new(ScriptedTransport::new(), sources(), dir.path());
        let loaded = offline.load(false).await.unwrap();

        assert_eq!(loaded, fetched);
    }

    #[tokio::test]
    async fn test_load_without_bundle_is_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(ScriptedTransport::new(), sources(), dir.path());

        let err = cache.load(false).await.unwrap_err();
        assert!(matches!(err, DataError::CacheMiss { .. }));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let previous = DatasetCache::new(upstream(), sources(), dir.path()).load(true).await.unwrap();

        let broken = ScriptedTransport::new().respond(ITALY, 200, r#"[{"stato": "ITA"}]"#);
        let cache = DatasetCache::new(broken, sources(), dir.path());
        let err = cache.load(true).await.unwrap_err();

        assert!(err.is_schema_error());
        assert_eq!(cache.load(false).await.unwrap(), previous);
    }

    #[tokio::test]
    async fn test_summary_must_be_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new()
            .respond(ITALY, 200, ITALY_BODY)
            .respond(STATES, 200, r#"{"state": "CA"}"#);
        let cache = DatasetCache::new(transport, sources(), dir.path());

        let err = cache.load(true).await.unwrap_err();
        assert!(matches!(err, DataError::MalformedPayload { .. }));
    }

    #[tokio::test]
    async fn test_get_datasets_returns_parts() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(upstream(), sources(), dir.path());

        let (us, regions, summary, italy) = cache.get_datasets(true).await.unwrap();

        assert_eq!(us.len(), 2);
        assert_eq!(regions.len(), 1);
        assert_eq!(summary.len(), 3);
        assert_eq!(italy.len(), 2);
    }
}
