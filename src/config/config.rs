use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Placeholder for the state code in `state_daily_url`
const REGION_PLACEHOLDER: &str = "{region}";

fn default_italy_url() -> String {
    "https://raw.githubusercontent.com/pcm-dpc/COVID-19/master/dati-json/dpc-covid19-ita-andamento-nazionale.json".to_string()
}

fn default_us_url() -> String {
    "https://covidtracking.com/api/us/daily".to_string()
}

fn default_states_url() -> String {
    "https://covidtracking.com/api/states".to_string()
}

fn default_state_daily_url() -> String {
    "https://covidtracking.com/api/states/daily?state={region}".to_string()
}

fn default_region_key() -> String {
    "state".to_string()
}

fn default_transient_marker() -> String {
    "Cloud".to_string()
}

const fn default_retry_limit() -> u32 {
    10
}

const fn default_retry_delay_secs() -> u64 {
    45
}

const fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_italy_url")]
    pub italy_url: String,

    #[serde(default = "default_us_url")]
    pub us_url: String,

    #[serde(default = "default_states_url")]
    pub states_url: String,

    #[serde(default = "default_state_daily_url")]
    pub state_daily_url: String,

    #[serde(default = "default_region_key")]
    pub region_key: String,

    #[serde(default = "default_transient_marker")]
    pub transient_marker: String,

    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit `config_path`, `covid.toml`, `covid.yml`, `covid.yaml` and
    /// `covid.json` are tried in that order under `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<(Self, Vec<String>)> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading covid-fetch configuration from {path}"))?;
            (path.clone(), text)
        } else {
            let candidates = [
                base_dir.join("covid.toml"),
                base_dir.join("covid.yml"),
                base_dir.join("covid.yaml"),
                base_dir.join("covid.json"),
            ];

            let mut found = None;
            for path in &candidates {
                match fs::read_to_string(path) {
                    Ok(text) => {
                        found = Some((path.clone(), text));
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_app_err_with(|| format!("reading covid-fetch configuration from {path}")),
                }
            }

            let Some(result) = found else {
                return Ok((Self::default(), Vec::new()));
            };

            result
        };

        let extension = final_path.extension().unwrap_or_default();
        let config: Self = match extension {
            "toml" => toml::from_str(&text).into_app_err_with(|| format!("parsing TOML configuration from {final_path}"))?,
            "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML configuration from {final_path}"))?,
            "json" => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON configuration from {final_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        let mut warnings = Vec::new();
        config.validate(&mut warnings);

        Ok((config, warnings))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save(&self, output_path: &Utf8Path) -> Result<()> {
        let extension = output_path.extension().unwrap_or_default();
        let text = match extension {
            "toml" => toml::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to TOML for saving to {output_path}"))?,
            "yml" | "yaml" => serde_yaml::to_string(self)
                .into_app_err_with(|| format!("serializing configuration to YAML for saving to {output_path}"))?,
            "json" => serde_json::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to JSON for saving to {output_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        fs::write(output_path, text).into_app_err_with(|| format!("writing configuration to {output_path}"))?;
        Ok(())
    }

    /// Save the default configuration, keeping its comments when writing TOML
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        if output_path.extension() == Some("toml") {
            fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))
        } else {
            Self::default().save(output_path)
        }
    }

    /// Detect settings that load fine but cannot work as intended
    fn validate(&self, warnings: &mut Vec<String>) {
        let urls = [
            ("italy_url", self.italy_url.as_str()),
            ("us_url", self.us_url.as_str()),
            ("states_url", self.states_url.as_str()),
            ("state_daily_url", self.state_daily_url.as_str()),
        ];

        for (name, value) in urls {
            let candidate = value.replace(REGION_PLACEHOLDER, "XX");
            if let Err(e) = url::Url::parse(&candidate) {
                warnings.push(format!("{name}: '{value}' is not a valid URL ({e})"));
            }
        }

        if !self.state_daily_url.contains(REGION_PLACEHOLDER) {
            warnings.push(format!(
                "state_daily_url: '{}' has no {REGION_PLACEHOLDER} placeholder, every state would fetch the same document",
                self.state_daily_url
            ));
        }

        if self.region_key.is_empty() {
            warnings.push("region_key: empty key, no state will be discovered".to_string());
        }

        if self.transient_marker.is_empty() {
            warnings.push("transient_marker: empty marker, upstream error pages will not be retried".to_string());
        }

        if self.retry_limit == 0 {
            warnings.push("retry_limit: 0 attempts, no state will be fetched".to_string());
        }

        if self.request_timeout_secs == 0 {
            warnings.push("request_timeout_secs: 0 seconds, every request would time out immediately".to_string());
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            italy_url: default_italy_url(),
            us_url: default_us_url(),
            states_url: default_states_url(),
            state_daily_url: default_state_daily_url(),
            region_key: default_region_key(),
            transient_marker: default_transient_marker(),
            retry_limit: default_retry_limit(),
            retry_delay_secs: default_retry_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_embedded_default_matches_default() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_region_placeholder_matches_fetcher() {
        assert_eq!(REGION_PLACEHOLDER, crate::datasets::REGION_PLACEHOLDER);
    }

    #[test]
    fn test_default_has_no_warnings() {
        let mut warnings = Vec::new();
        Config::default().validate(&mut warnings);
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let (_dir, base) = temp_dir();
        let (config, warnings) = Config::load(&base, None).unwrap();

        assert_eq!(config, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_load_partial_toml_fills_defaults() {
        let (_dir, base) = temp_dir();
        fs::write(base.join("covid.toml"), "retry_limit = 3\nretry_delay_secs = 0\n").unwrap();

        let (config, _) = Config::load(&base, None).unwrap();

        assert_eq!(config.retry_limit, 3);
        assert_eq!(config.retry_delay_secs, 0);
        assert_eq!(config.transient_marker, "Cloud");
    }

    #[test]
    fn test_load_prefers_toml_over_json() {
        let (_dir, base) = temp_dir();
        fs::write(base.join("covid.toml"), "region_key = \"code\"\n").unwrap();
        fs::write(base.join("covid.json"), r#"{"region_key": "other"}"#).unwrap();

        let (config, _) = Config::load(&base, None).unwrap();
        assert_eq!(config.region_key, "code");
    }

    #[test]
    fn test_load_yaml_reports_warnings() {
        let (_dir, base) = temp_dir();
        let path = base.join("custom.yaml");
        fs::write(&path, "state_daily_url: https://example.com/daily\nretry_limit: 0\n").unwrap();

        let (config, warnings) = Config::load(&base, Some(&path)).unwrap();

        assert_eq!(config.retry_limit, 0);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("{region}")));
        assert!(warnings.iter().any(|w| w.starts_with("retry_limit")));
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let (_dir, base) = temp_dir();
        let path = base.join("covid.json");
        fs::write(&path, r#"{"retries": 3}"#).unwrap();

        let err = Config::load(&base, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("parsing JSON configuration"));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let (_dir, base) = temp_dir();
        let path = base.join("covid.ini");
        fs::write(&path, "").unwrap();

        let err = Config::load(&base, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("unsupported configuration file extension"));
    }

    #[test]
    fn test_save_and_reload_each_format() {
        let (_dir, base) = temp_dir();
        let config = Config {
            retry_limit: 4,
            ..Config::default()
        };

        for name in ["out.toml", "out.yml", "out.json"] {
            let path = base.join(name);
            config.save(&path).unwrap();
            let (loaded, _) = Config::load(&base, Some(&path)).unwrap();
            assert_eq!(loaded, config, "{name}");
        }
    }

    #[test]
    fn test_save_default_keeps_comments_for_toml() {
        let (_dir, base) = temp_dir();
        let path = base.join("covid.toml");

        Config::save_default(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# covid-fetch configuration"));
    }
}
