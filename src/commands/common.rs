//! Setup shared by the load and export commands.

use super::ProgressReporter;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use core::time::Duration;
use covid_fetch::Result;
use covid_fetch::config::Config;
use covid_fetch::datasets::{DatasetBundle, DatasetCache, HttpTransport, RetryPolicy, Sources};
use directories::BaseDirs;
use ohno::IntoAppError;
use std::path::PathBuf;

const USER_AGENT: &str = concat!("covid-fetch/", env!("CARGO_PKG_VERSION"));

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

/// Control when to use colored output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,
    /// Never use colors
    Never,
    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

/// Arguments shared by the commands that touch the datasets
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to configuration file [default: one of covid.[toml|yml|yaml|json] ]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Directory where the datasets are cached [default: the platform cache directory]
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

#[derive(Debug)]
pub struct Common {
    pub config: Config,
    pub cache_dir: PathBuf,
    color: ColorMode,
    log_level: LogLevel,
}

impl Common {
    /// Initialize logging, load the configuration and pick the cache directory
    pub fn new(args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let (config, warnings) = Config::load(Utf8Path::new("."), args.config.as_ref())?;

        if !warnings.is_empty() {
            eprintln!("\n⚠️  Configuration validation warnings:");
            for warning in &warnings {
                eprintln!("   {warning}");
            }
            eprintln!();
        }

        let cache_dir = if let Some(cache_path) = &args.cache_dir {
            cache_path.as_std_path().to_path_buf()
        } else {
            BaseDirs::new()
                .into_app_err("unable to determine the cache directory")?
                .cache_dir()
                .join("covid-fetch")
        };

        Ok(Self {
            config,
            cache_dir,
            color: args.color,
            log_level: args.log_level,
        })
    }

    /// Load the bundle, refreshing it from the upstream APIs when asked to
    pub async fn load_bundle(&self, refresh: bool) -> Result<DatasetBundle> {
        let transport = HttpTransport::new(USER_AGENT, Duration::from_secs(self.config.request_timeout_secs))?;

        // The progress bar would garble log output, so it only shows when logging is off
        let delay = if self.log_level == LogLevel::None {
            Duration::from_millis(300)
        } else {
            Duration::MAX
        };

        let progress = ProgressReporter::new(delay, self.use_colors_for_stderr());
        let cache = DatasetCache::new(transport, sources(&self.config), &self.cache_dir).with_progress(Box::new(progress));

        cache.load(refresh).await.into_app_err("unable to load the datasets")
    }

    pub fn use_colors_for_stdout(&self) -> bool {
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                use std::io::{IsTerminal, stdout};
                stdout().is_terminal()
            }
        }
    }

    fn use_colors_for_stderr(&self) -> bool {
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                use std::io::{IsTerminal, stderr};
                stderr().is_terminal()
            }
        }
    }
}

/// Translate the configuration into the pipeline's source description
pub fn sources(config: &Config) -> Sources {
    Sources {
        italy_url: config.italy_url.clone(),
        us_url: config.us_url.clone(),
        states_url: config.states_url.clone(),
        state_daily_url: config.state_daily_url.clone(),
        region_key: config.region_key.clone(),
        transient_marker: config.transient_marker.clone(),
        retry: RetryPolicy {
            limit: config.retry_limit,
            delay: Duration::from_secs(config.retry_delay_secs),
        },
    }
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_follow_config() {
        let config = Config {
            retry_limit: 3,
            retry_delay_secs: 2,
            transient_marker: "Oops".to_string(),
            ..Config::default()
        };

        let sources = sources(&config);

        assert_eq!(sources.retry.limit, 3);
        assert_eq!(sources.retry.delay, Duration::from_secs(2));
        assert_eq!(sources.transient_marker, "Oops");
        assert_eq!(sources.state_daily_url, config.state_daily_url);
    }

    #[tokio::test]
    async fn test_load_bundle_without_cache_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let common = Common {
            config: Config::default(),
            cache_dir: dir.path().to_path_buf(),
            color: ColorMode::Never,
            log_level: LogLevel::Error,
        };

        let err = common.load_bundle(false).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("unable to load the datasets"), "{message}");
        assert!(!dir.path().join("covid.json").exists());
    }
}
