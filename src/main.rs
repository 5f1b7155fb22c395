//! A tool to fetch, normalize and cache public COVID-19 case-count datasets.
//!
//! # Overview
//!
//! `covid-fetch` downloads three datasets and keeps them in a local cache:
//!
//! - The Italian civil protection national daily series
//! - The covidtracking.com US national daily series
//! - The covidtracking.com daily series of every US state
//!
//! Each source has its own field names and date format. Records are mapped onto
//! canonical field names and sorted by date, so every dataset ends up as a set of
//! equally long columns indexed by day.
//!
//! # Usage
//!
//! **Fetch everything and print a summary:**
//! ```bash
//! covid-fetch load --refresh
//! ```
//!
//! **Print the summary of the cached datasets:**
//! ```bash
//! covid-fetch load
//! ```
//!
//! **Export one series as CSV:**
//! ```bash
//! covid-fetch export --region NY --output ny.csv
//! covid-fetch export --us --output us.csv
//! covid-fetch export --italy --output italy.csv
//! ```
//!
//! **Generate a configuration file:**
//! ```bash
//! covid-fetch init covid.toml
//! ```
//!
//! # Flaky Upstream
//!
//! The per-state endpoint sometimes answers with an error page from its hosting
//! provider instead of data. Such responses are recognized by the
//! `transient_marker` text and the state is tried again after `retry_delay_secs`,
//! up to `retry_limit` attempts. A state that never succeeds is left out of the
//! datasets and listed at the end of the summary.
//!
//! # Configuration
//!
//! **Default search locations:**
//! - `covid.toml`
//! - `covid.yml`
//! - `covid.yaml`
//! - `covid.json`
//!
//! ```toml
//! state_daily_url = "https://covidtracking.com/api/states/daily?state={region}"
//! transient_marker = "Cloud"
//! retry_limit = 10
//! retry_delay_secs = 45
//! ```

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use covid_fetch::Result;

mod commands;

use crate::commands::{ExportArgs, InitArgs, LoadArgs, export_series, init_config, load_datasets};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "covid-fetch", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the datasets, fetching them first with --refresh, and print a summary
    Load(LoadArgs),
    /// Write one series of the datasets to a CSV file
    Export(ExportArgs),
    /// Generate a default configuration file
    Init(InitArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match &Cli::parse().command {
        Command::Load(load_args) => load_datasets(load_args).await,
        Command::Export(export_args) => export_series(export_args).await,
        Command::Init(init_args) => init_config(init_args),
    }
}
