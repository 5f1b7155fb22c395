use super::common::{Common, CommonArgs};
use camino::Utf8PathBuf;
use clap::{Args, Parser};
use covid_fetch::Result;
use covid_fetch::reports::generate_csv;
use ohno::{IntoAppError, app_err};
use std::fs::File;
use std::io::BufWriter;

/// Which series to export
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ExportTarget {
    /// A state's daily series, by state code
    #[arg(long, value_name = "CODE")]
    pub region: Option<String>,

    /// The US national daily series
    #[arg(long)]
    pub us: bool,

    /// The Italian national daily series
    #[arg(long)]
    pub italy: bool,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub target: ExportTarget,

    /// CSV file to write
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Utf8PathBuf,

    /// Fetch every dataset again instead of reading the cached copy
    #[arg(long)]
    pub refresh: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn export_series(args: &ExportArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let bundle = common.load_bundle(args.refresh).await?;

    let (label, series) = match &args.target.region {
        Some(region) => (
            region.as_str(),
            bundle
                .regions
                .get(region)
                .ok_or_else(|| app_err!("no series for state '{region}' in the datasets"))?,
        ),
        None if args.target.italy => ("Italy", &bundle.italy),
        None => ("US", &bundle.us),
    };

    let file = File::create(&args.output).into_app_err_with(|| format!("unable to create '{}'", args.output))?;
    generate_csv(series, BufWriter::new(file))?;

    println!("Wrote {} day(s) of {label} data to {}", series.len(), args.output);
    Ok(())
}
