mod common;
mod export;
mod init;
mod load;
mod progress_reporter;

pub use export::{ExportArgs, export_series};
pub use init::{InitArgs, init_config};
pub use load::{LoadArgs, load_datasets};
pub use progress_reporter::ProgressReporter;
