use super::common::{Common, CommonArgs};
use clap::Parser;
use covid_fetch::Result;
use covid_fetch::reports::generate_console;

#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Fetch every dataset again instead of reading the cached copy
    #[arg(long)]
    pub refresh: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn load_datasets(args: &LoadArgs) -> Result<()> {
    let common = Common::new(&args.common)?;
    let bundle = common.load_bundle(args.refresh).await?;

    let mut console_output = String::new();
    generate_console(&bundle, common.use_colors_for_stdout(), &mut console_output)?;
    print!("{console_output}");

    Ok(())
}
