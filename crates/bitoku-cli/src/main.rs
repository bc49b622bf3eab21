use anyhow::Result;
use clap::Parser;

mod args;
mod cmd;
mod io;
mod logging;
mod output;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = args::Cli::parse();
    output::init(cli.json);
    logging::init(cli.verbose, cli.json);

    cmd::dispatch(cli).await
}
