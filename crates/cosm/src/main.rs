mod args;
mod commands;
mod confirm;
mod log;

use clap::Parser;
use tracing::error;

use args::CliArgs;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    log::init(args.verbosity()?);
    let json = args.json;
    commands::run(args.command, json).map_err(|e| {
        error!("{e:?}");
        e
    })
}
