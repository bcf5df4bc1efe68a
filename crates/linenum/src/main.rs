use crate::prelude::*;
use clap::Parser;

mod config;
mod document;
mod error;
#[cfg(test)]
mod fixtures;
mod inspect;
mod number;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Draw line numbers next to the body text of PDF documents"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "LINENUM_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Number the body text of a PDF and write the result
    Number(crate::number::Options),

    /// Show the numbers a PDF would receive without writing anything
    Inspect(crate::inspect::Options),

    /// Print the effective configuration as TOML
    Config(crate::config::Options),
}

fn init_logger(global: &Global) {
    let mut builder = env_logger::Builder::from_default_env();
    if global.verbose {
        builder
            .filter_level(log::LevelFilter::Debug)
            .filter_module("lopdf", log::LevelFilter::Warn);
    }
    builder.init();
}

fn main() -> Result<()> {
    let app = App::parse();

    init_logger(&app.global);
    color_eyre::install()?;

    match app.command {
        SubCommands::Number(options) => crate::number::run(options, app.global),
        SubCommands::Inspect(options) => crate::inspect::run(options, app.global),
        SubCommands::Config(options) => crate::config::run(options, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
