use std::path::PathBuf;

use linenum_core::NumberingConfig;

use crate::prelude::{println, *};

/// Where to read the numbering configuration from.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// TOML file overriding the default thresholds and label style
    #[arg(long, env = "LINENUM_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// The file's configuration, or the defaults when no file is given.
    pub fn load(&self) -> Result<NumberingConfig> {
        match &self.config {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                NumberingConfig::load(path)
                    .with_context(|| format!("failed to load {}", path.display()))
            }
            None => Ok(NumberingConfig::default()),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct Options {
    #[clap(flatten)]
    pub config: ConfigArgs,
}

pub fn run(options: Options, _global: crate::Global) -> Result<()> {
    let config = options.config.load()?;
    println!("{}", config.to_toml_string()?.trim_end());
    Ok(())
}
