use std::path::{Path, PathBuf};

use colored::Colorize;
use linenum_core::{number_document, NumberingConfig, NumberingError, NumberingReport};
use pdf::PdfError;

use crate::config::ConfigArgs;
use crate::document::PdfModel;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// PDF to number
    pub input: PathBuf,

    /// Where to write the numbered PDF
    pub output: PathBuf,

    #[clap(flatten)]
    pub config: ConfigArgs,
}

pub fn run(options: Options, _global: crate::Global) -> Result<()> {
    let config = options.config.load()?;

    let report = number_file(&options.input, &options.output, &config).inspect_err(|e| {
        log::error!("{}: {e}", options.input.display());
    })?;

    println!(
        "{} {} rows across {} pages into {}",
        "Numbered".green().bold(),
        report.numbered_rows(),
        report.pages,
        options.output.display().to_string().cyan()
    );

    Ok(())
}

/// Number `input` and write the result to `output`.
///
/// Nothing is written unless every page was numbered; `output` is replaced in
/// a single rename.
pub fn number_file(
    input: &Path,
    output: &Path,
    config: &NumberingConfig,
) -> Result<NumberingReport, NumberingError> {
    let mut model = PdfModel::open(input).map_err(|e| open_error(input, e))?;
    let report = number_document(&mut model, config)?;

    model.save(output).map_err(|e| {
        NumberingError::failed(format!("cannot write {}: {e}", output.display()))
    })?;

    Ok(report)
}

fn open_error(path: &Path, e: PdfError) -> NumberingError {
    match e {
        PdfError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            NumberingError::failed(format!("file not found: {}", path.display()))
        }
        PdfError::Encrypted => {
            NumberingError::failed(format!("{} is encrypted", path.display()))
        }
        e => NumberingError::failed(format!("cannot open {}: {e}", path.display())),
    }
}
