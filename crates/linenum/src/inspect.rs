use std::path::PathBuf;

use colored::Colorize;
use linenum_core::{plan_document, NumberingReport};

use crate::config::ConfigArgs;
use crate::document::PdfModel;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args)]
pub struct Options {
    /// PDF to inspect
    pub input: PathBuf,

    /// Only show labels of this page (1-based)
    #[arg(long)]
    pub page: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub config: ConfigArgs,
}

pub fn run(options: Options, _global: crate::Global) -> Result<()> {
    let config = options.config.load()?;

    let model = PdfModel::open(&options.input)
        .with_context(|| format!("failed to open {}", options.input.display()))?;
    let report = plan_document(&model, &config).inspect_err(|e| {
        log::error!("{}: {e}", options.input.display());
    })?;
    let report = select_page(report, options.page)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.labels.is_empty() {
        println!("{}", "No rows to number".yellow());
        return Ok(());
    }

    new_report_table(&report).printstd();
    Ok(())
}

/// Keep only the labels of `page` (1-based).
fn select_page(mut report: NumberingReport, page: Option<usize>) -> Result<NumberingReport, Error> {
    let Some(page) = page else {
        return Ok(report);
    };

    if page == 0 || page > report.pages {
        return Err(Error::PageOutOfRange {
            page,
            pages: report.pages,
        });
    }

    report.labels.retain(|placed| placed.page + 1 == page);
    Ok(report)
}

fn new_report_table(report: &NumberingReport) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Page".bold().cyan(),
        "Zone".bold().cyan(),
        "Number".bold().cyan(),
        "X".bold().cyan(),
        "Y".bold().cyan()
    ]);

    for placed in &report.labels {
        let label = &placed.label;
        table.add_row(prettytable::row![
            placed.page + 1,
            label.zone,
            label.number.to_string().green(),
            format!("{:.1}", label.x),
            format!("{:.1}", label.y)
        ]);
    }

    table
}
