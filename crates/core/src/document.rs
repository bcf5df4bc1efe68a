//! Page planning and the whole-document numbering pass.

use std::fmt::Display;

use crate::columns::{detect_split_y, partition};
use crate::config::{LabelStyle, NumberingConfig};
use crate::error::NumberingError;
use crate::filter::extract_snippets;
use crate::rows::number_zone;
use crate::types::{LineLabel, NumberingReport, PagePlan, PageText, PlacedLabel, Zone};

/// First number of a document.
pub const FIRST_NUMBER: u32 = 1;

/// What the numbering pass needs from a document.
///
/// Pages are addressed by 0-based index in document order. Implementations
/// report their own error type; [`number_document`] folds it into
/// [`NumberingError`].
pub trait DocumentModel {
    type Error: Display;

    fn page_count(&self) -> usize;

    /// Extracted lines of a page, in top-left page space.
    fn page_text(&self, page: usize) -> Result<PageText, Self::Error>;

    /// Draw `text` with its baseline origin at `position` (top-left page
    /// space).
    fn insert_text(
        &mut self,
        page: usize,
        position: (f32, f32),
        text: &str,
        style: &LabelStyle,
    ) -> Result<(), Self::Error>;
}

/// Decide the numbers for one page without touching the document.
///
/// Zones are numbered top, then left, then right, starting at `start`.
pub fn plan_page(page: &PageText, config: &NumberingConfig, start: u32) -> PagePlan {
    let snippets = extract_snippets(&page.lines, config);
    let midpoint = page.midpoint();
    let split_y = detect_split_y(&snippets, midpoint, page.height, config.column_split_buffer);
    let mut zones = partition(snippets, split_y, midpoint);

    log::debug!(
        "split_y={:.1} top={} left={} right={}",
        split_y,
        zones.top.len(),
        zones.left.len(),
        zones.right.len()
    );

    let mut labels: Vec<LineLabel> = Vec::new();
    let mut counter = start;
    for zone in Zone::ORDER {
        counter = number_zone(zones.take(zone), zone, counter, config, &mut labels);
    }

    PagePlan {
        split_y,
        labels,
        next_number: counter,
    }
}

/// Plan every page of `doc` without inserting anything.
pub fn plan_document<D: DocumentModel>(
    doc: &D,
    config: &NumberingConfig,
) -> Result<NumberingReport, NumberingError> {
    let mut report = NumberingReport {
        pages: doc.page_count(),
        labels: Vec::new(),
        next_number: FIRST_NUMBER,
    };

    for page in 0..report.pages {
        let text = doc
            .page_text(page)
            .map_err(|e| NumberingError::failed(format!("page {}: {e}", page + 1)))?;
        if text.lines.is_empty() {
            log::warn!("page {}: no text lines found", page + 1);
        }

        let plan = plan_page(&text, config, report.next_number);
        report.next_number = plan.next_number;
        report
            .labels
            .extend(plan.labels.into_iter().map(|label| PlacedLabel { page, label }));
    }

    Ok(report)
}

/// Number every page of `doc` in order and draw the labels.
///
/// The counter starts at [`FIRST_NUMBER`] and carries over from one page to
/// the next. All pages are planned before the first label is drawn. A failed
/// insertion leaves the labels drawn so far in the in-memory document, so
/// callers must not persist it after an error.
pub fn number_document<D: DocumentModel>(
    doc: &mut D,
    config: &NumberingConfig,
) -> Result<NumberingReport, NumberingError> {
    let report = plan_document(doc, config)?;

    for placed in &report.labels {
        let label = &placed.label;
        doc.insert_text(placed.page, (label.x, label.y), &label.text(), &config.label)
            .map_err(|e| {
                NumberingError::failed(format!(
                    "page {}: cannot draw number {}: {e}",
                    placed.page + 1,
                    label.number
                ))
            })?;
    }

    log::info!(
        "numbered {} rows across {} pages",
        report.numbered_rows(),
        report.pages
    );

    Ok(report)
}
