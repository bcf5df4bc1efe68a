//! Row grouping and line numbering within a zone.

use std::cmp::Ordering;

use crate::config::NumberingConfig;
use crate::types::{LineLabel, Snippet, Zone};

/// Snippets sharing one visual line, top-to-bottom then in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub snippets: Vec<Snippet>,
}

impl Row {
    /// Texts joined with a single space.
    pub fn text(&self) -> String {
        self.snippets
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Leftmost snippet edge.
    pub fn min_x(&self) -> f32 {
        self.snippets
            .iter()
            .map(|s| s.x)
            .reduce(f32::min)
            .unwrap_or(0.0)
    }

    /// Baseline of the first (topmost) snippet.
    pub fn y(&self) -> f32 {
        self.snippets.first().map(|s| s.y).unwrap_or(0.0)
    }
}

/// Sort snippets by baseline and chain them into rows.
///
/// Each snippet is compared with the last member of the current row, not
/// with the row's first member. A run of snippets each within `tolerance` of
/// its predecessor therefore forms a single row even when the run as a whole
/// spans more than `tolerance`.
pub fn group_rows(mut snippets: Vec<Snippet>, tolerance: f32) -> Vec<Row> {
    snippets.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal));

    let mut rows: Vec<Row> = Vec::new();
    let mut current: Vec<Snippet> = Vec::new();

    for snippet in snippets {
        if let Some(last) = current.last() {
            if (snippet.y - last.y).abs() > tolerance {
                rows.push(Row {
                    snippets: std::mem::take(&mut current),
                });
            }
        }
        current.push(snippet);
    }

    if !current.is_empty() {
        rows.push(Row { snippets: current });
    }

    rows
}

/// Number the rows of one zone, starting at `start`.
///
/// Labels are pushed to `out`; the returned value is the next unused number.
/// Caption rows get no label and do not consume a number. An empty zone
/// returns `start` unchanged.
pub fn number_zone(
    snippets: Vec<Snippet>,
    zone: Zone,
    start: u32,
    config: &NumberingConfig,
    out: &mut Vec<LineLabel>,
) -> u32 {
    if snippets.is_empty() {
        return start;
    }

    let mut counter = start;
    for row in group_rows(snippets, config.row_tolerance) {
        let lowered = row.text().to_lowercase();
        if config.is_caption(&lowered) {
            log::debug!("skipping caption row at y={:.1}: {:?}", row.y(), lowered);
            continue;
        }

        out.push(LineLabel {
            number: counter,
            x: row.min_x() - config.number_offset,
            y: row.y(),
            zone,
        });
        counter += 1;
    }

    counter
}
