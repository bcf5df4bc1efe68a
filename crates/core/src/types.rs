use std::fmt;

use serde::{Deserialize, Serialize};

/// A run of text inside an extracted line, positioned at its baseline origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub size: f32,
    /// `(x, y)` of the baseline origin, top-left page space.
    pub origin: (f32, f32),
}

/// Axis-aligned box `(x0, y0, x1, y1)` in top-left page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }
}

/// One line of text as reported by the document model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub spans: Vec<TextSpan>,
    pub bbox: BoundingBox,
}

/// Everything the numbering pipeline needs to know about a page.
///
/// Coordinates use a top-left origin with y growing downward, so "above"
/// means a smaller y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub width: f32,
    pub height: f32,
    pub lines: Vec<LineRecord>,
}

impl PageText {
    pub fn midpoint(&self) -> f32 {
        self.width / 2.0
    }
}

/// A filtered body-text line, reduced to what the classifier looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub center: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Top,
    Left,
    Right,
}

impl Zone {
    /// Zones in the order they receive numbers.
    pub const ORDER: [Zone; 3] = [Zone::Top, Zone::Left, Zone::Right];
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Top => write!(f, "top"),
            Zone::Left => write!(f, "left"),
            Zone::Right => write!(f, "right"),
        }
    }
}

/// A line number to draw, positioned at the baseline of its row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineLabel {
    pub number: u32,
    pub x: f32,
    pub y: f32,
    pub zone: Zone,
}

impl LineLabel {
    pub fn text(&self) -> String {
        self.number.to_string()
    }
}

/// A label bound to the page it was placed on (0-based page index).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedLabel {
    pub page: usize,
    #[serde(flatten)]
    pub label: LineLabel,
}

/// Numbering decided for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    pub split_y: f32,
    pub labels: Vec<LineLabel>,
    pub next_number: u32,
}

/// Summary of a whole-document run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingReport {
    pub pages: usize,
    pub labels: Vec<PlacedLabel>,
    pub next_number: u32,
}

impl NumberingReport {
    pub fn numbered_rows(&self) -> usize {
        self.labels.len()
    }
}
