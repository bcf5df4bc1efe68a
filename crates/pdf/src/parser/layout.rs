//! Text extraction and line assembly.
//!
//! Raw content-stream operators are replayed through a small text-state
//! machine that yields positioned [`TextSpan`]s, which are then grouped into
//! [`TextLine`]s. All output is in page space (top-left origin, y down).
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  TextSpan[]          ->  TextLine[]
//!   (per page)      extract_page_spans     group_spans_into_lines
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use unicode_normalization::UnicodeNormalization;

use super::backend::{
    decode_text_simple, get_number_from_value, BackendFontInfo, ContentOp, PageId, PdfBackend,
    PdfValue, TextDecoder,
};
use crate::types::{PageBox, PageLayout, TextLine, TextSpan};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Spans whose baselines differ by at most this much share a baseline group.
const Y_TOLERANCE: f32 = 1.0;

/// Glyph width, in thousandths of text space, used when the font has no
/// usable `/Widths` entry.
const APPROX_GLYPH_WIDTH: f32 = 500.0;

/// Below this gap (points) two spans of the same font are joined without a
/// space.
const MIN_WORD_GAP: f32 = 1.5;

/// A horizontal gap wider than this multiple of the font size starts a new
/// line on the same baseline.
const COLUMN_GAP_FACTOR: f32 = 1.0;

/// Two sizes closer than this count as the same font size.
const FONT_SIZE_TOLERANCE: f32 = 0.5;

/// Fraction of the font size above and below the baseline covered by a
/// line's bounding box.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

// ---------------------------------------------------------------------------
// Matrices
// ---------------------------------------------------------------------------

/// `[a, b, c, d, e, f]`, row-vector convention as in the PDF reference.
type Matrix = [f32; 6];

const IDENTITY_MATRIX: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 × m2`: apply `m1` first, then `m2`.
fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn transform_point(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Read six numeric operands (`Tm`, `cm`).
fn matrix_operand(operands: &[PdfValue]) -> Option<Matrix> {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    (vals.len() == 6).then(|| [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]])
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// Text parameters tracked while walking a content stream. Saved and
/// restored by `q` / `Q` together with the CTM.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource name (the `/F1`-style key).
    font_key: Vec<u8>,
    /// Resolved base-font name, or the key when the font is not in the
    /// page resources.
    font_name: String,
    /// Index of the current font in the page's font list.
    font: Option<usize>,
    font_size: f32,
    text_matrix: Matrix,
    line_matrix: Matrix,
    /// Tz / 100.
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font: None,
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Move the text position `dx` units along the text-space x axis.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// `Td`: translate the line matrix and start a new line there.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }
}

/// Walks one page's operators and collects spans.
struct PageExtractor<'a> {
    backend: &'a dyn PdfBackend,
    page_id: PageId,
    page_box: PageBox,
    fonts: Vec<BackendFontInfo>,
    decoders: BTreeMap<Vec<u8>, TextDecoder<'a>>,
    state: TextState,
    ctm: Matrix,
    saved: Vec<(Matrix, TextState)>,
    spans: Vec<TextSpan>,
}

impl<'a> PageExtractor<'a> {
    fn new(
        backend: &'a dyn PdfBackend,
        page_id: PageId,
        page_box: PageBox,
        fonts: Vec<BackendFontInfo>,
    ) -> Self {
        Self {
            backend,
            page_id,
            page_box,
            fonts,
            decoders: BTreeMap::new(),
            state: TextState::default(),
            ctm: IDENTITY_MATRIX,
            saved: Vec::new(),
            spans: Vec::new(),
        }
    }

    fn run(mut self, ops: &[ContentOp]) -> Vec<TextSpan> {
        for op in ops {
            self.apply(op);
        }
        self.spans
    }

    fn apply(&mut self, op: &ContentOp) {
        let first_number = || op.operands.first().and_then(get_number_from_value);

        match op.operator.as_str() {
            // -- Graphics state -----------------------------------------
            "q" => self.saved.push((self.ctm, self.state.clone())),
            "Q" => {
                if let Some((ctm, state)) = self.saved.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }

            // -- Text objects -------------------------------------------
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "ET" => {}

            "Tf" => self.handle_tf(&op.operands),
            "Tm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number_from_value(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        self.state.leading = -ty;
                    }
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => self.state.next_line(),
            "TL" => {
                if let Some(v) = first_number() {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = first_number() {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first_number() {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first_number() {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first_number() {
                    self.state.text_rise = v;
                }
            }

            // -- Text showing -------------------------------------------
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show_string(bytes);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    self.show_array(arr);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show_string(bytes);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    if let Some(aw) = get_number_from_value(&op.operands[0]) {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(&op.operands[1]) {
                        self.state.char_spacing = ac;
                    }
                    self.state.next_line();
                    if let PdfValue::Str(bytes) = &op.operands[2] {
                        self.show_string(bytes);
                    }
                }
            }

            _ => {}
        }
    }

    fn handle_tf(&mut self, operands: &[PdfValue]) {
        if operands.len() < 2 {
            return;
        }
        let key = match &operands[0] {
            PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
            _ => return,
        };

        let index = self.fonts.iter().position(|info| info.name == key);
        let font_name = index
            .and_then(|i| self.fonts[i].base_font.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());

        self.state.font_name = font_name;
        self.state.font = index;
        self.state.font_key = key;
        self.state.font_size = get_number_from_value(&operands[1]).unwrap_or(0.0);
    }

    /// Text rendering matrix without the font size term.
    fn rendering_matrix(&self) -> Matrix {
        multiply(&self.state.text_matrix, &self.ctm)
    }

    /// Current glyph origin on the unrisen baseline, in user space.
    fn origin(&self) -> (f32, f32) {
        transform_point(&self.rendering_matrix(), 0.0, 0.0)
    }

    /// How far `Ts` lifts the glyphs off the baseline, in page units.
    fn rendered_rise(&self) -> f32 {
        let m = self.rendering_matrix();
        self.state.text_rise * (m[2].powi(2) + m[3].powi(2)).sqrt()
    }

    /// Font size as drawn on the page.
    fn rendered_font_size(&self) -> f32 {
        let m = self.rendering_matrix();
        (self.state.font_size * (m[2].powi(2) + m[3].powi(2)).sqrt()).abs()
    }

    /// Horizontal displacement, in text space, of showing `bytes`.
    fn advance_for(&self, bytes: &[u8]) -> f32 {
        let state = &self.state;
        let font = state.font.and_then(|i| self.fonts.get(i));
        let glyph = |w0: f32| w0 / 1000.0 * state.font_size + state.char_spacing;

        let total: f32 = if font.is_some_and(|f| f.composite) {
            bytes.chunks(2).map(|_| glyph(APPROX_GLYPH_WIDTH)).sum()
        } else {
            let widths = font.and_then(|f| f.widths.as_ref());
            bytes
                .iter()
                .map(|&code| {
                    let w0 = widths
                        .and_then(|w| w.width(code))
                        .unwrap_or(APPROX_GLYPH_WIDTH);
                    let word = if code == b' ' { state.word_spacing } else { 0.0 };
                    glyph(w0) + word
                })
                .sum()
        };

        total * state.horiz_scale
    }

    /// Decode with the backend's font-aware decoder, then NFKC-normalise.
    fn decode(&mut self, bytes: &[u8]) -> String {
        let backend = self.backend;
        let page_id = self.page_id;
        let key = &self.state.font_key;
        let decoder = self
            .decoders
            .entry(key.clone())
            .or_insert_with(|| backend.text_decoder(page_id, key));
        let decoded = decoder(bytes);
        let decoded = if decoded.is_empty() {
            decode_text_simple(bytes)
        } else {
            decoded
        };
        decoded.nfkc().collect()
    }

    fn show_string(&mut self, bytes: &[u8]) {
        let text = self.decode(bytes);
        let start = self.origin();
        let dx = self.advance_for(bytes);
        self.state.advance_x(dx);
        let end = self.origin();

        if !text.trim().is_empty() {
            self.push_span(text, start, end);
        }
    }

    /// `TJ`: strings interleaved with adjustments in thousandths of text
    /// space. One span per array; a large negative adjustment becomes a
    /// space.
    fn show_array(&mut self, arr: &[PdfValue]) {
        let mut buf = String::new();
        let mut start = self.origin();
        let mut end = start;

        for elem in arr {
            match elem {
                PdfValue::Str(bytes) => {
                    if buf.trim_start().is_empty() {
                        buf.clear();
                        start = self.origin();
                    }
                    buf.push_str(&self.decode(bytes));
                    let dx = self.advance_for(bytes);
                    self.state.advance_x(dx);
                    end = self.origin();
                }
                val => {
                    if let Some(adj) = get_number_from_value(val) {
                        let state = &self.state;
                        let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                        let gap_threshold = state.font_size
                            * (APPROX_GLYPH_WIDTH / 1000.0)
                            * state.horiz_scale
                            * 0.3;

                        if dx > gap_threshold && !buf.is_empty() && !buf.ends_with(' ') {
                            buf.push(' ');
                        }
                        self.state.advance_x(dx);
                    }
                }
            }
        }

        let text = buf.trim_end();
        if !text.is_empty() {
            self.push_span(text.to_string(), start, end);
        }
    }

    fn push_span(&mut self, text: String, start: (f32, f32), end: (f32, f32)) {
        let (x, y) = self.page_box.to_page_space(start.0, start.1);
        let font_size = self.rendered_font_size();
        self.spans.push(TextSpan {
            text,
            x,
            y,
            width: (end.0 - start.0).max(0.0),
            font_size,
            font_name: self.state.font_name.clone(),
            rise: self.rendered_rise(),
        });
    }
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Walk a single page's content stream and produce its [`TextSpan`]s in page
/// space.
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` `Q`  | Save / restore the CTM and text parameters |
/// | `cm`     | Concatenate to the CTM |
/// | `BT`     | Begin text object, reset matrices |
/// | `ET`     | End text object |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix directly |
/// | `Td`     | Translate text position |
/// | `TD`     | Translate and set leading |
/// | `T*`     | Move to start of next line |
/// | `TL`     | Set text leading |
/// | `Tc`     | Set character spacing |
/// | `Tw`     | Set word spacing |
/// | `Tz`     | Set horizontal scaling |
/// | `Ts`     | Set text rise |
/// | `Tj`     | Show a string |
/// | `TJ`     | Show strings with kerning adjustments |
/// | `'`      | Move to next line and show string |
/// | `"`      | Set spacing, move to next line and show string |
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
    page_box: PageBox,
) -> Result<Vec<TextSpan>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    Ok(PageExtractor::new(backend, page_id, page_box, fonts).run(&ops))
}

/// Extract and assemble the lines of one page.
pub fn extract_page(
    backend: &dyn PdfBackend,
    number: u32,
    page_id: PageId,
) -> Result<PageLayout, PdfError> {
    let page_box = backend.page_box(page_id)?;
    let spans = extract_page_spans(backend, page_id, page_box)?;
    let lines = group_spans_into_lines(spans);

    log::trace!("page {}: {} lines", number, lines.len());

    Ok(PageLayout {
        number,
        page_box,
        lines,
    })
}

// ---------------------------------------------------------------------------
// Public API: span -> line grouping
// ---------------------------------------------------------------------------

fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Group page-space spans into lines, top to bottom.
///
/// Spans within [`Y_TOLERANCE`] of the first span of a baseline group share
/// that group. Baselines ignore text rise, so superscripts and subscripts stay
/// on the line they belong to. A group is then cut wherever the gap to the next span exceeds
/// the font size, so side-by-side columns come out as separate lines.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| cmp_f32(a.y, b.y).then(cmp_f32(a.x, b.x)));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut group: Vec<TextSpan> = Vec::new();

    for span in spans {
        if let Some(anchor) = group.first() {
            if (span.y - anchor.y).abs() > Y_TOLERANCE {
                split_baseline_group(std::mem::take(&mut group), &mut lines);
            }
        }
        group.push(span);
    }

    if !group.is_empty() {
        split_baseline_group(group, &mut lines);
    }

    lines
}

fn split_baseline_group(mut spans: Vec<TextSpan>, lines: &mut Vec<TextLine>) {
    spans.sort_by(|a, b| cmp_f32(a.x, b.x));

    let mut run: Vec<TextSpan> = Vec::new();
    let mut run_right = f32::MIN;

    for span in spans {
        if let Some(prev) = run.last() {
            let gap = span.x - run_right;
            if gap > prev.font_size.max(span.font_size) * COLUMN_GAP_FACTOR {
                lines.push(assemble_line(std::mem::take(&mut run)));
                run_right = f32::MIN;
            }
        }
        run_right = run_right.max(span.right());
        run.push(span);
    }

    if !run.is_empty() {
        lines.push(assemble_line(run));
    }
}

/// Build a [`TextLine`] from spans sorted left to right.
///
/// Neighbouring spans in the same font are merged: directly when they touch,
/// with a space otherwise. A font change starts a new span.
fn assemble_line(spans: Vec<TextSpan>) -> TextLine {
    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - prev.right();
            let same_font = prev.font_name == span.font_name
                && (prev.font_size - span.font_size).abs() < FONT_SIZE_TOLERANCE
                && (prev.rise - span.rise).abs() < Y_TOLERANCE;

            if same_font && gap > -prev.font_size {
                if gap >= MIN_WORD_GAP && !prev.text.ends_with(' ') {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = span.right().max(prev.right()) - prev.x;
                continue;
            }
        }

        merged.push(span);
    }

    let x0 = merged.first().map(|s| s.x).unwrap_or(0.0);
    let x1 = merged.iter().map(TextSpan::right).fold(x0, f32::max);
    let y0 = merged
        .iter()
        .map(|s| s.y - s.rise - s.font_size * ASCENT)
        .reduce(f32::min)
        .unwrap_or(0.0);
    let y1 = merged
        .iter()
        .map(|s| s.y - s.rise + s.font_size * DESCENT)
        .reduce(f32::max)
        .unwrap_or(0.0);

    TextLine {
        spans: merged,
        x0,
        y0,
        x1,
        y1,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
