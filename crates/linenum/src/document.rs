//! [`DocumentModel`] over a PDF file.

use std::path::Path;

use linenum_core::{BoundingBox, DocumentModel, LabelStyle, LineRecord, PageText, TextSpan};
use pdf::{PageLayout, PdfDocument, PdfError, StandardFont, TextLine, TextStyle};

pub struct PdfModel {
    doc: PdfDocument,
}

impl PdfModel {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        Ok(Self {
            doc: PdfDocument::open(path)?,
        })
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), PdfError> {
        self.doc.save(path)
    }
}

impl DocumentModel for PdfModel {
    type Error = PdfError;

    fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    fn page_text(&self, page: usize) -> Result<PageText, PdfError> {
        let layout = self.doc.page_layout(page)?;
        log::debug!("page {}: {} lines extracted", layout.number, layout.lines.len());
        Ok(page_text(&layout))
    }

    fn insert_text(
        &mut self,
        page: usize,
        position: (f32, f32),
        text: &str,
        style: &LabelStyle,
    ) -> Result<(), PdfError> {
        self.doc.insert_text(page, position, text, &text_style(style)?)
    }
}

pub fn page_text(layout: &PageLayout) -> PageText {
    PageText {
        width: layout.page_box.width(),
        height: layout.page_box.height(),
        lines: layout.lines.iter().map(line_record).collect(),
    }
}

fn line_record(line: &TextLine) -> LineRecord {
    LineRecord {
        spans: line
            .spans
            .iter()
            .map(|span| TextSpan {
                text: span.text.clone(),
                size: span.font_size,
                origin: (span.x, span.y),
            })
            .collect(),
        bbox: BoundingBox::new(line.x0, line.y0, line.x1, line.y1),
    }
}

pub fn text_style(style: &LabelStyle) -> Result<TextStyle, PdfError> {
    Ok(TextStyle {
        font: StandardFont::parse(&style.font_name)?,
        font_size: style.font_size,
        color: style.color,
    })
}
