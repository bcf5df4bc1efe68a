use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use parser::backend::{LopdfBackend, PageId, PdfBackend};
use writer::{FontCache, TextRun};

pub mod parser;
pub mod types;
pub mod writer;

pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page {page} not found, document has {count} pages")]
    PageNotFound { page: usize, count: usize },
    #[error("Unknown built-in font '{0}'")]
    UnknownFont(String),
    #[error("PDF write error: {0}")]
    Write(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// An opened PDF that can be read page by page and annotated with text.
///
/// Inserted text is held in memory until [`PdfDocument::save`] (or
/// [`PdfDocument::to_bytes`]) writes it into the page content. Pages are
/// addressed by 0-based index.
pub struct PdfDocument {
    backend: LopdfBackend,
    page_ids: Vec<PageId>,
    pending: BTreeMap<PageId, Vec<TextRun>>,
    fonts: FontCache,
}

impl PdfDocument {
    /// Read and parse the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        let page_ids = backend.pages().into_values().collect();

        Ok(Self {
            backend,
            page_ids,
            pending: BTreeMap::new(),
            fonts: FontCache::new(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_id(&self, page: usize) -> Result<PageId, PdfError> {
        self.page_ids
            .get(page)
            .copied()
            .ok_or(PdfError::PageNotFound {
                page,
                count: self.page_ids.len(),
            })
    }

    /// Text lines of a page in page space (top-left origin, y down).
    ///
    /// Text inserted but not yet saved is not included.
    pub fn page_layout(&self, page: usize) -> Result<PageLayout, PdfError> {
        let page_id = self.page_id(page)?;
        parser::layout::extract_page(&self.backend, page as u32 + 1, page_id)
    }

    /// Queue `text` for drawing with its baseline origin at `position`, given
    /// in page space.
    pub fn insert_text(
        &mut self,
        page: usize,
        position: (f32, f32),
        text: &str,
        style: &TextStyle,
    ) -> Result<(), PdfError> {
        let page_id = self.page_id(page)?;
        let page_box = self.backend.page_box(page_id)?;
        let (x, y) = page_box.to_user_space(position.0, position.1);

        self.pending.entry(page_id).or_default().push(TextRun {
            x,
            y,
            text: text.to_string(),
            style: style.clone(),
        });
        Ok(())
    }

    /// Number of text runs waiting to be written.
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Write all queued text into the page content.
    fn flush(&mut self) -> Result<(), PdfError> {
        let pending = std::mem::take(&mut self.pending);
        for (page_id, runs) in &pending {
            writer::apply_overlay(self.backend.raw_doc_mut(), *page_id, runs, &mut self.fonts)?;
        }
        Ok(())
    }

    /// Serialise the document, queued text included.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        self.flush()?;

        let mut buf = Vec::new();
        self.backend
            .raw_doc_mut()
            .save_to(&mut buf)
            .map_err(|e| PdfError::Write(e.to_string()))?;
        Ok(buf)
    }

    /// Save to `path` through a temporary file in the same directory, so the
    /// destination is either fully written or left as it was.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), PdfError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| PdfError::Io(e.error))?;

        log::debug!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
