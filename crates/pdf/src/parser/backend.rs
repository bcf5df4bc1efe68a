use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use super::encoding::{parse_differences, ByteTable};
use crate::types::PageBox;
use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Font information extracted from a page's resource dictionary.
#[derive(Debug, Clone, Default)]
pub struct BackendFontInfo {
    /// The font name key as it appears in the resource dictionary (e.g. `b"F1"`).
    pub name: Vec<u8>,
    /// Base font name from the font dictionary, if present.
    pub base_font: Option<String>,
    /// `Type0` fonts use multi-byte character codes.
    pub composite: bool,
    /// Glyph widths of a simple font, if it declares `/FirstChar` and `/Widths`.
    pub widths: Option<GlyphWidths>,
}

/// The `/Widths` array of a simple font, in thousandths of text space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphWidths {
    pub first_char: u32,
    pub widths: Vec<f32>,
}

impl GlyphWidths {
    /// Width of a single-byte character code, if the font lists it.
    pub fn width(&self, code: u8) -> Option<f32> {
        let index = (code as u32).checked_sub(self.first_char)?;
        self.widths.get(index as usize).copied()
    }
}

/// A simplified, lopdf-independent representation of a PDF value.
///
/// Content-stream operands are converted into this enum so the extraction
/// state machine can be driven by mock backends in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    /// Dictionaries and references carry nothing the extractor needs.
    Other,
}

/// Turns the raw bytes of a shown string into text.
pub type TextDecoder<'a> = Box<dyn Fn(&[u8]) -> String + 'a>;

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a content-stream operand into a [`PdfValue`].
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// UTF-16BE with a byte-order mark first, then UTF-8, then Latin-1 with
/// every byte mapped to the code point of the same value.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(b"\xFE\xFF") {
        return decode_utf16be(payload);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Decode big-endian UTF-16 code units; a trailing odd byte is dropped.
fn decode_utf16be(bytes: &[u8]) -> String {
    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&code_units)
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Read access to a parsed PDF, as needed by text extraction.
///
/// Extraction is written against this trait so the content-stream state
/// machine can be tested with mock pages instead of real files.
pub trait PdfBackend {
    /// Return a mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// The page's MediaBox, inherited from the page tree when absent.
    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError>;

    /// Return font information for every font referenced by the given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError>;

    /// Return the decompressed content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    /// Decode raw content-stream bytes into a sequence of [`ContentOp`]s.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decoder for the string operands shown with the font `font_name` of
    /// `page`. Built once per font and page.
    fn text_decoder(&self, page: PageId, font_name: &[u8]) -> TextDecoder<'_>;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Mutable access for writers that add objects to the document.
    pub fn raw_doc_mut(&mut self) -> &mut lopdf::Document {
        &mut self.doc
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    // -- private helpers ----------------------------------------------------

    /// Walk up the page tree to find the MediaBox array.
    fn find_media_box(&self, dict: &lopdf::Dictionary) -> Option<Vec<lopdf::Object>> {
        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Some(arr) = self.resolve_array(obj) {
                return Some(arr);
            }
        }

        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_object(parent_id).ok()?.as_dict().ok()?;
        self.find_media_box(parent)
    }

    /// Resolve an object to an array, following a single level of indirection.
    fn resolve_array(&self, obj: &lopdf::Object) -> Option<Vec<lopdf::Object>> {
        match obj {
            lopdf::Object::Array(arr) => Some(arr.clone()),
            lopdf::Object::Reference(id) => self
                .doc
                .get_object(*id)
                .ok()
                .and_then(|resolved| resolved.as_array().ok())
                .cloned(),
            _ => None,
        }
    }

    /// Convert a vector of lopdf objects to `f32` values.
    fn array_to_f32s(&self, objects: &[lopdf::Object]) -> Result<Vec<f32>, PdfError> {
        objects
            .iter()
            .map(|obj| {
                let resolved = match obj {
                    lopdf::Object::Reference(id) => self
                        .doc
                        .get_object(*id)
                        .map_err(|e| PdfError::Parse(e.to_string()))?,
                    other => other,
                };
                match resolved {
                    lopdf::Object::Integer(i) => Ok(*i as f32),
                    lopdf::Object::Real(f) => Ok(*f),
                    _ => Err(PdfError::Parse(format!(
                        "expected number in array, got {:?}",
                        resolved
                    ))),
                }
            })
            .collect()
    }

    /// Read `/FirstChar` and `/Widths` from a simple font dictionary.
    fn glyph_widths(&self, font: &lopdf::Dictionary) -> Option<GlyphWidths> {
        let first_char = match font.get(b"FirstChar").ok()? {
            lopdf::Object::Integer(i) => u32::try_from(*i).ok()?,
            _ => return None,
        };
        let raw = self.resolve_array(font.get(b"Widths").ok()?)?;
        let widths = self.array_to_f32s(&raw).ok()?;
        Some(GlyphWidths { first_char, widths })
    }

    /// The `/Differences` table of a simple font that has no `/ToUnicode`
    /// map, if its `/Encoding` is a dictionary.
    fn differences_table(&self, font: &lopdf::Dictionary) -> Option<ByteTable> {
        if font.has(b"ToUnicode") {
            return None;
        }

        let encoding = match font.get(b"Encoding").ok()? {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).ok()?,
            other => other,
        };
        let encoding = encoding.as_dict().ok()?;

        let differences = match encoding.get(b"Differences").ok()? {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).ok()?,
            other => other,
        };
        let differences = parse_differences(differences.as_array().ok()?);
        let base = encoding
            .get(b"BaseEncoding")
            .and_then(lopdf::Object::as_name)
            .ok();

        Some(ByteTable::new(&self.doc, base, &differences))
    }
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError> {
        let page_dict = self
            .doc
            .get_object(page)
            .and_then(|obj| obj.as_dict())
            .map_err(|e| PdfError::Parse(format!("cannot get page dictionary: {}", e)))?;

        let media_box = self
            .find_media_box(page_dict)
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;

        let nums = self.array_to_f32s(&media_box)?;
        if nums.len() < 4 {
            return Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                nums.len()
            )));
        }

        Ok(PageBox::from_corners(nums[0], nums[1], nums[2], nums[3]))
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
        let fonts_map = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        let mut result = Vec::with_capacity(fonts_map.len());
        for (name, dict) in &fonts_map {
            let base_font = dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned());

            let composite = dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok())
                .is_some_and(|n| n == b"Type0");

            let widths = if composite {
                None
            } else {
                self.glyph_widths(dict)
            };

            result.push(BackendFontInfo {
                name: name.clone(),
                base_font,
                composite,
                widths,
            });
        }

        Ok(result)
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn text_decoder(&self, page: PageId, font_name: &[u8]) -> TextDecoder<'_> {
        let font = self
            .doc
            .get_page_fonts(page)
            .ok()
            .and_then(|fonts| fonts.get(font_name).copied());

        let Some(font) = font else {
            return Box::new(decode_text_simple);
        };
        if !font.has(b"Encoding") && !font.has(b"ToUnicode") {
            return Box::new(decode_text_simple);
        }

        if let Some(table) = self.differences_table(font) {
            return Box::new(move |bytes: &[u8]| table.decode(bytes));
        }

        let encoding = match font.get_font_encoding(&self.doc) {
            Ok(encoding) => encoding,
            Err(e) => {
                log::debug!(
                    "font {}: no usable encoding ({e}), decoding bytes as text",
                    String::from_utf8_lossy(font_name)
                );
                return Box::new(decode_text_simple);
            }
        };

        Box::new(move |bytes: &[u8]| {
            lopdf::Document::decode_text(&encoding, bytes)
                .unwrap_or_else(|_| decode_text_simple(bytes))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
