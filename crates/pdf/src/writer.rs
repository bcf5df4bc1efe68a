//! Text overlay on existing pages.
//!
//! Inserted text is buffered per page and written in one pass when the
//! document is saved. Each touched page gets:
//!
//! - a base-14 font in its (page-local) `/Resources`,
//! - its original content streams wrapped in `q` … `Q`,
//! - one trailing content stream holding the new text objects.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::parser::backend::PageId;
use crate::types::{StandardFont, TextStyle};
use crate::PdfError;

/// Text to draw at a user-space baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub style: TextStyle,
}

/// Font objects already added to the document, one per base-14 font.
pub type FontCache = BTreeMap<StandardFont, ObjectId>;

/// Write `runs` onto `page_id`.
pub fn apply_overlay(
    doc: &mut Document,
    page_id: PageId,
    runs: &[TextRun],
    fonts: &mut FontCache,
) -> Result<(), PdfError> {
    if runs.is_empty() {
        return Ok(());
    }

    let mut keys: BTreeMap<StandardFont, String> = BTreeMap::new();
    for run in runs {
        if !keys.contains_key(&run.style.font) {
            let key = register_font(doc, page_id, run.style.font, fonts)?;
            keys.insert(run.style.font, key);
        }
    }

    let overlay = overlay_content(runs, &keys)?;
    let before = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let after = doc.add_object(Stream::new(dictionary! {}, overlay));
    wrap_contents(doc, page_id, before, after)?;

    log::debug!(
        "page object {:?}: wrote {} text runs",
        page_id,
        runs.len()
    );
    Ok(())
}

/// The font dictionary for `font`, added once per document.
fn font_object(doc: &mut Document, font: StandardFont, fonts: &mut FontCache) -> ObjectId {
    *fonts.entry(font).or_insert_with(|| {
        let mut dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
        };
        if !font.is_symbolic() {
            dict.set("Encoding", "WinAnsiEncoding");
        }
        doc.add_object(dict)
    })
}

/// Make `font` available to the page and return its resource name.
///
/// The page receives its own copy of the resource dictionary (resolving
/// references and inheritance from the page tree), so resources shared with
/// other pages are never modified. The font is registered under its short
/// name; if that name is taken by a different font, a numeric suffix is
/// appended.
fn register_font(
    doc: &mut Document,
    page_id: PageId,
    font: StandardFont,
    fonts: &mut FontCache,
) -> Result<String, PdfError> {
    let mut resources = page_resources(doc, page_id)?;
    let mut font_dict = match resources.get(b"Font") {
        Ok(obj) => resolve_dict(doc, obj).unwrap_or_default(),
        Err(_) => Dictionary::new(),
    };

    let base = font.short_name();
    let mut suffix = 0usize;
    let key = loop {
        let candidate = if suffix == 0 {
            base.to_string()
        } else {
            format!("{base}{suffix}")
        };
        match font_dict.get(candidate.as_bytes()) {
            Err(_) => {
                let id = font_object(doc, font, fonts);
                font_dict.set(candidate.as_bytes().to_vec(), Object::Reference(id));
                break candidate;
            }
            Ok(existing) if is_same_font(doc, existing, font) => break candidate,
            Ok(_) => suffix += 1,
        }
    };

    resources.set("Font", Object::Dictionary(font_dict));
    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));

    Ok(key)
}

/// A font entry left by an earlier run can be reused as is.
fn is_same_font(doc: &Document, entry: &Object, font: StandardFont) -> bool {
    resolve_dict(doc, entry).is_some_and(|dict| {
        let name = |key: &[u8]| dict.get(key).and_then(Object::as_name).ok().map(<[u8]>::to_vec);
        name(b"Subtype").as_deref() == Some(b"Type1".as_slice())
            && name(b"BaseFont").as_deref() == Some(font.base_font().as_bytes())
    })
}

/// Clone of the page's effective resource dictionary.
fn page_resources(doc: &Document, page_id: PageId) -> Result<Dictionary, PdfError> {
    let mut dict = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfError::Write(format!("cannot get page dictionary: {e}")))?;

    loop {
        if let Some(resources) = dict.get(b"Resources").ok().and_then(|o| resolve_dict(doc, o)) {
            return Ok(resources);
        }
        match dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
        {
            Ok(parent) => dict = parent,
            Err(_) => return Ok(Dictionary::new()),
        }
    }
}

fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

fn page_dict_mut(doc: &mut Document, page_id: PageId) -> Result<&mut Dictionary, PdfError> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfError::Write(format!("cannot get page dictionary: {e}")))
}

/// Replace `/Contents` with `[before, existing…, after]`.
fn wrap_contents(
    doc: &mut Document,
    page_id: PageId,
    before: ObjectId,
    after: ObjectId,
) -> Result<(), PdfError> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| PdfError::Write(format!("cannot get page dictionary: {e}")))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(streams)) => streams.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(streams)) => streams.clone(),
            _ => Vec::new(),
        }
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(before));
    contents.extend(existing);
    contents.push(Object::Reference(after));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Encode the overlay stream. It closes the `q` opened before the original
/// content, so the text is drawn in the page's default graphics state.
fn overlay_content(
    runs: &[TextRun],
    keys: &BTreeMap<StandardFont, String>,
) -> Result<Vec<u8>, PdfError> {
    let mut operations = vec![Operation::new("Q", vec![]), Operation::new("q", vec![])];

    for run in runs {
        let key = keys
            .get(&run.style.font)
            .ok_or_else(|| PdfError::Write(format!("font {} not registered", run.style.font)))?;
        let [r, g, b] = run.style.color;

        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(key.as_bytes().to_vec()),
                    Object::Real(run.style.font_size),
                ],
            ),
            Operation::new(
                "rg",
                vec![Object::Real(r), Object::Real(g), Object::Real(b)],
            ),
            Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    Object::Real(run.x),
                    Object::Real(run.y),
                ],
            ),
            Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&run.text),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    operations.push(Operation::new("Q", vec![]));

    let encoded = Content { operations }
        .encode()
        .map_err(|e| PdfError::Write(format!("cannot encode overlay: {e}")))?;

    // Streams are concatenated when the page is read back.
    let mut data = Vec::with_capacity(encoded.len() + 2);
    data.push(b'\n');
    data.extend(encoded);
    data.push(b'\n');
    Ok(data)
}

/// Characters outside Latin-1 are replaced by `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if b >= 0x20 && b != 0x7F => b,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(resources: Option<Object>, contents: Object) -> (Document, PageId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => contents,
        };
        if let Some(resources) = resources {
            page.set("Resources", resources);
        }
        let page_id = doc.add_object(page);

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => dictionary! {
                            "Type" => "Font",
                            "Subtype" => "Type1",
                            "BaseFont" => "Times-Roman",
                        },
                    },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        (doc, page_id)
    }

    fn body_stream(doc: &mut Document) -> Object {
        let id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 10 Tf 72 700 Td (Body) Tj ET".to_vec(),
        ));
        Object::Reference(id)
    }

    fn label(text: &str, x: f32, y: f32) -> TextRun {
        TextRun {
            x,
            y,
            text: text.to_string(),
            style: TextStyle::default(),
        }
    }

    fn page_font_keys(doc: &Document, page_id: PageId) -> Vec<String> {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        fonts
            .iter()
            .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
            .collect()
    }

    fn contents_len(doc: &Document, page_id: PageId) -> usize {
        let page = doc.get_dictionary(page_id).unwrap();
        page.get(b"Contents").unwrap().as_array().unwrap().len()
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("12"), b"12".to_vec());
        assert_eq!(encode_win_ansi("caf\u{00E9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("\u{2192}\n"), b"??".to_vec());
    }

    #[test]
    fn test_overlay_wraps_contents_and_adds_font() {
        let (mut doc, page_id) = page_with(None, Object::Null);
        let body = body_stream(&mut doc);
        page_dict_mut(&mut doc, page_id).unwrap().set("Contents", body);

        let mut fonts = FontCache::new();
        apply_overlay(&mut doc, page_id, &[label("1", 54.0, 700.0)], &mut fonts).unwrap();

        assert_eq!(contents_len(&doc, page_id), 3);
        // Inherited F1 is kept next to the new font.
        assert_eq!(page_font_keys(&doc, page_id), vec!["F1", "helv"]);
        assert_eq!(fonts.len(), 1);

        let content = doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.starts_with("q\n"), "content: {text}");
        assert!(text.contains("(Body) Tj ET\nQ"), "content: {text}");
        assert!(text.contains("/helv"), "content: {text}");
        assert!(text.contains("(1) Tj"), "content: {text}");
        assert!(text.trim_end().ends_with('Q'));
    }

    #[test]
    fn test_overlay_content_balances_graphics_state() {
        let keys = BTreeMap::from([(StandardFont::Helvetica, "helv".to_string())]);
        let data = overlay_content(&[label("1", 54.0, 700.0), label("2", 54.0, 686.0)], &keys)
            .unwrap();
        let ops = Content::decode(&data).unwrap().operations;
        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();

        assert_eq!(operators[..2], ["Q", "q"]);
        assert_eq!(operators.last(), Some(&"Q"));
        assert_eq!(operators.iter().filter(|op| **op == "BT").count(), 2);
        let pushes = operators.iter().filter(|op| **op == "q").count();
        let pops = operators.iter().filter(|op| **op == "Q").count();
        // One extra Q closes the q written before the original content.
        assert_eq!(pops, pushes + 1);
    }

    #[test]
    fn test_overlay_reuses_font_object_across_pages() {
        let (mut doc, page_id) = page_with(None, Object::Array(vec![]));
        let second = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => Object::Array(vec![]),
        });

        let mut fonts = FontCache::new();
        apply_overlay(&mut doc, page_id, &[label("1", 54.0, 700.0)], &mut fonts).unwrap();
        apply_overlay(&mut doc, second, &[label("2", 54.0, 700.0)], &mut fonts).unwrap();

        assert_eq!(fonts.len(), 1);
        assert_eq!(page_font_keys(&doc, second), vec!["helv"]);
    }

    #[test]
    fn test_overlay_renames_on_key_collision() {
        let resources = dictionary! {
            "Font" => dictionary! {
                "helv" => dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Courier",
                },
            },
        };
        let (mut doc, page_id) = page_with(Some(Object::Dictionary(resources)), Object::Array(vec![]));

        let mut fonts = FontCache::new();
        apply_overlay(&mut doc, page_id, &[label("1", 54.0, 700.0)], &mut fonts).unwrap();

        assert_eq!(page_font_keys(&doc, page_id), vec!["helv", "helv1"]);
    }

    #[test]
    fn test_overlay_reuses_existing_matching_font() {
        let resources = dictionary! {
            "Font" => dictionary! {
                "helv" => dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                },
            },
        };
        let (mut doc, page_id) = page_with(Some(Object::Dictionary(resources)), Object::Array(vec![]));

        let mut fonts = FontCache::new();
        apply_overlay(&mut doc, page_id, &[label("1", 54.0, 700.0)], &mut fonts).unwrap();

        assert_eq!(page_font_keys(&doc, page_id), vec!["helv"]);
        assert!(fonts.is_empty());
    }

    #[test]
    fn test_overlay_flattens_contents_array_reference() {
        let (mut doc, page_id) = page_with(None, Object::Null);
        let body = body_stream(&mut doc);
        let array_id = doc.add_object(Object::Array(vec![body]));
        page_dict_mut(&mut doc, page_id)
            .unwrap()
            .set("Contents", Object::Reference(array_id));

        let mut fonts = FontCache::new();
        apply_overlay(&mut doc, page_id, &[label("1", 54.0, 700.0)], &mut fonts).unwrap();

        assert_eq!(contents_len(&doc, page_id), 3);
        let text = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned();
        assert!(text.contains("(Body) Tj"));
    }

    #[test]
    fn test_overlay_leaves_shared_resources_untouched() {
        let (mut doc, page_id) = page_with(None, Object::Array(vec![]));
        let mut fonts = FontCache::new();
        apply_overlay(&mut doc, page_id, &[label("1", 54.0, 700.0)], &mut fonts).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        let parent = page.get(b"Parent").unwrap().as_reference().unwrap();
        let shared = doc.get_dictionary(parent).unwrap();
        let shared_fonts = shared
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap();
        assert_eq!(shared_fonts.len(), 1);
    }

    #[test]
    fn test_empty_overlay_is_a_no_op() {
        let (mut doc, page_id) = page_with(None, Object::Array(vec![]));
        let mut fonts = FontCache::new();
        apply_overlay(&mut doc, page_id, &[], &mut fonts).unwrap();
        assert_eq!(contents_len(&doc, page_id), 0);
    }
}
