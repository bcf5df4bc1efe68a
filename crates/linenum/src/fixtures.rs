//! Synthetic PDFs for tests.

use std::io::Write;

use lopdf::{dictionary, Document, Object, Stream};
use tempfile::NamedTempFile;

/// Characters the `/F2` font can show, CID `n` being the `n`th one.
const CID_ALPHABET: &str =
    " :.0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `text` as a hex string of `/F2` CIDs.
pub fn cid_hex(text: &str) -> String {
    let codes: String = text
        .chars()
        .map(|c| {
            let cid = CID_ALPHABET.find(c).expect("character in CID alphabet") + 1;
            format!("{cid:04X}")
        })
        .collect();
    format!("<{codes}>")
}

fn to_unicode_cmap() -> Vec<u8> {
    let mappings: String = CID_ALPHABET
        .chars()
        .enumerate()
        .map(|(i, c)| format!("<{:04X}> <{:04X}>\n", i + 1, c as u32))
        .collect();
    format!(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
         {} beginbfchar\n{mappings}endbfchar\n\
         endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n",
        CID_ALPHABET.chars().count()
    )
    .into_bytes()
}

/// A Letter-sized document with one content stream per page.
///
/// `/F1` is Helvetica. `/F2` is a Type0 Identity-H font with a `/ToUnicode`
/// map; show text with it through [`cid_hex`].
pub fn pdf_bytes(contents: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let cmap_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap()));
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "ABCDEF+Calibri",
        "Encoding" => "Identity-H",
        "ToUnicode" => Object::Reference(cmap_id),
    });

    let kids: Vec<Object> = contents
        .iter()
        .map(|content| {
            let stream = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
            let page = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(stream),
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => Object::Reference(font_id),
                        "F2" => Object::Reference(cid_font_id),
                    },
                },
            });
            Object::Reference(page)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// [`pdf_bytes`] written to a temporary `.pdf` file.
pub fn write_pdf(contents: &[&str]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(&pdf_bytes(contents)).unwrap();
    file.flush().unwrap();
    file
}
