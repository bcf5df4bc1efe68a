//! Simple-font encodings described by a `/Differences` array.
//!
//! `lopdf` resolves named encodings and `/ToUnicode` maps itself but ignores
//! `/Differences`, which subsetting producers use to give every glyph a
//! custom code.

use lopdf::{dictionary, Document, Encoding, Object};

/// A 256-entry code to text table for a single-byte font.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteTable {
    glyphs: Vec<String>,
}

impl ByteTable {
    /// Start from the named base encoding, then apply `differences`.
    ///
    /// Unknown base names fall back to `StandardEncoding`.
    pub fn new(doc: &Document, base: Option<&[u8]>, differences: &[(u8, char)]) -> Self {
        let base = match base {
            Some(name @ (b"WinAnsiEncoding" | b"MacRomanEncoding" | b"MacExpertEncoding")) => name,
            _ => b"StandardEncoding".as_slice(),
        };
        let font = dictionary! {
            "Type" => "Font",
            "Encoding" => Object::Name(base.to_vec()),
        };

        let mut glyphs: Vec<String> = match font.get_font_encoding(doc) {
            Ok(encoding) => (0..=255u8)
                .map(|code| decode_byte(&encoding, code))
                .collect(),
            Err(_) => (0..=255u8).map(|code| (code as char).to_string()).collect(),
        };

        for &(code, ch) in differences {
            glyphs[code as usize] = ch.to_string();
        }

        Self { glyphs }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&code| self.glyphs[code as usize].as_str())
            .collect()
    }
}

fn decode_byte(encoding: &Encoding, code: u8) -> String {
    Document::decode_text(encoding, &[code]).unwrap_or_default()
}

/// Read `[code /name /name … code /name …]`. Each integer starts a run and
/// every following name takes the next code. Names without a known Unicode
/// value still consume their code.
pub fn parse_differences(entries: &[Object]) -> Vec<(u8, char)> {
    let mut result = Vec::new();
    let mut code: Option<u8> = None;

    for entry in entries {
        match entry {
            Object::Integer(i) => code = u8::try_from(*i).ok(),
            Object::Name(name) => {
                if let Some(current) = code {
                    if let Some(ch) = glyph_name_to_char(&String::from_utf8_lossy(name)) {
                        result.push((current, ch));
                    }
                    code = current.checked_add(1);
                }
            }
            _ => {}
        }
    }

    result
}

/// Unicode value of an Adobe glyph name.
///
/// Handles `uniXXXX`, `uXXXX`–`uXXXXXX`, single-letter names and the names
/// that body text commonly uses.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    // Suffixes such as `a.sc` or `one.oldstyle` name variants of the same
    // character.
    let name = name.split('.').next().unwrap_or(name);

    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }

    let ch = match name {
        "space" | "nbspace" => ' ',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "period" => '.',
        "comma" => ',',
        "colon" => ':',
        "semicolon" => ';',
        "exclam" => '!',
        "question" => '?',
        "hyphen" | "minus" => '-',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "parenleft" => '(',
        "parenright" => ')',
        "bracketleft" => '[',
        "bracketright" => ']',
        "braceleft" => '{',
        "braceright" => '}',
        "slash" => '/',
        "backslash" => '\\',
        "quotesingle" => '\'',
        "quotedbl" => '"',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "ampersand" => '&',
        "percent" => '%',
        "plus" => '+',
        "equal" => '=',
        "less" => '<',
        "greater" => '>',
        "asterisk" => '*',
        "numbersign" => '#',
        "dollar" => '$',
        "at" => '@',
        "underscore" => '_',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "section" => '\u{00A7}',
        "paragraph" => '\u{00B6}',
        "degree" => '\u{00B0}',
        "multiply" => '\u{00D7}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "ff" => '\u{FB00}',
        "ffi" => '\u{FB03}',
        "ffl" => '\u{FB04}',
        "eacute" => '\u{00E9}',
        "egrave" => '\u{00E8}',
        "aacute" => '\u{00E1}',
        "agrave" => '\u{00E0}',
        "oacute" => '\u{00F3}',
        "iacute" => '\u{00ED}',
        "uacute" => '\u{00FA}',
        "ntilde" => '\u{00F1}',
        "ccedilla" => '\u{00E7}',
        "adieresis" => '\u{00E4}',
        "odieresis" => '\u{00F6}',
        "udieresis" => '\u{00FC}',
        "germandbls" => '\u{00DF}',
        _ => return None,
    };
    Some(ch)
}
