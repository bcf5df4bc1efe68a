use std::fmt;

use crate::PdfError;

/// A page's MediaBox in PDF user space (bottom-left origin).
///
/// Everything this crate hands out is in *page space* instead: origin at the
/// top-left corner of the box, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    /// Build from two opposite corners in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// User space to page space.
    pub fn to_page_space(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.llx, self.ury - y)
    }

    /// Page space to user space.
    pub fn to_user_space(&self, x: f32, y: f32) -> (f32, f32) {
        (x + self.llx, self.ury - y)
    }
}

/// A run of text positioned at its baseline origin, in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
    /// Distance the glyphs are raised above `y` by text rise; negative for
    /// subscripts.
    pub rise: f32,
}

impl TextSpan {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// A line of text: spans sharing a baseline with no column-sized gap between
/// them, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl TextLine {
    /// Concatenate all span texts with a single space separator.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Baseline of the first span.
    pub fn baseline(&self) -> f32 {
        self.spans.first().map(|s| s.y).unwrap_or(self.y1)
    }
}

/// The extracted text of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: u32,
    pub page_box: PageBox,
    pub lines: Vec<TextLine>,
}

/// The PDF base-14 fonts, addressable by their short names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl StandardFont {
    const ALL: [StandardFont; 14] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaOblique,
        StandardFont::HelveticaBoldOblique,
        StandardFont::TimesRoman,
        StandardFont::TimesBold,
        StandardFont::TimesItalic,
        StandardFont::TimesBoldItalic,
        StandardFont::Courier,
        StandardFont::CourierBold,
        StandardFont::CourierOblique,
        StandardFont::CourierBoldOblique,
        StandardFont::Symbol,
        StandardFont::ZapfDingbats,
    ];

    /// Four-letter short name, also used as the page resource key.
    pub fn short_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "helv",
            StandardFont::HelveticaBold => "hebo",
            StandardFont::HelveticaOblique => "heit",
            StandardFont::HelveticaBoldOblique => "hebi",
            StandardFont::TimesRoman => "tiro",
            StandardFont::TimesBold => "tibo",
            StandardFont::TimesItalic => "tiit",
            StandardFont::TimesBoldItalic => "tibi",
            StandardFont::Courier => "cour",
            StandardFont::CourierBold => "cobo",
            StandardFont::CourierOblique => "coit",
            StandardFont::CourierBoldOblique => "cobi",
            StandardFont::Symbol => "symb",
            StandardFont::ZapfDingbats => "zadb",
        }
    }

    /// The `/BaseFont` name.
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
            StandardFont::Symbol => "Symbol",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Symbolic fonts have their own built-in encoding.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, StandardFont::Symbol | StandardFont::ZapfDingbats)
    }

    /// Accepts a short name (`helv`) or a base font name (`Helvetica`),
    /// case-insensitively.
    pub fn parse(name: &str) -> Result<Self, PdfError> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| {
                f.short_name().eq_ignore_ascii_case(wanted)
                    || f.base_font().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| PdfError::UnknownFont(name.to_string()))
    }
}

impl fmt::Display for StandardFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_font())
    }
}

/// How inserted text is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub font_size: f32,
    /// RGB fill color, each channel in `0.0..=1.0`.
    pub color: [f32; 3],
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            font_size: 8.0,
            color: [0.5, 0.5, 0.5],
        }
    }
}
