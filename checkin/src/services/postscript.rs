//! PostScript encoding of rendered label pages
//!
//! Pages are laid out in 300 DPI pixels with the origin at the top left.
//! The document scales them to points and flips the y axis, so the spooler
//! receives one multi-page job at the physical label size.

use std::fmt::{self, Write};
use unicode_normalization::char::{compose, decompose_canonical};

use shared::checkin_warn;
use shared::logging::Component;

use crate::core::layout::{DPI, DrawOp, Font, LABEL_HEIGHT, LABEL_WIDTH, RenderedPage};

const POINTS_PER_INCH: f64 = 72.0;

/// Page width and height in points
pub fn page_size_points() -> (f64, f64) {
    let scale = POINTS_PER_INCH / f64::from(DPI);
    (f64::from(LABEL_WIDTH) * scale, f64::from(LABEL_HEIGHT) * scale)
}

fn font_name(font: Font) -> &'static str {
    if font.bold { "/Sans-Bold" } else { "/Sans" }
}

fn gray_level(gray: u8) -> String {
    format!("{:.3}", f64::from(gray) / 255.0)
}

/// Escape text for a PostScript string literal in ISO Latin-1
///
/// Characters outside Latin-1 print as `?`. [`write_text`] sends them as
/// named glyphs instead.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(escaped, "\\{:03o}", c as u32);
            }
            _ => escaped.push('?'),
        }
    }
    escaped
}

fn is_latin1(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}')
}

/// Glyph names the standard Helvetica character set carries outside Latin-1
const STANDARD_GLYPHS: &[(char, &str)] = &[
    ('\u{131}', "dotlessi"),
    ('\u{141}', "Lslash"),
    ('\u{142}', "lslash"),
    ('\u{152}', "OE"),
    ('\u{153}', "oe"),
    ('\u{160}', "Scaron"),
    ('\u{161}', "scaron"),
    ('\u{178}', "Ydieresis"),
    ('\u{17d}', "Zcaron"),
    ('\u{17e}', "zcaron"),
    ('\u{192}', "florin"),
    ('\u{2013}', "endash"),
    ('\u{2014}', "emdash"),
    ('\u{2018}', "quoteleft"),
    ('\u{2019}', "quoteright"),
    ('\u{201a}', "quotesinglbase"),
    ('\u{201c}', "quotedblleft"),
    ('\u{201d}', "quotedblright"),
    ('\u{201e}', "quotedblbase"),
    ('\u{2022}', "bullet"),
    ('\u{2026}', "ellipsis"),
    ('\u{20ac}', "Euro"),
    ('\u{2122}', "trademark"),
];

/// Letters with no canonical decomposition and their plain Latin stand-in
const STROKE_LETTERS: &[(char, char)] = &[
    ('\u{110}', 'D'),
    ('\u{111}', 'd'),
    ('\u{126}', 'H'),
    ('\u{127}', 'h'),
    ('\u{131}', 'i'),
    ('\u{141}', 'L'),
    ('\u{142}', 'l'),
    ('\u{192}', 'f'),
    ('\u{2013}', '-'),
    ('\u{2014}', '-'),
    ('\u{2018}', '\''),
    ('\u{2019}', '\''),
    ('\u{201a}', ','),
    ('\u{201c}', '"'),
    ('\u{201d}', '"'),
    ('\u{201e}', '"'),
    ('\u{2022}', '\u{b7}'),
];

/// PostScript glyph name for a character
pub fn glyph_name(c: char) -> String {
    if let Some((_, name)) = STANDARD_GLYPHS.iter().find(|(glyph, _)| *glyph == c) {
        return (*name).to_string();
    }
    let code = c as u32;
    if code <= 0xffff {
        format!("uni{code:04X}")
    } else {
        format!("u{code:X}")
    }
}

/// Closest Latin-1 character, if any
///
/// Accented letters keep the first accent when Latin-1 has that
/// combination (`ễ` becomes `ê`), otherwise they lose their accents.
pub fn latin1_fallback(c: char) -> Option<char> {
    if is_latin1(c) {
        return Some(c);
    }
    if let Some((_, plain)) = STROKE_LETTERS.iter().find(|(letter, _)| *letter == c) {
        return Some(*plain);
    }

    let mut parts = Vec::new();
    decompose_canonical(c, |part| parts.push(part));
    let (&base, marks) = parts.split_first()?;
    if base == c || !is_latin1(base) {
        return None;
    }

    let accented = marks
        .first()
        .and_then(|&mark| compose(base, mark))
        .filter(|&composed| is_latin1(composed));
    Some(accented.unwrap_or(base))
}

/// Text as printed by a printer whose fonts only cover Latin-1
pub fn latin1_approximation(text: &str) -> String {
    text.chars().map(|c| latin1_fallback(c).unwrap_or('?')).collect()
}

/// Emit the show operators for one line of text
///
/// Latin-1 runs are shown directly. Every other character is shown by
/// glyph name when the font has it and by its Latin-1 fallback otherwise.
pub fn write_text(out: &mut String, text: &str) -> fmt::Result {
    let mut run = String::new();
    let mut separator = "";

    for c in text.chars() {
        if is_latin1(c) {
            run.push(c);
            continue;
        }
        if !run.is_empty() {
            write!(out, "{separator}({}) show", escape_text(&run))?;
            run.clear();
            separator = " ";
        }
        let fallback = latin1_fallback(c).unwrap_or('?').to_string();
        write!(out, "{separator}({}) /{} gshow", escape_text(&fallback), glyph_name(c))?;
        separator = " ";
    }

    if !run.is_empty() || separator.is_empty() {
        write!(out, "{separator}({}) show", escape_text(&run))?;
    }
    Ok(())
}

fn warn_on_missing_glyphs(text: &str) {
    if text.chars().all(is_latin1) {
        return;
    }
    let printed_as = latin1_approximation(text);
    if text.chars().any(|c| latin1_fallback(c).is_none()) {
        checkin_warn!(
            Component::Printer,
            text = %text,
            printed_as = %printed_as,
            "Label text has characters with no Latin-1 fallback"
        );
    } else {
        checkin_warn!(
            Component::Printer,
            text = %text,
            printed_as = %printed_as,
            "Label text needs glyphs outside Latin-1, printers without them print the fallback"
        );
    }
}

fn write_prolog(out: &mut String, page_count: usize) -> fmt::Result {
    let (width, height) = page_size_points();
    writeln!(out, "%!PS-Adobe-3.0")?;
    writeln!(out, "%%Creator: checkin")?;
    writeln!(out, "%%Pages: {page_count}")?;
    writeln!(out, "%%BoundingBox: 0 0 {} {}", width.ceil(), height.ceil())?;
    writeln!(out, "%%EndComments")?;
    writeln!(out, "%%BeginProlog")?;
    writeln!(out, "/reencode {{")?;
    writeln!(out, "  findfont dup length dict begin")?;
    writeln!(out, "    {{ 1 index /FID ne {{ def }} {{ pop pop }} ifelse }} forall")?;
    writeln!(out, "    /Encoding ISOLatin1Encoding def")?;
    writeln!(out, "    currentdict")?;
    writeln!(out, "  end")?;
    writeln!(out, "  definefont pop")?;
    writeln!(out, "}} bind def")?;
    writeln!(out, "/Sans /Helvetica reencode")?;
    writeln!(out, "/Sans-Bold /Helvetica-Bold reencode")?;
    writeln!(out, "% (fallback) /glyph gshow")?;
    writeln!(out, "/gshow {{")?;
    writeln!(out, "  currentfont dup /CharStrings known")?;
    writeln!(out, "  {{ /CharStrings get 1 index known }} {{ pop false }} ifelse")?;
    writeln!(out, "  {{ exch pop glyphshow }} {{ pop show }} ifelse")?;
    writeln!(out, "}} bind def")?;
    writeln!(out, "%%EndProlog")
}

fn write_page(out: &mut String, number: usize, page: &RenderedPage) -> fmt::Result {
    let (width, height) = page_size_points();
    let scale = POINTS_PER_INCH / f64::from(DPI);

    writeln!(out, "%%Page: {number} {number}")?;
    writeln!(out, "<< /PageSize [{width:.2} {height:.2}] >> setpagedevice")?;
    writeln!(out, "gsave")?;
    writeln!(out, "{scale} {scale} scale")?;

    for op in &page.ops {
        match op {
            DrawOp::Text { x, y, text, font, gray } => {
                let baseline = page.height - (y + font.cap_height());
                writeln!(out, "{} setgray", gray_level(*gray))?;
                writeln!(out, "{} findfont {} scalefont setfont", font_name(*font), font.size)?;
                warn_on_missing_glyphs(text);
                write!(out, "{x} {baseline} moveto ")?;
                write_text(out, text)?;
                writeln!(out)?;
            }
            DrawOp::Rule { from, to, width, gray } => {
                writeln!(out, "{} setgray {width} setlinewidth", gray_level(*gray))?;
                writeln!(
                    out,
                    "{} {} moveto {} {} lineto stroke",
                    from.0,
                    page.height - from.1,
                    to.0,
                    page.height - to.1
                )?;
            }
        }
    }

    writeln!(out, "grestore")?;
    writeln!(out, "showpage")
}

fn write_document(out: &mut String, pages: &[RenderedPage]) -> fmt::Result {
    write_prolog(out, pages.len())?;
    for (index, page) in pages.iter().enumerate() {
        write_page(out, index + 1, page)?;
    }
    writeln!(out, "%%EOF")
}

/// Encode all pages as one PostScript document
pub fn encode_document(pages: &[RenderedPage]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_document(&mut out, pages);
    out
}
