//! Label layout engine
//!
//! Produces a display list for one label page. Dimensions follow the Dymo
//! 30256 shipping label (4" x 2-5/16") printed landscape at 300 DPI.
//!
//! Every block of a section (name, rule, code, extra, timestamp) is measured
//! before anything is placed, so the whole stack can be centred vertically.
//! A tear-off label draws the same stack twice, once per half, with a
//! vertical divider between them.

use chrono::{DateTime, TimeZone};
use std::fmt;
use unicode_normalization::char::decompose_canonical;

use shared::LabelContent;

use crate::traits::LabelRenderer;

pub const LABEL_WIDTH: i32 = 1200;
pub const LABEL_HEIGHT: i32 = 696;
pub const DPI: u32 = 300;

/// Splits a tear-off label into the child half and the parent half
pub const DIVIDER_X: i32 = LABEL_WIDTH / 2;

const MARGIN: i32 = 20;
const DIVIDER_INSET: i32 = 10;
const RULE_WIDTH: i32 = 2;

const NAME_GAP: i32 = 25;
const RULE_GAP: i32 = 20;
const CODE_GAP: i32 = 15;
const EXTRA_GAP: i32 = 10;
const WRAPPED_LINE_GAP: i32 = 4;

/// Delimiter between names in the `extra` line
const EXTRA_DELIMITER: &str = ", ";

/// Which arrangement a label uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Full-width sticker, no divider
    Single,
    /// Two identical halves split by a divider
    TearOff,
}

impl Layout {
    /// Tear-off exactly when the label carries `extra` text
    pub fn for_content(content: &LabelContent) -> Self {
        if content.extra().is_some() {
            Layout::TearOff
        } else {
            Layout::Single
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Single => write!(f, "single"),
            Layout::TearOff => write!(f, "tear-off"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Font {
    pub size: i32,
    pub bold: bool,
}

impl Font {
    pub const NAME: Font = Font { size: 72, bold: true };
    pub const CODE: Font = Font { size: 60, bold: false };
    pub const EXTRA: Font = Font { size: 42, bold: false };
    pub const TIMESTAMP: Font = Font { size: 33, bold: false };

    /// Distance from the top of capital letters to the baseline
    pub fn cap_height(&self) -> i32 {
        self.size * 718 / 1000
    }

    pub fn descent(&self) -> i32 {
        self.size * 207 / 1000
    }
}

/// Gray levels, 0 is black and 255 is white
pub const INK: u8 = 0x00;
pub const RULE_GRAY: u8 = 0xCC;
pub const MUTED_GRAY: u8 = 0x88;

/// One drawing operation in page pixel coordinates (origin top-left)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOp {
    /// Text whose bounding box starts at (`x`, `y`)
    Text {
        x: i32,
        y: i32,
        text: String,
        font: Font,
        gray: u8,
    },
    /// Straight line between two points
    Rule {
        from: (i32, i32),
        to: (i32, i32),
        width: i32,
        gray: u8,
    },
}

/// A fully laid out label page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPage {
    pub width: i32,
    pub height: i32,
    pub layout: Layout,
    pub ops: Vec<DrawOp>,
}

impl RenderedPage {
    /// Text of every text operation, in drawing order
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::Rule { .. } => None,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextExtent {
    pub width: i32,
    pub height: i32,
}

/// Text measurement backend
pub trait TextMetrics: Send + Sync {
    fn measure(&self, text: &str, font: Font) -> TextExtent;
}

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 222, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths (1/1000 em) for ASCII 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 278, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

const FALLBACK_WIDTH: u16 = 556;
const DESCENDERS: &[char] = &['g', 'j', 'p', 'q', 'y', ',', ';'];

/// Advance of one character; accented letters take their base letter's width
fn advance(widths: &[u16; 95], c: char) -> u16 {
    let ascii = |c: char| (32..=126).contains(&(c as u32)).then(|| widths[(c as u32 - 32) as usize]);
    ascii(c)
        .or_else(|| {
            let mut base = None;
            decompose_canonical(c, |part| {
                base.get_or_insert(part);
            });
            base.and_then(ascii)
        })
        .unwrap_or(FALLBACK_WIDTH)
}

/// Metrics matching the Helvetica faces the PostScript output selects
#[derive(Clone, Copy, Debug, Default)]
pub struct HelveticaMetrics;

impl TextMetrics for HelveticaMetrics {
    fn measure(&self, text: &str, font: Font) -> TextExtent {
        if text.is_empty() {
            return TextExtent { width: 0, height: 0 };
        }

        let widths = if font.bold { &HELVETICA_BOLD_WIDTHS } else { &HELVETICA_WIDTHS };
        let units: i64 = text.chars().map(|c| i64::from(advance(widths, c))).sum();

        let mut height = font.cap_height();
        if text.contains(DESCENDERS) {
            height += font.descent();
        }

        TextExtent {
            width: (units * i64::from(font.size) / 1000) as i32,
            height,
        }
    }
}

/// Format the time printed at the bottom of every label
pub fn label_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.format("%a %b %d, %Y  %I:%M %p").to_string()
}

#[derive(Clone, Debug)]
enum RowKind {
    Text { text: String, font: Font, gray: u8 },
    Rule,
}

/// A measured block of the vertical stack
#[derive(Clone, Debug)]
struct Row {
    kind: RowKind,
    extent: TextExtent,
    gap_after: i32,
}

/// Label layout engine, the default [`LabelRenderer`]
#[derive(Clone, Debug, Default)]
pub struct LabelLayout<M = HelveticaMetrics> {
    metrics: M,
}

impl LabelLayout<HelveticaMetrics> {
    pub fn new() -> Self {
        Self {
            metrics: HelveticaMetrics,
        }
    }
}

impl<M: TextMetrics> LabelLayout<M> {
    /// Use a different text measurement backend
    pub fn with_metrics(metrics: M) -> Self {
        Self { metrics }
    }

    fn text_row(&self, text: &str, font: Font, gray: u8, gap_after: i32) -> Row {
        Row {
            extent: self.metrics.measure(text, font),
            kind: RowKind::Text {
                text: text.to_string(),
                font,
                gray,
            },
            gap_after,
        }
    }

    /// Measure the stack for one section of `width` pixels
    fn stack(&self, content: &LabelContent, timestamp: &str, width: i32, layout: Layout) -> Vec<Row> {
        let mut rows = vec![
            self.text_row(&content.name, Font::NAME, INK, NAME_GAP),
            Row {
                kind: RowKind::Rule,
                extent: TextExtent {
                    width: width - 2 * MARGIN,
                    height: RULE_WIDTH,
                },
                gap_after: RULE_GAP,
            },
        ];

        if let Some(code) = content.code() {
            rows.push(self.text_row(code, Font::CODE, INK, CODE_GAP));
        }

        if layout == Layout::TearOff {
            if let Some(extra) = content.extra() {
                rows.extend(self.extra_rows(extra, width - 2 * MARGIN));
            }
        }

        rows.push(self.text_row(timestamp, Font::TIMESTAMP, MUTED_GRAY, 0));
        rows
    }

    /// One line when it fits, otherwise one line per delimited fragment
    fn extra_rows(&self, extra: &str, max_width: i32) -> Vec<Row> {
        let single = self.text_row(extra, Font::EXTRA, INK, EXTRA_GAP);
        if single.extent.width <= max_width {
            return vec![single];
        }

        let mut rows: Vec<Row> = extra
            .split(EXTRA_DELIMITER)
            .map(|fragment| self.text_row(fragment, Font::EXTRA, INK, WRAPPED_LINE_GAP))
            .collect();
        if let Some(last) = rows.last_mut() {
            last.gap_after += EXTRA_GAP;
        }
        rows
    }

    /// Place a measured stack centred within one section
    fn draw_section(&self, ops: &mut Vec<DrawOp>, x_offset: i32, width: i32, rows: Vec<Row>) {
        let center_x = x_offset + width / 2;
        let content_height: i32 = rows.iter().map(|row| row.extent.height + row.gap_after).sum();
        let mut y = MARGIN.max((LABEL_HEIGHT - content_height) / 2);

        for row in rows {
            match row.kind {
                RowKind::Text { text, font, gray } => ops.push(DrawOp::Text {
                    x: center_x - row.extent.width / 2,
                    y,
                    text,
                    font,
                    gray,
                }),
                RowKind::Rule => ops.push(DrawOp::Rule {
                    from: (x_offset + MARGIN, y),
                    to: (x_offset + width - MARGIN, y),
                    width: RULE_WIDTH,
                    gray: RULE_GRAY,
                }),
            }
            y += row.extent.height + row.gap_after;
        }
    }
}

impl<M: TextMetrics> LabelRenderer for LabelLayout<M> {
    fn render(&self, content: &LabelContent, timestamp: &str, layout: Layout) -> RenderedPage {
        let mut ops = Vec::new();

        match layout {
            Layout::Single => {
                let rows = self.stack(content, timestamp, LABEL_WIDTH, layout);
                self.draw_section(&mut ops, 0, LABEL_WIDTH, rows);
            }
            Layout::TearOff => {
                let half_width = DIVIDER_X;
                let rows = self.stack(content, timestamp, half_width, layout);
                self.draw_section(&mut ops, 0, half_width, rows.clone());
                ops.push(DrawOp::Rule {
                    from: (DIVIDER_X, DIVIDER_INSET),
                    to: (DIVIDER_X, LABEL_HEIGHT - DIVIDER_INSET),
                    width: RULE_WIDTH,
                    gray: RULE_GRAY,
                });
                self.draw_section(&mut ops, DIVIDER_X, half_width, rows);
            }
        }

        RenderedPage {
            width: LABEL_WIDTH,
            height: LABEL_HEIGHT,
            layout,
            ops,
        }
    }
}
