//! Text measurement and line wrapping.
//!
//! Layout only needs to know how wide a string is for a weight and size; the
//! greedy wrapper on top of that decides line breaks. Break opportunities are
//! plain spaces and hyphens inside words. Non-breaking spaces, non-breaking
//! hyphens and word joiners inserted by the typography pass never break.

use crate::config::FontWeight;
use crate::error::{ReportError, Result};
use crate::fonts::ResolvedFonts;
use crate::typography::display_text;

/// Advance used for characters the font has no glyph for, in em
const FALLBACK_ADVANCE_EM: f32 = 0.55;

/// Trait for text measurement operations
pub trait TextMetrics {
    /// Width in mm of one line of display text at `font_size_mm`
    fn text_width(&self, text: &str, weight: FontWeight, font_size_mm: f32) -> f32;

    /// Reflow normalized text into lines no wider than `max_width_mm`
    fn wrap(&self, text: &str, weight: FontWeight, font_size_mm: f32, max_width_mm: f32) -> Vec<TextLine> {
        wrap_text(self, text, weight, font_size_mm, max_width_mm)
    }
}

/// One wrapped line, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Display text (layout marks already removed)
    pub text: String,
    /// Measured width in mm
    pub width: f32,
}

// ============================================================================
// Line Wrapping
// ============================================================================

pub fn wrap_text<M: TextMetrics + ?Sized>(
    metrics: &M,
    text: &str,
    weight: FontWeight,
    font_size_mm: f32,
    max_width_mm: f32,
) -> Vec<TextLine> {
    if text.is_empty() {
        return Vec::new();
    }

    let width_of = |raw: &str| metrics.text_width(&display_text(raw.trim_end_matches([' ', '\t'])), weight, font_size_mm);
    let finish = |raw: &str| {
        let text = display_text(raw.trim_end_matches([' ', '\t']));
        let width = metrics.text_width(&text, weight, font_size_mm);
        TextLine { text, width }
    };

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut line = String::new();

        for segment in break_segments(paragraph) {
            let candidate = format!("{}{}", line, segment);
            if line.is_empty() || width_of(&candidate) <= max_width_mm {
                line = candidate;
            } else {
                lines.push(finish(&line));
                line = segment;
            }

            // a single unbreakable run wider than the box is split by characters
            while width_of(&line) > max_width_mm {
                let split = longest_fitting_prefix(&line, max_width_mm, &width_of);
                if split >= line.len() {
                    break;
                }
                lines.push(finish(&line[..split]));
                line = line[split..].to_string();
            }
        }

        lines.push(finish(&line));
    }
    lines
}

/// Pieces of a paragraph, each ending where a line may break.
fn break_segments(paragraph: &str) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let next = chars.get(i + 1).copied();
        let breaks_after = match c {
            ' ' | '\t' => !matches!(next, Some(' ' | '\t')),
            '-' => {
                i > 0 && chars[i - 1].is_alphabetic() && next.is_some_and(|n| n.is_alphabetic())
            }
            _ => false,
        };
        if breaks_after {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Byte offset of the longest prefix that fits, at least one character.
fn longest_fitting_prefix<F>(line: &str, max_width_mm: f32, width_of: &F) -> usize
where
    F: Fn(&str) -> f32,
{
    let mut boundaries = line.char_indices().map(|(i, _)| i).skip(1).chain(std::iter::once(line.len()));
    let mut best = boundaries.next().unwrap_or(line.len());
    for end in boundaries {
        if width_of(&line[..end]) > max_width_mm {
            break;
        }
        best = end;
    }
    best
}

// ============================================================================
// TrueType Metrics
// ============================================================================

/// Advance widths read from the two resolved TrueType fonts. Both faces are
/// parsed once and borrow the font bytes.
pub struct TtfMetrics<'a> {
    regular: FaceData<'a>,
    bold: FaceData<'a>,
}

struct FaceData<'a> {
    face: ttf_parser::Face<'a>,
    units_per_em: f32,
}

impl<'a> FaceData<'a> {
    fn parse(bytes: &'a [u8], variant: &str) -> Result<Self> {
        let face = ttf_parser::Face::parse(bytes, 0)
            .map_err(|e| ReportError::FontParse(format!("{} font: {}", variant, e)))?;
        let units_per_em = face.units_per_em() as f32;
        Ok(Self { face, units_per_em })
    }

    fn width_mm(&self, text: &str, font_size_mm: f32) -> f32 {
        text.chars()
            .map(|c| {
                self.face
                    .glyph_index(c)
                    .and_then(|gid| self.face.glyph_hor_advance(gid))
                    .map(|advance| advance as f32 / self.units_per_em * font_size_mm)
                    .unwrap_or(FALLBACK_ADVANCE_EM * font_size_mm)
            })
            .sum()
    }
}

impl<'a> TtfMetrics<'a> {
    pub fn new(fonts: &'a ResolvedFonts) -> Result<Self> {
        Ok(Self {
            regular: FaceData::parse(&fonts.regular, "regular")?,
            bold: FaceData::parse(&fonts.bold, "bold")?,
        })
    }
}

impl TextMetrics for TtfMetrics<'_> {
    fn text_width(&self, text: &str, weight: FontWeight, font_size_mm: f32) -> f32 {
        match weight {
            FontWeight::Regular => self.regular.width_mm(text, font_size_mm),
            FontWeight::Bold => self.bold.width_mm(text, font_size_mm),
        }
    }
}

impl std::fmt::Debug for TtfMetrics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfMetrics")
            .field("regular_glyphs", &self.regular.face.number_of_glyphs())
            .field("bold_glyphs", &self.bold.face.number_of_glyphs())
            .finish()
    }
}

// ============================================================================
// Fixed-Width Metrics
// ============================================================================

/// Every character gets the same advance. Deterministic, font-free layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthMetrics {
    /// Advance per character in em
    pub advance_em: f32,
    /// Width multiplier for bold text
    pub bold_factor: f32,
}

impl Default for FixedWidthMetrics {
    fn default() -> Self {
        Self {
            advance_em: 0.5,
            bold_factor: 1.1,
        }
    }
}

impl TextMetrics for FixedWidthMetrics {
    fn text_width(&self, text: &str, weight: FontWeight, font_size_mm: f32) -> f32 {
        let factor = match weight {
            FontWeight::Regular => 1.0,
            FontWeight::Bold => self.bold_factor,
        };
        text.chars().count() as f32 * self.advance_em * font_size_mm * factor
    }
}
