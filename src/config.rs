// report-pdf: Layout configuration

use crate::error::{ReportError, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Constants
// ============================================================================

/// A3 landscape dimensions in mm
pub const PAGE_WIDTH_MM: f32 = 420.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Margins
pub const MARGIN_MM: f32 = 10.0;

/// Space kept free at the bottom of every page for the footer line
pub const FOOTER_SPACE_MM: f32 = 8.0;

/// Font sizes in mm
pub const STANDARD_FONT_SIZE_MM: f32 = 3.2;
pub const NUMERIC_FONT_SIZE_MM: f32 = 3.6;
pub const HEADER_FONT_SIZE_MM: f32 = 3.0;
pub const FOOTER_FONT_SIZE_MM: f32 = 2.8;

pub const LINE_HEIGHT_FACTOR: f32 = 1.25;

/// Cell padding (per side)
pub const PADDING_X_MM: f32 = 1.5;
pub const PADDING_Y_MM: f32 = 1.2;

/// Numbered circle: diameter = font size * ratio
pub const CIRCLE_RATIO: f32 = 2.0;
pub const CIRCLE_PADDING_MM: f32 = 2.5;

pub const MIN_ROW_HEIGHT_MM: f32 = 8.0;
pub const MIN_HEADER_ROW_MM: f32 = 7.0;

/// Columns in the canonical report schema
pub const CANONICAL_COLUMN_COUNT: usize = 13;

/// First column of the trailing numeric range
pub const NUMERIC_COLUMNS_START: usize = 7;

/// Narrow text column that is left-aligned
pub const LEFT_ALIGNED_COLUMN: usize = 4;

/// Merged header group (first, last)
pub const GROUP_FIRST_COLUMN: usize = 8;
pub const GROUP_LAST_COLUMN: usize = 9;
pub const GROUP_LABEL: &str = "в том числе";

/// Index cell value replaced by the row's sequence number
pub const INDEX_PLACEHOLDER: &str = "#";

/// Payloads smaller than this are treated as broken font downloads
pub const MIN_FONT_BYTES: usize = 10_000;

pub const DEFAULT_REGULAR_FONT_SOURCES: &[&str] = &[
    "https://github.com/google/fonts/raw/main/ofl/ptsans/PT_Sans-Web-Regular.ttf",
    "https://cdn.jsdelivr.net/gh/google/fonts@main/ofl/ptsans/PT_Sans-Web-Regular.ttf",
    "https://raw.githubusercontent.com/google/fonts/main/ofl/ptsans/PT_Sans-Web-Regular.ttf",
];

pub const DEFAULT_BOLD_FONT_SOURCES: &[&str] = &[
    "https://github.com/google/fonts/raw/main/ofl/ptsans/PT_Sans-Web-Bold.ttf",
    "https://cdn.jsdelivr.net/gh/google/fonts@main/ofl/ptsans/PT_Sans-Web-Bold.ttf",
    "https://raw.githubusercontent.com/google/fonts/main/ofl/ptsans/PT_Sans-Web-Bold.ttf",
];

// ============================================================================
// Style Primitives
// ============================================================================

/// RGB color, 0-255 per channel.
///
/// Deserializes from `"#RRGGBB"` or `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RgbRepr")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Channels scaled to 0.0-1.0
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RgbRepr {
    Hex(String),
    Channels([u8; 3]),
}

impl TryFrom<RgbRepr> for Rgb {
    type Error = String;

    fn try_from(value: RgbRepr) -> std::result::Result<Self, Self::Error> {
        match value {
            RgbRepr::Hex(s) => Rgb::from_hex(&s).ok_or_else(|| format!("invalid color '{}'", s)),
            RgbRepr::Channels([r, g, b]) => Ok(Rgb::new(r, g, b)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    #[serde(alias = "normal")]
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

/// What a column holds, which drives its default styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    /// Leading column with the numbered circle
    Index,
    Text,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStyle {
    pub role: ColumnRole,
    pub align: Align,
    pub font_size_mm: f32,
    pub font_weight: FontWeight,
}

impl ColumnStyle {
    pub fn text() -> Self {
        Self {
            role: ColumnRole::Text,
            align: Align::Center,
            font_size_mm: STANDARD_FONT_SIZE_MM,
            font_weight: FontWeight::Regular,
        }
    }

    pub fn numeric() -> Self {
        Self {
            role: ColumnRole::Numeric,
            font_size_mm: NUMERIC_FONT_SIZE_MM,
            ..Self::text()
        }
    }

    pub fn index() -> Self {
        Self {
            role: ColumnRole::Index,
            ..Self::text()
        }
    }
}

/// Per-column default styles, indexed by column position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ColumnStyles(pub Vec<ColumnStyle>);

impl ColumnStyles {
    /// The 13-column municipal report schema
    pub fn canonical() -> Self {
        let styles = (0..CANONICAL_COLUMN_COUNT)
            .map(|i| match i {
                0 => ColumnStyle::index(),
                LEFT_ALIGNED_COLUMN => ColumnStyle {
                    align: Align::Left,
                    ..ColumnStyle::text()
                },
                i if i >= NUMERIC_COLUMNS_START => ColumnStyle::numeric(),
                _ => ColumnStyle::text(),
            })
            .collect();
        Self(styles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Style for a column, plain text style past the end of the table
    pub fn get(&self, index: usize) -> ColumnStyle {
        self.0.get(index).cloned().unwrap_or_else(ColumnStyle::text)
    }
}

impl Default for ColumnStyles {
    fn default() -> Self {
        Self::canonical()
    }
}

// ============================================================================
// Configuration Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    pub footer_space_mm: f32,
}

impl PageGeometry {
    /// Width available to the column grid
    pub fn content_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    /// Lowest y a row may reach before a page break
    pub fn body_bottom(&self) -> f32 {
        self.height_mm - self.margin_mm - self.footer_space_mm
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width_mm: PAGE_WIDTH_MM,
            height_mm: PAGE_HEIGHT_MM,
            margin_mm: MARGIN_MM,
            footer_space_mm: FOOTER_SPACE_MM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizingRules {
    pub line_height_factor: f32,
    pub padding_x_mm: f32,
    pub padding_y_mm: f32,
    pub circle_ratio: f32,
    pub circle_padding_mm: f32,
    pub min_row_height_mm: f32,
    pub min_header_row_mm: f32,
    pub header_font_size_mm: f32,
    pub footer_font_size_mm: f32,
}

impl Default for SizingRules {
    fn default() -> Self {
        Self {
            line_height_factor: LINE_HEIGHT_FACTOR,
            padding_x_mm: PADDING_X_MM,
            padding_y_mm: PADDING_Y_MM,
            circle_ratio: CIRCLE_RATIO,
            circle_padding_mm: CIRCLE_PADDING_MM,
            min_row_height_mm: MIN_ROW_HEIGHT_MM,
            min_header_row_mm: MIN_HEADER_ROW_MM,
            header_font_size_mm: HEADER_FONT_SIZE_MM,
            footer_font_size_mm: FOOTER_FONT_SIZE_MM,
        }
    }
}

/// Columns sharing one spanning header cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderGroup {
    pub first: usize,
    pub last: usize,
    pub label: String,
}

impl HeaderGroup {
    pub fn contains(&self, column: usize) -> bool {
        (self.first..=self.last).contains(&column)
    }
}

impl Default for HeaderGroup {
    fn default() -> Self {
        Self {
            first: GROUP_FIRST_COLUMN,
            last: GROUP_LAST_COLUMN,
            label: GROUP_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palette {
    pub header_fill: Rgb,
    pub header_text: Rgb,
    pub stripe_fill: Rgb,
    pub body_fill: Rgb,
    pub body_text: Rgb,
    pub total_fill: Rgb,
    pub total_text: Rgb,
    pub circle_fill: Rgb,
    pub circle_text: Rgb,
    pub grid_line: Rgb,
    pub footer_text: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            header_fill: Rgb::new(0xDC, 0xE6, 0xF1),
            header_text: Rgb::BLACK,
            stripe_fill: Rgb::new(0xF3, 0xF6, 0xFA),
            body_fill: Rgb::WHITE,
            body_text: Rgb::BLACK,
            total_fill: Rgb::new(0x1F, 0x4E, 0x79),
            total_text: Rgb::WHITE,
            circle_fill: Rgb::new(0x2E, 0x75, 0xB6),
            circle_text: Rgb::WHITE,
            grid_line: Rgb::new(0x99, 0x99, 0x99),
            footer_text: Rgb::new(0x55, 0x55, 0x55),
        }
    }
}

/// Ordered font source lists; the first usable source wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSources {
    pub regular: Vec<String>,
    pub bold: Vec<String>,
    pub min_bytes: usize,
}

impl Default for FontSources {
    fn default() -> Self {
        Self {
            regular: DEFAULT_REGULAR_FONT_SOURCES.iter().map(|s| s.to_string()).collect(),
            bold: DEFAULT_BOLD_FONT_SOURCES.iter().map(|s| s.to_string()).collect(),
            min_bytes: MIN_FONT_BYTES,
        }
    }
}

/// Everything the layout and rendering passes need besides the document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub page: PageGeometry,
    pub sizing: SizingRules,
    pub columns: ColumnStyles,
    pub header_group: HeaderGroup,
    pub palette: Palette,
    pub fonts: FontSources,
    pub index_placeholder: IndexPlaceholder,
}

/// Wrapper so a partial config file still gets the `#` default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct IndexPlaceholder(pub String);

impl Default for IndexPlaceholder {
    fn default() -> Self {
        Self(INDEX_PLACEHOLDER.to_string())
    }
}

impl LayoutConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ReportError::ConfigError(format!("Invalid JSON: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReportError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }
}
