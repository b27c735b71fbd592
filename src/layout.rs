//! Page layout: column geometry, the two-level header, row placement and
//! page breaks.
//!
//! All coordinates are millimetres from the top-left corner of the sheet.
//! The engine reads the document and produces a [`LayoutPlan`]; nothing in
//! the plan is shared between render calls.

use crate::config::{Align, FontWeight, LayoutConfig, Rgb};
use crate::document::{Column, Document};
use crate::metrics::{TextLine, TextMetrics};
use crate::sizing::{CellBlock, RowMeasure, RowSizer};
use crate::typography::normalize;

/// Baseline position inside a line box, as a fraction of the font size
const BASELINE_RATIO: f32 = 0.8;

// ============================================================================
// Layout Output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A run of text at its final position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub font_size_mm: f32,
    pub weight: FontWeight,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCircle {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalCell {
    pub bounds: Bounds,
    pub fill: Rgb,
    pub texts: Vec<PlacedText>,
    pub circle: Option<PlacedCircle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Body row with its 1-based number among non-total rows
    Body { sequence: usize, striped: bool },
    Total,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalRow {
    /// Position of the row in the document
    pub source_index: usize,
    pub kind: RowKind,
    pub y: f32,
    pub height: f32,
    pub cells: Vec<PhysicalCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub top: f32,
    pub height: f32,
    pub cells: Vec<PhysicalCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub left: PlacedText,
    pub right: PlacedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalPage {
    /// 1-based page number
    pub number: usize,
    pub header: HeaderBlock,
    pub rows: Vec<PhysicalRow>,
    pub footer: Option<Footer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub page_width: f32,
    pub page_height: f32,
    pub column_x: Vec<f32>,
    pub column_widths: Vec<f32>,
    pub pages: Vec<PhysicalPage>,
}

// ============================================================================
// Engine
// ============================================================================

enum Phase {
    EmitHeader,
    PlaceRows,
    PageBreak,
    Done,
}

pub struct PageLayoutEngine<'a, M: ?Sized> {
    metrics: &'a M,
    sizer: RowSizer<'a, M>,
    config: &'a LayoutConfig,
}

/// Physical column widths from percentages of the content width.
pub fn resolve_column_widths(columns: &[Column], content_width: f32) -> Vec<f32> {
    columns
        .iter()
        .map(|c| content_width * c.width / 100.0)
        .collect()
}

impl<'a, M: TextMetrics + ?Sized> PageLayoutEngine<'a, M> {
    pub fn new(metrics: &'a M, config: &'a LayoutConfig) -> Self {
        Self {
            metrics,
            sizer: RowSizer::new(metrics, config),
            config,
        }
    }

    /// Lay out the whole document. `footer_note` is printed at the bottom
    /// left of every page.
    ///
    /// The document must already satisfy [`Document::validate`].
    pub fn layout(&self, document: &Document, footer_note: &str) -> LayoutPlan {
        let page = &self.config.page;
        let column_widths = resolve_column_widths(&document.columns, page.content_width());
        let column_x: Vec<f32> = column_widths
            .iter()
            .scan(page.margin_mm, |x, w| {
                let start = *x;
                *x += w;
                Some(start)
            })
            .collect();

        let header = self.layout_header(&document.columns, &column_x, &column_widths);
        let bottom = page.body_bottom();

        let mut pages: Vec<PhysicalPage> = Vec::new();
        let mut phase = Phase::EmitHeader;
        let mut next_row = 0;
        let mut body_count = 0;
        let mut y = page.margin_mm;
        let mut pending: Option<RowMeasure> = None;

        loop {
            match phase {
                Phase::EmitHeader => {
                    pages.push(PhysicalPage {
                        number: pages.len() + 1,
                        header: header.clone(),
                        rows: Vec::new(),
                        footer: None,
                    });
                    y = page.margin_mm + header.height;
                    phase = Phase::PlaceRows;
                }
                Phase::PlaceRows => {
                    let Some(row) = document.rows.get(next_row) else {
                        phase = Phase::Done;
                        continue;
                    };
                    let Some(current) = pages.last_mut() else {
                        phase = Phase::EmitHeader;
                        continue;
                    };

                    let sequence = (!row.is_total).then_some(body_count + 1);
                    let measure = pending
                        .take()
                        .unwrap_or_else(|| self.sizer.layout_row(row, &column_widths, sequence));

                    // an empty page takes the row even when it overflows
                    if y + measure.height > bottom && !current.rows.is_empty() {
                        log::debug!(
                            "Row {} ({:.1} mm) does not fit at y={:.1} on page {}",
                            next_row,
                            measure.height,
                            y,
                            current.number
                        );
                        pending = Some(measure);
                        phase = Phase::PageBreak;
                        continue;
                    }

                    let kind = match sequence {
                        Some(sequence) => RowKind::Body {
                            sequence,
                            striped: sequence % 2 == 0,
                        },
                        None => RowKind::Total,
                    };
                    current
                        .rows
                        .push(self.place_row(next_row, kind, y, measure, &column_x, &column_widths));

                    y += current.rows.last().map(|r| r.height).unwrap_or_default();
                    if sequence.is_some() {
                        body_count += 1;
                    }
                    next_row += 1;
                }
                Phase::PageBreak => {
                    phase = Phase::EmitHeader;
                }
                Phase::Done => break,
            }
        }

        self.attach_footers(&mut pages, footer_note);
        log::debug!(
            "Laid out {} rows on {} page(s)",
            document.rows.len(),
            pages.len()
        );

        LayoutPlan {
            page_width: page.width_mm,
            page_height: page.height_mm,
            column_x,
            column_widths,
            pages,
        }
    }

    // ========================================================================
    // Header
    // ========================================================================

    /// Two header rows: single columns span both, the merged group label
    /// spans the top row and its sub-labels fill the bottom row.
    pub fn layout_header(&self, columns: &[Column], column_x: &[f32], column_widths: &[f32]) -> HeaderBlock {
        let sizing = &self.config.sizing;
        let group = &self.config.header_group;
        let size = sizing.header_font_size_mm;
        let top = self.config.page.margin_mm;
        let left = self.config.page.margin_mm;

        let block = |title: &str, width: f32| {
            self.sizer.text_block(&normalize(title), FontWeight::Bold, size, width)
        };

        let group_x = column_x.get(group.first).copied().unwrap_or(left);
        let group_width: f32 = column_widths
            .iter()
            .enumerate()
            .filter(|(i, _)| group.contains(*i))
            .map(|(_, w)| *w)
            .sum();
        let (label_lines, label_height) = block(&group.label, group_width);
        let upper = label_height.max(sizing.min_header_row_mm);

        let mut lower = sizing.min_header_row_mm;
        let mut blocks = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let width = column_widths.get(i).copied().unwrap_or_default();
            let (lines, height) = block(&column.title, width);
            if group.contains(i) {
                lower = lower.max(height);
            }
            blocks.push((lines, height));
        }
        for (i, (_, height)) in blocks.iter().enumerate() {
            if !group.contains(i) && *height > upper + lower {
                lower = *height - upper;
            }
        }

        let mut cells = Vec::with_capacity(columns.len() + 1);
        for (i, (lines, _)) in blocks.into_iter().enumerate() {
            let x = column_x.get(i).copied().unwrap_or_default();
            let width = column_widths.get(i).copied().unwrap_or_default();
            let bounds = if group.contains(i) {
                Bounds { x, y: top + upper, width, height: lower }
            } else {
                Bounds { x, y: top, width, height: upper + lower }
            };
            cells.push(self.header_cell(bounds, lines, size));
        }
        cells.push(self.header_cell(
            Bounds {
                x: group_x,
                y: top,
                width: group_width,
                height: upper,
            },
            label_lines,
            size,
        ));

        HeaderBlock {
            top,
            height: upper + lower,
            cells,
        }
    }

    fn header_cell(&self, bounds: Bounds, lines: Vec<TextLine>, size: f32) -> PhysicalCell {
        let block = CellBlock {
            text_height: self.sizer.lines_height(lines.len(), size),
            lines,
            font_size_mm: size,
            weight: FontWeight::Bold,
            align: Align::Center,
            circle: None,
        };
        let palette = &self.config.palette;
        PhysicalCell {
            bounds,
            fill: palette.header_fill,
            texts: self.place_lines(&block, bounds, palette.header_text),
            circle: None,
        }
    }

    // ========================================================================
    // Rows
    // ========================================================================

    fn place_row(
        &self,
        source_index: usize,
        kind: RowKind,
        y: f32,
        measure: RowMeasure,
        column_x: &[f32],
        column_widths: &[f32],
    ) -> PhysicalRow {
        let palette = &self.config.palette;
        let (fill, text_color) = match kind {
            RowKind::Total => (palette.total_fill, palette.total_text),
            RowKind::Body { striped: true, .. } => (palette.stripe_fill, palette.body_text),
            RowKind::Body { striped: false, .. } => (palette.body_fill, palette.body_text),
        };

        let height = measure.height;
        let cells = measure
            .cells
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                let bounds = Bounds {
                    x: column_x.get(i).copied().unwrap_or_default(),
                    y,
                    width: column_widths.get(i).copied().unwrap_or_default(),
                    height,
                };
                match &block.circle {
                    Some(spec) => {
                        let (cx, cy) = bounds.center();
                        PhysicalCell {
                            bounds,
                            fill,
                            texts: self.place_lines(&block, bounds, palette.circle_text),
                            circle: Some(PlacedCircle {
                                cx,
                                cy,
                                radius: spec.diameter / 2.0,
                                color: spec.color,
                            }),
                        }
                    }
                    None => PhysicalCell {
                        bounds,
                        fill,
                        texts: self.place_lines(&block, bounds, text_color),
                        circle: None,
                    },
                }
            })
            .collect();

        PhysicalRow {
            source_index,
            kind,
            y,
            height,
            cells,
        }
    }

    /// Lines centered vertically in the box, aligned horizontally per block.
    /// Circle labels are always centered.
    fn place_lines(&self, block: &CellBlock, bounds: Bounds, color: Rgb) -> Vec<PlacedText> {
        let padding = self.config.sizing.padding_x_mm;
        let line_height = block.font_size_mm * self.config.sizing.line_height_factor;
        let top = bounds.y + (bounds.height - block.text_height) / 2.0;
        let align = if block.circle.is_some() {
            Align::Center
        } else {
            block.align
        };

        block
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.text.is_empty())
            .map(|(i, line)| {
                let x = match align {
                    Align::Left => bounds.x + padding,
                    Align::Center => bounds.x + (bounds.width - line.width) / 2.0,
                    Align::Right => bounds.x + bounds.width - padding - line.width,
                };
                let baseline = top
                    + i as f32 * line_height
                    + (line_height - block.font_size_mm) / 2.0
                    + block.font_size_mm * BASELINE_RATIO;
                PlacedText {
                    text: line.text.clone(),
                    x,
                    baseline,
                    font_size_mm: block.font_size_mm,
                    weight: block.weight,
                    color,
                }
            })
            .collect()
    }

    // ========================================================================
    // Footer
    // ========================================================================

    fn attach_footers(&self, pages: &mut [PhysicalPage], note: &str) {
        let page = &self.config.page;
        let size = self.config.sizing.footer_font_size_mm;
        let color = self.config.palette.footer_text;
        let baseline = page.body_bottom() + page.footer_space_mm / 2.0 + size * BASELINE_RATIO / 2.0;
        let total = pages.len();
        let right_edge = page.margin_mm + page.content_width();

        for physical in pages.iter_mut() {
            let label = format!("Лист {} из {}", physical.number, total);
            let width = self.metrics.text_width(&label, FontWeight::Regular, size);
            physical.footer = Some(Footer {
                left: PlacedText {
                    text: note.to_string(),
                    x: page.margin_mm,
                    baseline,
                    font_size_mm: size,
                    weight: FontWeight::Regular,
                    color,
                },
                right: PlacedText {
                    text: label,
                    x: right_edge - width,
                    baseline,
                    font_size_mm: size,
                    weight: FontWeight::Regular,
                    color,
                },
            });
        }
    }
}
