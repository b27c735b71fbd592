// report-pdf: Row height computation

use crate::config::{Align, ColumnRole, FontWeight, LayoutConfig, Rgb};
use crate::document::{Cell, Row};
use crate::metrics::{TextLine, TextMetrics};
use crate::numeric::localize_decimal;
use crate::typography::normalize;

/// Numbered circle drawn in the index column of body rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleSpec {
    pub diameter: f32,
    pub color: Rgb,
}

/// A cell's wrapped text and the styling it was measured with.
#[derive(Debug, Clone, PartialEq)]
pub struct CellBlock {
    pub lines: Vec<TextLine>,
    pub font_size_mm: f32,
    pub weight: FontWeight,
    pub align: Align,
    /// Height of the text lines alone, without padding
    pub text_height: f32,
    pub circle: Option<CircleSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowMeasure {
    pub height: f32,
    pub cells: Vec<CellBlock>,
}

/// Computes row heights from normalized, wrapped cell text.
///
/// Holds no mutable state: equal inputs always give equal heights, which is
/// what keeps pagination reproducible.
pub struct RowSizer<'a, M: ?Sized> {
    metrics: &'a M,
    config: &'a LayoutConfig,
}

impl<'a, M: TextMetrics + ?Sized> RowSizer<'a, M> {
    pub fn new(metrics: &'a M, config: &'a LayoutConfig) -> Self {
        Self { metrics, config }
    }

    /// Physical height of `row`. `sequence` is the 1-based number of a body
    /// row, `None` for total rows.
    pub fn measure_row(&self, row: &Row, column_widths: &[f32], sequence: Option<usize>) -> f32 {
        self.layout_row(row, column_widths, sequence).height
    }

    pub fn layout_row(&self, row: &Row, column_widths: &[f32], sequence: Option<usize>) -> RowMeasure {
        let mut height = self.config.sizing.min_row_height_mm;
        let cells = row
            .cells
            .iter()
            .zip(column_widths)
            .enumerate()
            .map(|(column, (cell, width))| {
                let (block, required) = self.layout_cell(column, cell, *width, row.is_total, sequence);
                height = height.max(required);
                block
            })
            .collect();

        RowMeasure { height, cells }
    }

    /// Wrap arbitrary text into a box; returns the lines and padded height.
    pub fn text_block(
        &self,
        text: &str,
        weight: FontWeight,
        font_size_mm: f32,
        column_width: f32,
    ) -> (Vec<TextLine>, f32) {
        let rules = &self.config.sizing;
        let available = (column_width - 2.0 * rules.padding_x_mm).max(0.0);
        let lines = self.metrics.wrap(text, weight, font_size_mm, available);
        let height = self.lines_height(lines.len(), font_size_mm) + 2.0 * rules.padding_y_mm;
        (lines, height)
    }

    pub fn lines_height(&self, count: usize, font_size_mm: f32) -> f32 {
        count as f32 * font_size_mm * self.config.sizing.line_height_factor
    }

    /// Normalized text shown in a cell.
    pub fn cell_text(&self, column: usize, cell: &Cell, is_total: bool, sequence: Option<usize>) -> String {
        let style = self.config.columns.get(column);
        let value = cell.value.as_str();
        match style.role {
            ColumnRole::Index if !is_total => {
                let trimmed = value.trim();
                match sequence {
                    Some(n) if trimmed.is_empty() || trimmed == self.config.index_placeholder.0 => {
                        n.to_string()
                    }
                    _ => normalize(value),
                }
            }
            ColumnRole::Numeric => normalize(&localize_decimal(value)),
            _ => normalize(value),
        }
    }

    fn layout_cell(
        &self,
        column: usize,
        cell: &Cell,
        column_width: f32,
        is_total: bool,
        sequence: Option<usize>,
    ) -> (CellBlock, f32) {
        let defaults = self.config.columns.get(column);
        let overrides = cell.style.clone().unwrap_or_default();

        let font_size_mm = overrides.font_size_mm.unwrap_or(defaults.font_size_mm);
        let weight = overrides.font_weight.unwrap_or(if is_total {
            FontWeight::Bold
        } else {
            defaults.font_weight
        });
        let align = overrides.align.unwrap_or(defaults.align);

        let text = self.cell_text(column, cell, is_total, sequence);
        let (lines, mut required) = self.text_block(&text, weight, font_size_mm, column_width);
        let text_height = self.lines_height(lines.len(), font_size_mm);

        let circle = if defaults.role == ColumnRole::Index && !is_total {
            let diameter = overrides
                .circle_diameter_mm
                .unwrap_or(font_size_mm * self.config.sizing.circle_ratio);
            required = required.max(diameter + 2.0 * self.config.sizing.circle_padding_mm);
            Some(CircleSpec {
                diameter,
                color: overrides.circle_color.unwrap_or(self.config.palette.circle_fill),
            })
        } else {
            None
        };

        let block = CellBlock {
            lines,
            font_size_mm,
            weight,
            align,
            text_height,
            circle,
        };
        (block, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CIRCLE_PADDING_MM, CIRCLE_RATIO, MIN_ROW_HEIGHT_MM, STANDARD_FONT_SIZE_MM};
    use crate::document::CellStyle;
    use crate::metrics::FixedWidthMetrics;

    fn widths() -> Vec<f32> {
        vec![20.0, 40.0, 30.0, 30.0, 60.0, 30.0, 30.0, 30.0, 25.0, 25.0, 30.0, 25.0, 25.0]
    }

    fn row_with(column: usize, value: &str) -> Row {
        let mut cells: Vec<Cell> = (0..13).map(|_| Cell::new("")).collect();
        cells[column] = Cell::new(value);
        Row::new(cells)
    }

    #[test]
    fn empty_row_gets_minimum_height() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let mut row = row_with(1, "");
        row.is_total = true;
        let height = sizer.measure_row(&row, &widths(), None);
        assert!((height - MIN_ROW_HEIGHT_MM).abs() < 1e-4);
    }

    #[test]
    fn index_circle_sets_the_floor_for_body_rows() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let height = sizer.measure_row(&row_with(1, ""), &widths(), Some(1));
        let circle = STANDARD_FONT_SIZE_MM * CIRCLE_RATIO + 2.0 * CIRCLE_PADDING_MM;
        assert!((height - circle.max(MIN_ROW_HEIGHT_MM)).abs() < 1e-4);
    }

    #[test]
    fn circle_diameter_override() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let mut row = row_with(1, "");
        row.cells[0] = Cell::new("#").with_style(CellStyle {
            circle_diameter_mm: Some(20.0),
            ..Default::default()
        });
        let measure = sizer.layout_row(&row, &widths(), Some(3));
        assert!((measure.height - (20.0 + 2.0 * CIRCLE_PADDING_MM)).abs() < 1e-4);
        let circle = measure.cells[0].circle.as_ref().unwrap();
        assert_eq!(circle.diameter, 20.0);
        assert_eq!(circle.color, config.palette.circle_fill);
        assert_eq!(measure.cells[0].lines[0].text, "3");
    }

    #[test]
    fn total_rows_have_no_circle_and_are_bold() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let mut row = row_with(0, "Итого");
        row.is_total = true;
        let measure = sizer.layout_row(&row, &widths(), None);
        assert!(measure.cells[0].circle.is_none());
        assert_eq!(measure.cells[0].lines[0].text, "Итого");
        assert!(measure.cells.iter().all(|c| c.weight == FontWeight::Bold));
    }

    #[test]
    fn placeholder_becomes_sequence_number() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        assert_eq!(sizer.cell_text(0, &Cell::new("#"), false, Some(7)), "7");
        assert_eq!(sizer.cell_text(0, &Cell::new("  "), false, Some(8)), "8");
        assert_eq!(sizer.cell_text(0, &Cell::new("1а"), false, Some(9)), "1а");
        assert_eq!(sizer.cell_text(0, &Cell::new("#"), true, None), "#");
    }

    #[test]
    fn numeric_columns_are_localized_then_normalized() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        assert_eq!(
            sizer.cell_text(10, &Cell::new("12345.5"), false, Some(1)),
            "12\u{00A0}345,5"
        );
        assert_eq!(sizer.cell_text(10, &Cell::new("н/д"), false, Some(1)), "н/д");
        // text columns keep the decimal point
        assert_eq!(sizer.cell_text(2, &Cell::new("1.5"), false, Some(1)), "1.5");
    }

    #[test]
    fn long_text_grows_the_row() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let short = sizer.measure_row(&row_with(4, "короткий"), &widths(), Some(1));
        let long_text = "очень длинное описание ".repeat(20);
        let long = sizer.measure_row(&row_with(4, &long_text), &widths(), Some(1));
        assert!(long > short);
    }

    #[test]
    fn height_is_monotonic_in_text_length() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let mut previous = 0.0;
        let mut text = String::new();
        for i in 0..60 {
            text.push_str(if i % 3 == 0 { "работа " } else { "по плану " });
            let height = sizer.measure_row(&row_with(4, &text), &widths(), Some(1));
            assert!(height >= previous, "height shrank at step {}", i);
            previous = height;
        }
    }

    #[test]
    fn measuring_is_repeatable() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let row = row_with(4, "ул. Ленина, д. 5 (в том числе пристройка)");
        let a = sizer.layout_row(&row, &widths(), Some(2));
        let b = sizer.layout_row(&row, &widths(), Some(2));
        assert_eq!(a, b);
    }

    #[test]
    fn font_size_override_applies() {
        let config = LayoutConfig::default();
        let metrics = FixedWidthMetrics::default();
        let sizer = RowSizer::new(&metrics, &config);
        let mut row = row_with(1, "");
        row.cells[2] = Cell::new("текст").with_style(CellStyle {
            font_size_mm: Some(9.0),
            font_weight: Some(FontWeight::Bold),
            ..Default::default()
        });
        let measure = sizer.layout_row(&row, &widths(), Some(1));
        assert_eq!(measure.cells[2].font_size_mm, 9.0);
        assert_eq!(measure.cells[2].weight, FontWeight::Bold);
        let expected = 9.0 * config.sizing.line_height_factor + 2.0 * config.sizing.padding_y_mm;
        assert!(measure.height >= expected - 1e-4);
    }
}
