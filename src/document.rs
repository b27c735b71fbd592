// report-pdf: Document model

use crate::config::{Align, FontWeight, HeaderGroup, LayoutConfig, Rgb};
use crate::error::{ReportError, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Allowed drift of the column width sum away from 100%
const WIDTH_SUM_TOLERANCE: f32 = 0.5;

/// A report table as supplied by the caller. Never mutated by rendering.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Document {
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Percentage share of the content width
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub is_total: bool,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default)]
    pub style: Option<CellStyle>,
}

/// Per-cell overrides; unset fields fall back to the column defaults.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellStyle {
    pub font_size_mm: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub circle_color: Option<Rgb>,
    pub circle_diameter_mm: Option<f32>,
    pub align: Option<Align>,
}

/// Strings pass through; null, numbers, booleans and containers become "".
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => {
            log::debug!("Non-string cell value {} treated as empty", other);
            String::new()
        }
    })
}

impl Cell {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = Some(style);
        self
    }
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Default::default()
        }
    }

    pub fn total(cells: Vec<Cell>) -> Self {
        Self {
            is_total: true,
            cells,
            ..Default::default()
        }
    }
}

impl Column {
    pub fn new(title: impl Into<String>, width: f32) -> Self {
        Self {
            title: title.into(),
            width,
            ..Default::default()
        }
    }
}

impl Document {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ReportError::DocumentError(format!("Invalid JSON: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReportError::DocumentError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Check the fixed-schema preconditions the layout relies on.
    pub fn validate(&self, config: &LayoutConfig) -> Result<()> {
        let expected = config.columns.len();
        if self.columns.len() != expected {
            return Err(ReportError::SchemaViolation(format!(
                "expected {} columns, found {}",
                expected,
                self.columns.len()
            )));
        }

        validate_group(&config.header_group, expected)?;

        let mut sum = 0.0;
        for (i, column) in self.columns.iter().enumerate() {
            if !column.width.is_finite() || column.width < 0.0 {
                return Err(ReportError::SchemaViolation(format!(
                    "column {} has invalid width {}",
                    i, column.width
                )));
            }
            sum += column.width;
        }
        if (sum - 100.0).abs() > WIDTH_SUM_TOLERANCE {
            return Err(ReportError::SchemaViolation(format!(
                "column widths sum to {:.2}%, expected 100%",
                sum
            )));
        }

        for (i, row) in self.rows.iter().enumerate() {
            if row.cells.len() != expected {
                return Err(ReportError::SchemaViolation(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.cells.len(),
                    expected
                )));
            }
        }

        Ok(())
    }
}

fn validate_group(group: &HeaderGroup, columns: usize) -> Result<()> {
    if group.first > group.last || group.last >= columns {
        return Err(ReportError::SchemaViolation(format!(
            "merged header group {}..={} does not fit {} columns",
            group.first, group.last, columns
        )));
    }
    Ok(())
}
