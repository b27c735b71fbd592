//! Paginated PDF rendering of a fixed-schema tabular report.
//!
//! The pipeline is: [`Document`] + [`LayoutConfig`] -> [`PageLayoutEngine`]
//! -> [`LayoutPlan`] -> [`draw_plan`] on a [`Renderer`] -> PDF bytes.
//! Cell text goes through the Russian typography pass in [`typography`]
//! before it is measured, so line breaks never split bound pairs.

pub mod config;
pub mod document;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod metrics;
pub mod numeric;
pub mod render;
pub mod sizing;
pub mod typography;

pub use config::LayoutConfig;
pub use document::{Cell, CellStyle, Column, Document, Row};
pub use error::{ReportError, Result};
pub use fonts::{FontResolver, FontVariant, ResolvedFonts, SourceTransport};
pub use layout::{LayoutPlan, PageLayoutEngine};
pub use metrics::{FixedWidthMetrics, TextMetrics, TtfMetrics};
pub use render::{draw_plan, PdfRenderer, Renderer};
pub use sizing::RowSizer;
pub use typography::{normalize, TypographyNormalizer};

use chrono::NaiveDate;

const DOCUMENT_TITLE: &str = "Отчёт";

/// Footer date as printed on every page
pub fn format_report_date(date: &NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Validate, lay out and render `document` with already resolved fonts.
///
/// Returns the complete PDF or an error; partial output is never produced.
pub fn render_report(
    document: &Document,
    config: &LayoutConfig,
    fonts: &ResolvedFonts,
    report_date: NaiveDate,
) -> Result<Vec<u8>> {
    document.validate(config)?;

    let metrics = TtfMetrics::new(fonts)?;
    let plan = PageLayoutEngine::new(&metrics, config).layout(document, &format_report_date(&report_date));
    log::info!(
        "Rendering {} rows on {} page(s)",
        document.rows.len(),
        plan.pages.len()
    );

    let mut renderer = PdfRenderer::new(DOCUMENT_TITLE, plan.page_width, plan.page_height, fonts)?;
    draw_plan(&plan, &config.palette, &mut renderer);
    renderer.finish()
}
