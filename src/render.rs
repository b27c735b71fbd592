// report-pdf: Drawing surface and PDF output

use crate::config::{FontWeight, Palette, Rgb};
use crate::error::{ReportError, Result};
use crate::fonts::ResolvedFonts;
use crate::layout::{Bounds, LayoutPlan, PhysicalCell, PlacedText};
use crate::typography::display_text;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::utils::{calculate_points_for_circle, calculate_points_for_rect};
use printpdf::{
    Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex, Point, Polygon,
};
use std::io::Cursor;

/// Millimetres per PostScript point
const MM_PER_PT: f32 = 0.352_778;

/// Grid line thickness in mm
const GRID_LINE_MM: f32 = 0.2;

/// A stateful drawing surface. Coordinates are millimetres from the
/// top-left corner of the current page.
pub trait Renderer {
    fn begin_page(&mut self);
    fn fill_rect(&mut self, bounds: Bounds, color: Rgb);
    fn stroke_rect(&mut self, bounds: Bounds, color: Rgb, thickness_mm: f32);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb);
    fn text(&mut self, text: &str, x: f32, baseline: f32, font_size_mm: f32, weight: FontWeight, color: Rgb);

    /// Serialize everything drawn so far.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

// ============================================================================
// Plan Drawing
// ============================================================================

/// Draw every page of `plan`: header, rows, grid and footer.
pub fn draw_plan<R: Renderer + ?Sized>(plan: &LayoutPlan, palette: &Palette, renderer: &mut R) {
    for page in &plan.pages {
        renderer.begin_page();

        for cell in &page.header.cells {
            draw_cell(renderer, cell, palette.grid_line);
        }
        for row in &page.rows {
            for cell in &row.cells {
                draw_cell(renderer, cell, palette.grid_line);
            }
        }

        if let Some(footer) = &page.footer {
            draw_text(renderer, &footer.left);
            draw_text(renderer, &footer.right);
        }
    }
}

fn draw_cell<R: Renderer + ?Sized>(renderer: &mut R, cell: &PhysicalCell, grid: Rgb) {
    renderer.fill_rect(cell.bounds, cell.fill);
    if let Some(circle) = &cell.circle {
        renderer.fill_circle(circle.cx, circle.cy, circle.radius, circle.color);
    }
    for text in &cell.texts {
        draw_text(renderer, text);
    }
    renderer.stroke_rect(cell.bounds, grid, GRID_LINE_MM);
}

fn draw_text<R: Renderer + ?Sized>(renderer: &mut R, text: &PlacedText) {
    if text.text.is_empty() {
        return;
    }
    renderer.text(
        &text.text,
        text.x,
        text.baseline,
        text.font_size_mm,
        text.weight,
        text.color,
    );
}

// ============================================================================
// PDF Output
// ============================================================================

pub struct PdfRenderer {
    doc: PdfDocumentReference,
    /// Page created together with the document, used by the first `begin_page`
    first_page: Option<(PdfPageIndex, PdfLayerIndex)>,
    layer: Option<PdfLayerReference>,
    font_regular: IndirectFontRef,
    font_bold: IndirectFontRef,
    width_mm: f32,
    height_mm: f32,
}

impl PdfRenderer {
    pub fn new(title: &str, width_mm: f32, height_mm: f32, fonts: &ResolvedFonts) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(width_mm), Mm(height_mm), "Layer 1");

        let font_regular = doc
            .add_external_font(Cursor::new(fonts.regular.clone()))
            .map_err(|e| ReportError::PdfError(format!("regular font: {}", e)))?;
        let font_bold = doc
            .add_external_font(Cursor::new(fonts.bold.clone()))
            .map_err(|e| ReportError::PdfError(format!("bold font: {}", e)))?;

        Ok(Self {
            doc,
            first_page: Some((page, layer)),
            layer: None,
            font_regular,
            font_bold,
            width_mm,
            height_mm,
        })
    }

    /// PDF y axis runs upwards from the bottom edge.
    fn flip(&self, y: f32) -> f32 {
        self.height_mm - y
    }

    fn color(rgb: Rgb) -> Color {
        let (r, g, b) = rgb.to_unit();
        Color::Rgb(printpdf::Rgb::new(r, g, b, None))
    }
}

impl Renderer for PdfRenderer {
    fn begin_page(&mut self) {
        let (page, layer) = match self.first_page.take() {
            Some(first) => first,
            None => self.doc.add_page(Mm(self.width_mm), Mm(self.height_mm), "Layer 1"),
        };
        self.layer = Some(self.doc.get_page(page).get_layer(layer));
    }

    fn fill_rect(&mut self, bounds: Bounds, color: Rgb) {
        let Some(layer) = &self.layer else { return };
        let (cx, cy) = bounds.center();
        layer.set_fill_color(Self::color(color));
        layer.add_polygon(Polygon {
            rings: vec![calculate_points_for_rect(
                Mm(bounds.width),
                Mm(bounds.height),
                Mm(cx),
                Mm(self.flip(cy)),
            )],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn stroke_rect(&mut self, bounds: Bounds, color: Rgb, thickness_mm: f32) {
        let Some(layer) = &self.layer else { return };
        let top = self.flip(bounds.y);
        let bottom = self.flip(bounds.bottom());
        let right = bounds.x + bounds.width;

        layer.set_outline_color(Self::color(color));
        layer.set_outline_thickness(thickness_mm / MM_PER_PT);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(bounds.x), Mm(top)), false),
                (Point::new(Mm(right), Mm(top)), false),
                (Point::new(Mm(right), Mm(bottom)), false),
                (Point::new(Mm(bounds.x), Mm(bottom)), false),
            ],
            is_closed: true,
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        let Some(layer) = &self.layer else { return };
        layer.set_fill_color(Self::color(color));
        layer.add_polygon(Polygon {
            rings: vec![calculate_points_for_circle(Mm(radius), Mm(cx), Mm(self.flip(cy)))],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn text(&mut self, text: &str, x: f32, baseline: f32, font_size_mm: f32, weight: FontWeight, color: Rgb) {
        let Some(layer) = &self.layer else { return };
        let font = match weight {
            FontWeight::Regular => &self.font_regular,
            FontWeight::Bold => &self.font_bold,
        };
        layer.set_fill_color(Self::color(color));
        layer.use_text(
            display_text(text),
            font_size_mm / MM_PER_PT,
            Mm(x),
            Mm(self.flip(baseline)),
            font,
        );
    }

    fn finish(self) -> Result<Vec<u8>> {
        if self.layer.is_none() {
            return Err(ReportError::PdfError("no pages were drawn".to_string()));
        }
        self.doc
            .save_to_bytes()
            .map_err(|e| ReportError::PdfError(e.to_string()))
    }
}
