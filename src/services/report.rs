//! PDF report assembly.
//!
//! Builds the downloadable report entirely in memory: a text section with
//! the analysis result and, when an image is supplied, a dedicated page with
//! the image scaled to fit a fixed box and centered.

use crate::utils::data_uri::{self, DataUriError};
use chrono::Local;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerIndex, PdfLayerReference, PdfPageIndex, Pt,
};
use std::io::{BufWriter, Cursor};
use thiserror::Error;

/// A4 page geometry, in millimeters.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

/// Bounding box the embedded image is scaled into, in points.
const IMAGE_BOX_WIDTH_PT: f32 = 500.0;
const IMAGE_BOX_HEIGHT_PT: f32 = 400.0;

/// Decoded-pixel cap, checked against the image header before any decode.
/// The flattened buffer is 3 bytes per pixel, so this bounds it at ~75 MB
/// no matter how well the payload compresses.
const MAX_IMAGE_PIXELS: u64 = 25_000_000;

const TITLE_FONT_SIZE: f32 = 24.0;
const DATE_FONT_SIZE: f32 = 14.0;
const BODY_FONT_SIZE: f32 = 12.0;
const LINE_SPACING: f32 = 1.4;

/// Average Helvetica glyph width as a fraction of the font size; close
/// enough for centering and wrapping without real font metrics.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const REPORT_TITLE: &str = "Plant Analysis Report";
const EMPTY_RESULT_PLACEHOLDER: &str = "No data available";

/// Error type for report rendering.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid image data URI: {0}")]
    InvalidImage(#[from] DataUriError),

    #[error("undecodable image payload: {0}")]
    UndecodableImage(#[from] image::ImageError),

    #[error("image dimensions {width}x{height} exceed the embedding limit")]
    ImageTooLarge { width: u32, height: u32 },

    #[error("PDF rendering failed: {0}")]
    Render(String),
}

/// Render the report PDF. A missing or empty result renders a placeholder
/// line; a missing or empty image skips the image page entirely.
pub fn render_report(result: Option<&str>, image: Option<&str>) -> Result<Vec<u8>, ReportError> {
    let (doc, page, layer) = PdfDocument::new(
        REPORT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let title_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Render(e.to_string()))?;
    let body_font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Render(e.to_string()))?;

    let mut cursor = PageCursor::new(&doc, page, layer);

    let title_x = (PAGE_WIDTH_MM - text_width_mm(REPORT_TITLE, TITLE_FONT_SIZE)) / 2.0;
    cursor.write_line(REPORT_TITLE, TITLE_FONT_SIZE, title_x.max(MARGIN_MM), &title_font);
    cursor.advance(TITLE_FONT_SIZE);

    let date_line = format!("Date: {}", Local::now().format("%-m/%-d/%Y"));
    cursor.write_line(&date_line, DATE_FONT_SIZE, MARGIN_MM, &body_font);
    cursor.advance(DATE_FONT_SIZE);

    let body = match result {
        Some(text) if !text.is_empty() => text,
        _ => EMPTY_RESULT_PLACEHOLDER,
    };
    for line in wrap_text(body, body_chars_per_line()) {
        cursor.write_line(&line, BODY_FONT_SIZE, MARGIN_MM, &body_font);
    }

    if let Some(uri) = image.filter(|s| !s.is_empty()) {
        let decoded = data_uri::parse_image_data_uri(uri)?;
        add_image_page(&doc, &decoded.bytes)?;
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer)
            .map_err(|e| ReportError::Render(e.to_string()))?;
    }
    Ok(buf)
}

/// Tracks the vertical write position, starting a new page when the current
/// one runs out of room.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(doc: &'a PdfDocumentReference, page: PdfPageIndex, layer: PdfLayerIndex) -> Self {
        Self {
            doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    /// Write one line and move the cursor down by the line height.
    fn write_line(&mut self, text: &str, font_size: f32, x: f32, font: &IndirectFontRef) {
        let line_height = pt_to_mm(font_size * LINE_SPACING);
        if self.y - line_height < MARGIN_MM {
            self.break_page();
        }
        self.y -= line_height;
        if !text.is_empty() {
            self.layer.use_text(text, font_size, Mm(x), Mm(self.y), font);
        }
    }

    /// Leave a one-line gap below the previous line.
    fn advance(&mut self, font_size: f32) {
        self.y -= pt_to_mm(font_size * LINE_SPACING);
    }

    fn break_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }
}

/// Decode the image and place it on its own page, scaled to fit the bounding
/// box and centered on both axes.
fn add_image_page(doc: &PdfDocumentReference, bytes: &[u8]) -> Result<(), ReportError> {
    let format = image::guess_format(bytes)?;
    let (px_width, px_height) =
        image::io::Reader::with_format(Cursor::new(bytes), format).into_dimensions()?;
    if u64::from(px_width) * u64::from(px_height) > MAX_IMAGE_PIXELS {
        return Err(ReportError::ImageTooLarge {
            width: px_width,
            height: px_height,
        });
    }

    let decoded = image::load_from_memory(bytes)?;

    // Flatten any alpha channel; the embedded XObject is plain RGB.
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());

    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Image");
    let layer = doc.get_page(page).get_layer(layer);

    // At 72 dpi one pixel renders as one point.
    let natural_width_pt = px_width as f32;
    let natural_height_pt = px_height as f32;
    let scale =
        (IMAGE_BOX_WIDTH_PT / natural_width_pt).min(IMAGE_BOX_HEIGHT_PT / natural_height_pt);

    let translate_x = Pt((mm_to_pt(PAGE_WIDTH_MM) - natural_width_pt * scale) / 2.0);
    let translate_y = Pt((mm_to_pt(PAGE_HEIGHT_MM) - natural_height_pt * scale) / 2.0);

    let pdf_image = Image::from_dynamic_image(&rgb);
    pdf_image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(translate_x.into()),
            translate_y: Some(translate_y.into()),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(72.0),
            ..Default::default()
        },
    );

    Ok(())
}

/// Greedy word wrap honoring embedded newlines; overlong words are
/// hard-split at the line width.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }

            while current.chars().count() > max_chars {
                let head: String = current.chars().take(max_chars).collect();
                let tail: String = current.chars().skip(max_chars).collect();
                lines.push(head);
                current = tail;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn body_chars_per_line() -> usize {
    let content_width_pt = mm_to_pt(PAGE_WIDTH_MM - 2.0 * MARGIN_MM);
    (content_width_pt / (BODY_FONT_SIZE * AVG_GLYPH_WIDTH)) as usize
}

fn text_width_mm(text: &str, font_size: f32) -> f32 {
    pt_to_mm(text.chars().count() as f32 * font_size * AVG_GLYPH_WIDTH)
}

fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}
