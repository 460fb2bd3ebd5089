//! PDF output of a laid-out [`ReportDocument`] through `printpdf`.

use std::io::Cursor;

use printpdf::{
    image_crate::codecs::png::PngDecoder, BuiltinFont, Color, Image, ImageTransform, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rgb,
};
use tracing::warn;

use super::layout::{ImageItem, ReportDocument, Tone, PAGE_HEIGHT, PAGE_WIDTH};
use crate::error::{AppError, AppResult};

// ---

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn tone_color(tone: Tone) -> Color {
    let (r, g, b) = match tone {
        Tone::Normal => (0.0, 0.0, 0.0),
        Tone::Muted => (0.5, 0.5, 0.5),
        Tone::Warning => (0.8, 0.0, 0.0),
    };
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Draw a PNG scaled to `item.width` points; undecodable bytes are skipped.
fn place_image(layer: &PdfLayerReference, item: &ImageItem) {
    // ---
    let image = match PngDecoder::new(Cursor::new(item.png.as_slice())).and_then(Image::try_from) {
        Ok(image) => image,
        Err(e) => {
            warn!("Logo not drawn: {}", e);
            return;
        }
    };

    let (px_w, px_h) = (image.image.width.0 as f32, image.image.height.0 as f32);
    if px_w == 0.0 {
        return;
    }
    let height = item.width * px_h / px_w;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(item.x)),
            translate_y: Some(mm(item.top - height)),
            dpi: Some(px_w * 72.0 / item.width),
            ..Default::default()
        },
    );
}

/// Render every page of `report` into a single PDF byte buffer.
pub fn render(report: &ReportDocument) -> AppResult<Vec<u8>> {
    // ---
    let (doc, first_page, first_layer) =
        PdfDocument::new(report.title(), mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Report(format!("font: {e:?}")))?;

    for (index, page) in report.pages().iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "content");
            doc.get_page(page_idx).get_layer(layer_idx)
        };

        for &(y, from, to) in &page.rules {
            layer.set_outline_color(tone_color(Tone::Normal));
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(from), mm(y)), false),
                    (Point::new(mm(to), mm(y)), false),
                ],
                is_closed: false,
            });
        }

        for item in &page.images {
            place_image(&layer, item);
        }

        for item in &page.items {
            layer.set_fill_color(tone_color(item.tone));
            layer.use_text(item.text.as_str(), item.size, mm(item.x), mm(item.y), &font);
        }
    }

    doc.save_to_bytes()
        .map_err(|e| AppError::Report(format!("save: {e:?}")))
}
