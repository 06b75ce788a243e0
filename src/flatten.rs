use ab_glyph::FontArc;
use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tiny_skia::Pixmap;

use crate::annotation::TextAnnotation;

/// Flattens a surface into an exportable bitmap: the raster (background,
/// image and pen strokes are already baked into it) plus every text
/// annotation in draw order. Selection decoration is screen chrome and
/// never exported.
pub fn flatten(raster: &Pixmap, annotations: &[TextAnnotation]) -> Result<DynamicImage> {
    let mut output = RgbaImage::from_raw(raster.width(), raster.height(), raster.data().to_vec())
        .ok_or_else(|| anyhow!("cannot construct output image"))?;

    draw_text_annotations(&mut output, annotations);

    Ok(DynamicImage::ImageRgba8(output))
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("cannot encode PNG")?;
    Ok(buffer.into_inner())
}

fn draw_text_annotations(image: &mut RgbaImage, annotations: &[TextAnnotation]) {
    if annotations.is_empty() {
        return;
    }
    let Some(font) = load_system_font() else {
        tracing::warn!("no system font found, exporting without text annotations");
        return;
    };

    for annotation in annotations {
        let size = annotation.font_size.px();
        // The anchor is the baseline's left-bottom corner; imageproc draws
        // from the top-left.
        let x = annotation.position.x as i32;
        let y = (annotation.position.y - size) as i32;
        draw_text_mut(
            image,
            Rgba(annotation.color),
            x,
            y,
            size,
            &font,
            &annotation.text,
        );
    }
}

fn load_system_font() -> Option<FontArc> {
    let candidates = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Helvetica.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    for path in candidates {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontArc::try_from_vec(bytes) {
                return Some(font);
            }
        }
    }

    None
}
