use image::DynamicImage;
use tiny_skia::{
    Color, FilterQuality, IntSize, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

use crate::annotation::Point;
use crate::error::EditorError;
use crate::geometry;

/// Allocates a surface raster filled with the white background.
pub fn new_surface(width: u32, height: u32) -> Result<Pixmap, EditorError> {
    let mut surface =
        Pixmap::new(width, height).ok_or(EditorError::RenderContextUnavailable)?;
    surface.fill(Color::WHITE);
    Ok(surface)
}

/// Re-bakes the raster for a freshly loaded image: white background, then
/// the image aspect-fit and centered. Prior strokes are discarded, matching
/// a full redraw.
pub fn bake_image(surface: &mut Pixmap, image: &DynamicImage) -> Result<(), EditorError> {
    surface.fill(Color::WHITE);

    let rgba = image.to_rgba8();
    let size = IntSize::from_wh(rgba.width(), rgba.height())
        .ok_or(EditorError::RenderContextUnavailable)?;
    let source = Pixmap::from_vec(rgba.into_raw(), size)
        .ok_or(EditorError::RenderContextUnavailable)?;

    let placement = geometry::fit_image(
        egui::Vec2::new(size.width() as f32, size.height() as f32),
        egui::Vec2::new(surface.width() as f32, surface.height() as f32),
    );
    let transform = Transform::from_scale(placement.scale, placement.scale)
        .post_translate(placement.rect.min.x, placement.rect.min.y);

    surface.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        },
        transform,
        None,
    );
    Ok(())
}

/// Composites one pen segment directly into the raster, round caps so that
/// consecutive segments join smoothly.
pub fn stroke_segment(surface: &mut Pixmap, from: Point, to: Point, color: [u8; 4], width: f32) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: width.max(1.0),
        line_cap: LineCap::Round,
        ..Stroke::default()
    };

    let mut pb = PathBuilder::new();
    pb.move_to(from.x, from.y);
    pb.line_to(to.x, to.y);
    let Some(path) = pb.finish() else {
        return;
    };

    surface.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Resizes the surface, preserving prior raster content by copying the old
/// pixels to the new surface's origin before anything else draws.
pub fn resize_preserving(surface: &Pixmap, width: u32, height: u32) -> Result<Pixmap, EditorError> {
    let mut resized = new_surface(width, height)?;
    resized.draw_pixmap(
        0,
        0,
        surface.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(resized)
}
