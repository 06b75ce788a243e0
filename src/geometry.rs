use egui::{Pos2, Rect, Vec2};

use crate::annotation::Point;

/// Aspect-fit placement of an image inside a surface: uniform scale
/// `min(sw/iw, sh/ih)`, centered, never cropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitPlacement {
    pub scale: f32,
    pub rect: Rect,
}

pub fn fit_image(image_size: Vec2, surface_size: Vec2) -> FitPlacement {
    let scale = (surface_size.x / image_size.x).min(surface_size.y / image_size.y);
    let scaled = image_size * scale;
    let origin = Pos2::new(
        (surface_size.x - scaled.x) * 0.5,
        (surface_size.y - scaled.y) * 0.5,
    );
    FitPlacement {
        scale,
        rect: Rect::from_min_size(origin, scaled),
    }
}

/// Surface-local pixel coordinates → screen coordinates, given where the
/// surface rect landed this frame. The surface raster is displayed 1:1.
pub fn surface_to_screen(pos: Point, surface_rect: Rect) -> Pos2 {
    Pos2::new(surface_rect.min.x + pos.x, surface_rect.min.y + pos.y)
}

pub fn screen_to_surface(pos: Pos2, surface_rect: Rect) -> Point {
    Point::new(pos.x - surface_rect.min.x, pos.y - surface_rect.min.y)
}
