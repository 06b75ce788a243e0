use egui::{Pos2, Rect, Vec2};
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Tool {
    Select,
    Pen,
    Text,
}

/// Font size in pixels, clamped to the dialog slider range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSize(u8);

impl FontSize {
    pub const MIN: u8 = 8;
    pub const MAX: u8 = 72;

    pub fn from_px(px: u8) -> Self {
        Self(px.clamp(Self::MIN, Self::MAX))
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }

    pub fn px(self) -> f32 {
        self.0 as f32
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self(20)
    }
}

impl Serialize for FontSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for FontSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FontSizeVisitor;

        impl<'de> Visitor<'de> for FontSizeVisitor {
            type Value = FontSize;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("font size in pixels, 8..72")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(FontSize::from_px(value.min(FontSize::MAX as u64) as u8))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let clamped = value.clamp(FontSize::MIN as i64, FontSize::MAX as i64) as u8;
                Ok(FontSize::from_px(clamped))
            }
        }

        deserializer.deserialize_u64(FontSizeVisitor)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_pos2(self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }

    pub fn from_pos2(value: Pos2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }

    pub fn delta(self, other: Point) -> Vec2 {
        Vec2::new(other.x - self.x, other.y - self.y)
    }
}

/// One positioned text label. `position` is the left end of the text
/// baseline in surface-local pixels; later annotations draw on top.
#[derive(Clone, Debug, PartialEq)]
pub struct TextAnnotation {
    pub text: String,
    pub position: Point,
    pub font_size: FontSize,
    pub color: [u8; 4],
}

impl TextAnnotation {
    pub fn color32(&self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(
            self.color[0],
            self.color[1],
            self.color[2],
            self.color[3],
        )
    }

    /// Measured bounding box `[x, x+width] × [y-height, y]`, with the
    /// position as the baseline's left-bottom corner and height equal to
    /// the font size.
    pub fn bounds(&self) -> Rect {
        let width = measure_text_width(&self.text, self.font_size.px());
        let height = self.font_size.px();
        Rect::from_min_max(
            Pos2::new(self.position.x, self.position.y - height),
            Pos2::new(self.position.x + width, self.position.y),
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point.to_pos2())
    }
}

/// Conservative width estimate for hit-testing and selection boxes; the
/// export path rasterises with a real font instead.
pub fn measure_text_width(text: &str, font_size: f32) -> f32 {
    (text.chars().count().max(1) as f32 * font_size * 0.6).max(8.0)
}

#[cfg(test)]
mod tests {
    use super::{FontSize, Point, TextAnnotation};

    #[test]
    fn font_size_clamps_to_range() {
        assert_eq!(FontSize::from_px(4).as_u8(), FontSize::MIN);
        assert_eq!(FontSize::from_px(200).as_u8(), FontSize::MAX);
        assert_eq!(FontSize::from_px(20).as_u8(), 20);
    }

    #[test]
    fn font_size_deserializes_with_clamping() {
        let parsed: FontSize = serde_json::from_str("16").expect("numeric font size");
        assert_eq!(parsed.as_u8(), 16);

        let clamped: FontSize = serde_json::from_str("300").expect("clamped font size");
        assert_eq!(clamped.as_u8(), FontSize::MAX);
    }

    #[test]
    fn bounds_anchor_at_baseline() {
        let annotation = TextAnnotation {
            text: "Hi".to_string(),
            position: Point::new(100.0, 50.0),
            font_size: FontSize::from_px(20),
            color: [0, 0, 0, 255],
        };

        let bounds = annotation.bounds();
        assert_eq!(bounds.min.x, 100.0);
        assert_eq!(bounds.max.y, 50.0);
        assert_eq!(bounds.height(), 20.0);
        assert!(bounds.width() > 0.0);
    }

    #[test]
    fn contains_respects_baseline_box() {
        let annotation = TextAnnotation {
            text: "Hello".to_string(),
            position: Point::new(10.0, 40.0),
            font_size: FontSize::from_px(20),
            color: [0, 0, 0, 255],
        };

        assert!(annotation.contains(Point::new(12.0, 30.0)));
        // Below the baseline is outside the box.
        assert!(!annotation.contains(Point::new(12.0, 41.0)));
        // Above the cap height as well.
        assert!(!annotation.contains(Point::new(12.0, 19.0)));
    }
}
