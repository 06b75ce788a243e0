use std::path::PathBuf;

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use egui::{ColorImage, Context as EguiContext, TextureHandle, TextureId, TextureOptions, Vec2};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::annotation::{FontSize, Point, Tool};
use crate::error::EditorError;
use crate::flatten;
use crate::raster;
use crate::store::{AnnotationPatch, AnnotationStore};

pub const DEFAULT_SURFACE_SIZE: (u32, u32) = (800, 600);

/// Toolbar state shared by the toolbar and every surface: one owned object,
/// no internal/external duplication.
#[derive(Clone, Copy, Debug)]
pub struct ToolSettings {
    pub tool: Tool,
    pub pen_color: [u8; 4],
    pub pen_width: f32,
    pub text_color: [u8; 4],
    pub font_size: FontSize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::Select,
            pen_color: [0, 0, 0, 255],
            pen_width: 5.0,
            text_color: [0, 0, 0, 255],
            font_size: FontSize::default(),
        }
    }
}

impl ToolSettings {
    pub fn from_saved(saved: UserSettings) -> Self {
        Self {
            tool: Tool::Select,
            pen_color: saved.pen_color,
            pen_width: saved.pen_width,
            text_color: saved.text_color,
            font_size: saved.font_size,
        }
    }

    pub fn to_saved(self) -> UserSettings {
        UserSettings {
            pen_color: self.pen_color,
            pen_width: self.pen_width,
            text_color: self.text_color,
            font_size: self.font_size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub pen_color: [u8; 4],
    pub pen_width: f32,
    pub text_color: [u8; 4],
    pub font_size: FontSize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            pen_color: [0, 0, 0, 255],
            pen_width: 5.0,
            text_color: [0, 0, 0, 255],
            font_size: FontSize::default(),
        }
    }
}

impl UserSettings {
    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "snapmix", "snapmix")?;
        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir).ok()?;
        Some(config_dir.join("settings.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// An in-progress text entry: either a new annotation at `position` or an
/// edit of the annotation at `target`.
#[derive(Clone, Debug)]
pub struct PendingText {
    pub buffer: String,
    pub position: Point,
    pub target: Option<usize>,
    pub color: [u8; 4],
    pub font_size: FontSize,
}

impl PendingText {
    fn new_at(position: Point, settings: &ToolSettings) -> Self {
        Self {
            buffer: String::new(),
            position,
            target: None,
            color: settings.text_color,
            font_size: settings.font_size,
        }
    }
}

/// What the pointer is currently doing. A single tagged variant so that
/// "drawing a stroke" and "dragging an annotation" cannot both be true.
#[derive(Clone, Debug, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Drawing {
        last: Point,
    },
    Dragging {
        index: usize,
        offset: Vec2,
    },
    TextEntry(PendingText),
}

impl Interaction {
    pub fn is_text_entry(&self) -> bool {
        matches!(self, Interaction::TextEntry(_))
    }
}

/// One editing surface: the raster (background, image and strokes baked
/// in), the annotation store, and the interaction state. The display layer
/// in `canvas.rs` feeds pointer/keyboard events into this.
pub struct SurfaceState {
    pub store: AnnotationStore,
    pub interaction: Interaction,
    raster: Pixmap,
    image: Option<DynamicImage>,
    has_strokes: bool,
    texture: Option<TextureHandle>,
    raster_dirty: bool,
    label: &'static str,
}

impl SurfaceState {
    pub fn new(label: &'static str) -> Result<Self, EditorError> {
        let (width, height) = DEFAULT_SURFACE_SIZE;
        Ok(Self {
            store: AnnotationStore::default(),
            interaction: Interaction::Idle,
            raster: raster::new_surface(width, height)?,
            image: None,
            has_strokes: false,
            texture: None,
            raster_dirty: true,
            label,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.raster.width(), self.raster.height())
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn has_content(&self) -> bool {
        self.image.is_some() || !self.store.is_empty() || self.has_strokes
    }

    /// Replaces the surface's image wholesale and re-bakes the raster.
    /// Annotations and selection survive an image swap.
    pub fn load_image(&mut self, image: DynamicImage) -> Result<(), EditorError> {
        tracing::info!(width = image.width(), height = image.height(), "loading image");
        raster::bake_image(&mut self.raster, &image)?;
        self.image = Some(image);
        self.has_strokes = false;
        self.raster_dirty = true;
        Ok(())
    }

    /// Matches the surface raster to the space the layout gave it this
    /// frame, copying prior content before the reallocation.
    pub fn set_view_size(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        if width == 0 || height == 0 || (width, height) == self.size() {
            return Ok(());
        }
        self.raster = raster::resize_preserving(&self.raster, width, height)?;
        self.raster_dirty = true;
        Ok(())
    }

    /// Pointer-down dispatch for a drag gesture, in priority order: pen
    /// stroke, then annotation hit (select + drag with the pointer-to-anchor
    /// offset), then clear selection. Text entry is click-driven.
    pub fn pointer_down(&mut self, point: Point, settings: &ToolSettings) {
        if settings.tool == Tool::Pen {
            self.interaction = Interaction::Drawing { last: point };
            return;
        }

        if let Some(index) = self.store.hit_test(point) {
            self.store.select(Some(index));
            let anchor = self.store.get(index).map(|a| a.position).unwrap_or(point);
            self.interaction = Interaction::Dragging {
                index,
                offset: anchor.delta(point),
            };
            return;
        }

        self.store.select(None);
    }

    pub fn pointer_move(&mut self, point: Point, settings: &ToolSettings) {
        match &mut self.interaction {
            Interaction::Drawing { last } => {
                let from = *last;
                *last = point;
                raster::stroke_segment(
                    &mut self.raster,
                    from,
                    point,
                    settings.pen_color,
                    settings.pen_width,
                );
                self.has_strokes = true;
                self.raster_dirty = true;
            }
            Interaction::Dragging { index, offset } => {
                let index = *index;
                let anchor = Point::new(point.x - offset.x, point.y - offset.y);
                self.store.update(index, AnnotationPatch::position(anchor));
            }
            Interaction::Idle | Interaction::TextEntry(_) => {}
        }
    }

    /// Ends a stroke or commits a drag; a pending text entry stays open.
    pub fn pointer_up(&mut self) {
        match self.interaction {
            Interaction::Drawing { .. } | Interaction::Dragging { .. } => {
                self.interaction = Interaction::Idle;
            }
            _ => {}
        }
    }

    /// Click dispatch (press and release without movement): pen dot, then
    /// annotation select, then text entry placement, then clear selection.
    pub fn click(&mut self, point: Point, settings: &mut ToolSettings) {
        if settings.tool == Tool::Pen {
            raster::stroke_segment(
                &mut self.raster,
                point,
                point,
                settings.pen_color,
                settings.pen_width,
            );
            self.has_strokes = true;
            self.raster_dirty = true;
            return;
        }

        if let Some(index) = self.store.hit_test(point) {
            self.store.select(Some(index));
            return;
        }

        // Free text already typed inline commits at the clicked position.
        if let Interaction::TextEntry(pending) = &self.interaction {
            if pending.target.is_none()
                && !pending.buffer.trim().is_empty()
                && settings.tool == Tool::Text
            {
                let mut pending = match std::mem::take(&mut self.interaction) {
                    Interaction::TextEntry(pending) => pending,
                    _ => unreachable!(),
                };
                pending.position = point;
                self.interaction = Interaction::TextEntry(pending);
                self.commit_text_entry(settings);
                return;
            }
        }

        if settings.tool == Tool::Text {
            self.store.select(None);
            self.interaction = Interaction::TextEntry(PendingText::new_at(point, settings));
            return;
        }

        self.store.select(None);
    }

    /// Double-click opens edit-in-place for the hit annotation regardless
    /// of the current tool.
    pub fn double_click(&mut self, point: Point, settings: &mut ToolSettings) {
        let Some(index) = self.store.hit_test(point) else {
            return;
        };
        let Some(annotation) = self.store.get(index) else {
            return;
        };

        let pending = PendingText {
            buffer: annotation.text.clone(),
            position: annotation.position,
            target: Some(index),
            color: annotation.color,
            font_size: annotation.font_size,
        };
        self.store.select(Some(index));
        settings.tool = Tool::Text;
        self.interaction = Interaction::TextEntry(pending);
    }

    /// Delete removes the selected annotation; ignored while a text entry
    /// is open so typing is never destructive.
    pub fn delete_selected(&mut self) {
        if self.interaction.is_text_entry() {
            return;
        }
        self.store.remove_selected();
    }

    /// Escape closes an open text entry without committing; prior selection
    /// is untouched. Closing the dialog leaves text mode, same as a commit.
    pub fn cancel_text_entry(&mut self, settings: &mut ToolSettings) {
        if self.interaction.is_text_entry() {
            self.interaction = Interaction::Idle;
            if settings.tool == Tool::Text {
                settings.tool = Tool::Select;
            }
        }
    }

    /// Commits the pending text entry. Whitespace-only text is discarded.
    /// A committed new annotation returns the tool to Select.
    pub fn commit_text_entry(&mut self, settings: &mut ToolSettings) {
        let pending = match std::mem::take(&mut self.interaction) {
            Interaction::TextEntry(pending) => pending,
            other => {
                self.interaction = other;
                return;
            }
        };

        let trimmed = pending.buffer.trim();
        if trimmed.is_empty() {
            if settings.tool == Tool::Text && pending.target.is_none() {
                settings.tool = Tool::Select;
            }
            return;
        }

        match pending.target {
            Some(index) => {
                self.store.update(
                    index,
                    AnnotationPatch {
                        text: Some(trimmed.to_string()),
                        font_size: Some(pending.font_size),
                        color: Some(pending.color),
                        ..AnnotationPatch::default()
                    },
                );
                if settings.tool == Tool::Text {
                    settings.tool = Tool::Select;
                }
            }
            None => {
                self.store.add(
                    trimmed.to_string(),
                    pending.position,
                    pending.font_size,
                    pending.color,
                );
                settings.tool = Tool::Select;
            }
        }
    }

    /// The surface serialized for export or merging: raster plus text
    /// annotations, no selection decoration.
    pub fn pixel_buffer(&self) -> Result<RgbaImage> {
        Ok(flatten::flatten(&self.raster, self.store.annotations())?.to_rgba8())
    }

    pub fn raster(&self) -> &Pixmap {
        &self.raster
    }

    pub fn texture_id(&mut self, ctx: &EguiContext) -> TextureId {
        if self.raster_dirty || self.texture.is_none() {
            let size = [self.raster.width() as usize, self.raster.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, self.raster.data());
            match &mut self.texture {
                Some(texture) => texture.set(color, TextureOptions::NEAREST),
                None => {
                    self.texture = Some(ctx.load_texture(self.label, color, TextureOptions::NEAREST))
                }
            }
            self.raster_dirty = false;
        }
        self.texture.as_ref().expect("texture was just created").id()
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgba, RgbaImage};

    use super::{Interaction, SurfaceState, ToolSettings};
    use crate::annotation::{FontSize, Point, Tool};

    fn surface() -> SurfaceState {
        SurfaceState::new("test").expect("surface allocates")
    }

    fn pen_settings() -> ToolSettings {
        ToolSettings {
            tool: Tool::Pen,
            ..ToolSettings::default()
        }
    }

    fn text_settings() -> ToolSettings {
        ToolSettings {
            tool: Tool::Text,
            ..ToolSettings::default()
        }
    }

    fn raster_pixel(state: &SurfaceState, x: u32, y: u32) -> (u8, u8, u8) {
        let p = state.raster().pixel(x, y).expect("in bounds").demultiply();
        (p.red(), p.green(), p.blue())
    }

    #[test]
    fn pen_drag_strokes_the_raster() {
        let mut state = surface();
        let settings = pen_settings();

        state.pointer_down(Point::new(10.0, 10.0), &settings);
        assert!(matches!(state.interaction, Interaction::Drawing { .. }));

        state.pointer_move(Point::new(60.0, 10.0), &settings);
        state.pointer_up();

        assert!(matches!(state.interaction, Interaction::Idle));
        assert!(state.has_content());
        let (r, g, b) = raster_pixel(&state, 30, 10);
        assert!(r < 120 && g < 120 && b < 120, "black stroke on white");
    }

    #[test]
    fn drag_moves_annotation_by_pointer_delta() {
        let mut state = surface();
        let settings = ToolSettings::default();
        state.store.add(
            "label".to_string(),
            Point::new(100.0, 100.0),
            FontSize::from_px(20),
            [0, 0, 0, 255],
        );

        // Grab inside the box, a bit right of and above the anchor.
        state.pointer_down(Point::new(110.0, 95.0), &settings);
        assert!(matches!(
            state.interaction,
            Interaction::Dragging { index: 0, .. }
        ));

        state.pointer_move(Point::new(130.0, 115.0), &settings);
        state.pointer_up();

        // The anchor followed the pointer by the same delta, no jump.
        let moved = state.store.get(0).expect("annotation exists");
        assert_eq!(moved.position, Point::new(120.0, 120.0));

        // And the drag selected it.
        assert_eq!(state.store.selected_index(), Some(0));
    }

    #[test]
    fn click_on_empty_space_clears_selection() {
        let mut state = surface();
        let mut settings = ToolSettings::default();
        state.store.add(
            "label".to_string(),
            Point::new(100.0, 100.0),
            FontSize::from_px(20),
            [0, 0, 0, 255],
        );
        assert_eq!(state.store.selected_index(), Some(0));

        state.click(Point::new(400.0, 400.0), &mut settings);
        assert_eq!(state.store.selected_index(), None);
    }

    #[test]
    fn text_click_opens_entry_at_point() {
        let mut state = surface();
        let mut settings = text_settings();

        state.click(Point::new(50.0, 60.0), &mut settings);
        match &state.interaction {
            Interaction::TextEntry(pending) => {
                assert_eq!(pending.position, Point::new(50.0, 60.0));
                assert_eq!(pending.target, None);
                assert!(pending.buffer.is_empty());
            }
            other => panic!("expected text entry, got {other:?}"),
        }
    }

    #[test]
    fn inline_text_commits_at_second_click_position() {
        let mut state = surface();
        let mut settings = text_settings();

        state.click(Point::new(50.0, 60.0), &mut settings);
        if let Interaction::TextEntry(pending) = &mut state.interaction {
            pending.buffer = "typed inline".to_string();
        }

        state.click(Point::new(200.0, 220.0), &mut settings);

        assert!(matches!(state.interaction, Interaction::Idle));
        assert_eq!(settings.tool, Tool::Select);
        assert_eq!(state.store.len(), 1);
        let added = state.store.get(0).expect("annotation exists");
        assert_eq!(added.text, "typed inline");
        assert_eq!(added.position, Point::new(200.0, 220.0));
    }

    #[test]
    fn escape_cancels_entry_without_commit() {
        let mut state = surface();
        let mut settings = ToolSettings::default();
        state.store.add(
            "existing".to_string(),
            Point::new(10.0, 30.0),
            FontSize::from_px(14),
            [0, 0, 0, 255],
        );
        state.store.select(Some(0));

        settings.tool = Tool::Text;
        state.click(Point::new(300.0, 300.0), &mut settings);
        if let Interaction::TextEntry(pending) = &mut state.interaction {
            pending.buffer = "unsaved".to_string();
        }

        state.cancel_text_entry(&mut settings);

        assert!(matches!(state.interaction, Interaction::Idle));
        assert_eq!(state.store.len(), 1);
        // Opening the entry cleared selection; cancel does not resurrect or
        // further change it.
        assert_eq!(state.store.selected_index(), None);
    }

    #[test]
    fn cancel_returns_tool_to_select() {
        let mut state = surface();
        let mut settings = text_settings();

        state.click(Point::new(30.0, 30.0), &mut settings);
        assert!(state.interaction.is_text_entry());

        state.cancel_text_entry(&mut settings);
        assert_eq!(settings.tool, Tool::Select);
        assert!(matches!(state.interaction, Interaction::Idle));
    }

    #[test]
    fn click_on_annotation_selects_it_over_pending_inline_text() {
        let mut state = surface();
        let mut settings = ToolSettings::default();
        state.store.add(
            "existing".to_string(),
            Point::new(100.0, 100.0),
            FontSize::from_px(20),
            [0, 0, 0, 255],
        );
        state.store.select(None);

        settings.tool = Tool::Text;
        state.click(Point::new(400.0, 400.0), &mut settings);
        if let Interaction::TextEntry(pending) = &mut state.interaction {
            pending.buffer = "pending".to_string();
        }

        // Clicking inside the existing annotation's box selects it; the
        // pending text does not turn into a second annotation.
        state.click(Point::new(110.0, 95.0), &mut settings);
        assert_eq!(state.store.len(), 1);
        assert_eq!(state.store.selected_index(), Some(0));
    }

    #[test]
    fn whitespace_only_text_is_discarded() {
        let mut state = surface();
        let mut settings = text_settings();

        state.click(Point::new(10.0, 10.0), &mut settings);
        if let Interaction::TextEntry(pending) = &mut state.interaction {
            pending.buffer = "   \n ".to_string();
        }
        state.commit_text_entry(&mut settings);

        assert!(state.store.is_empty());
        assert_eq!(settings.tool, Tool::Select);
    }

    #[test]
    fn double_click_opens_edit_in_place_in_any_mode() {
        let mut state = surface();
        let mut settings = pen_settings();
        state.store.add(
            "edit me".to_string(),
            Point::new(100.0, 100.0),
            FontSize::from_px(24),
            [255, 0, 0, 255],
        );

        state.double_click(Point::new(110.0, 90.0), &mut settings);

        assert_eq!(settings.tool, Tool::Text);
        match &state.interaction {
            Interaction::TextEntry(pending) => {
                assert_eq!(pending.buffer, "edit me");
                assert_eq!(pending.target, Some(0));
                assert_eq!(pending.font_size, FontSize::from_px(24));
                assert_eq!(pending.color, [255, 0, 0, 255]);
            }
            other => panic!("expected text entry, got {other:?}"),
        }
    }

    #[test]
    fn edit_commit_updates_existing_annotation() {
        let mut state = surface();
        let mut settings = ToolSettings::default();
        state.store.add(
            "before".to_string(),
            Point::new(40.0, 80.0),
            FontSize::from_px(16),
            [0, 0, 0, 255],
        );

        state.double_click(Point::new(45.0, 72.0), &mut settings);
        if let Interaction::TextEntry(pending) = &mut state.interaction {
            pending.buffer = "after".to_string();
            pending.color = [0, 0, 255, 255];
        }
        state.commit_text_entry(&mut settings);

        let updated = state.store.get(0).expect("annotation exists");
        assert_eq!(updated.text, "after");
        assert_eq!(updated.color, [0, 0, 255, 255]);
        // Position is not part of the edit dialog.
        assert_eq!(updated.position, Point::new(40.0, 80.0));
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn delete_ignored_while_text_entry_open() {
        let mut state = surface();
        let mut settings = text_settings();
        state.store.add(
            "keep".to_string(),
            Point::new(10.0, 30.0),
            FontSize::from_px(14),
            [0, 0, 0, 255],
        );
        state.click(Point::new(300.0, 300.0), &mut settings);

        state.delete_selected();
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn delete_removes_selection() {
        let mut state = surface();
        state.store.add(
            "Hello".to_string(),
            Point::new(100.0, 100.0),
            FontSize::from_px(20),
            [0, 0, 0, 255],
        );

        state.delete_selected();
        assert!(state.store.is_empty());
        assert_eq!(state.store.selected_index(), None);
    }

    #[test]
    fn load_image_fills_matching_aspect_surface() {
        let mut state = surface();
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            400,
            300,
            Rgba([0, 0, 255, 255]),
        ));
        state.load_image(image).expect("load succeeds");

        assert!(state.has_image());
        // 400×300 into 800×600 scales 2× and covers the whole raster.
        assert_eq!(raster_pixel(&state, 0, 0), (0, 0, 255));
        assert_eq!(raster_pixel(&state, 799, 599), (0, 0, 255));
        assert_eq!(raster_pixel(&state, 400, 300), (0, 0, 255));
    }

    #[test]
    fn load_image_keeps_annotations() {
        let mut state = surface();
        state.store.add(
            "survives".to_string(),
            Point::new(10.0, 30.0),
            FontSize::from_px(14),
            [0, 0, 0, 255],
        );

        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            10,
            10,
            Rgba([9, 9, 9, 255]),
        ));
        state.load_image(image).expect("load succeeds");
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn resize_keeps_raster_and_annotations() {
        let mut state = surface();
        let settings = pen_settings();
        state.store.add(
            "kept".to_string(),
            Point::new(10.0, 30.0),
            FontSize::from_px(14),
            [0, 0, 0, 255],
        );
        state.pointer_down(Point::new(20.0, 20.0), &settings);
        state.pointer_move(Point::new(120.0, 20.0), &settings);
        state.pointer_up();
        let before = raster_pixel(&state, 70, 20);

        state.set_view_size(1000, 700).expect("resize succeeds");

        assert_eq!(state.size(), (1000, 700));
        assert_eq!(raster_pixel(&state, 70, 20), before);
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn pixel_buffer_matches_surface_size() {
        let state = surface();
        let buffer = state.pixel_buffer().expect("flatten succeeds");
        assert_eq!(buffer.width(), 800);
        assert_eq!(buffer.height(), 600);
        assert_eq!(buffer.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
