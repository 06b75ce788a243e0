use egui::{ColorImage, Context, Key, TextureHandle, TextureOptions};
use image::{DynamicImage, RgbaImage};

use crate::canvas;
use crate::clipboard;
use crate::compose;
use crate::error::EditorError;
use crate::flatten;
use crate::state::{SurfaceState, ToolSettings, UserSettings};
use crate::toolbar::{self, ToolbarAction};

const STATUS_SECONDS: f64 = 2.0;
const SINGLE_HINT: &str = "Paste an image (Ctrl+V), upload one, or start drawing";
const DUAL_HINT: &str = "Paste (Ctrl+V) or upload an image";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Workspace {
    Single,
    Dual,
}

/// The merged composite held open for preview, save and clipboard copy.
struct ExportDialog {
    composite: RgbaImage,
    texture: Option<TextureHandle>,
    status: Option<(String, f64)>,
}

pub struct SnapMixApp {
    workspace: Workspace,
    surfaces: [SurfaceState; 2],
    settings: ToolSettings,
    last_saved: UserSettings,
    active: usize,
    export: Option<ExportDialog>,
    alert: Option<String>,
}

impl SnapMixApp {
    pub fn new() -> Result<Self, EditorError> {
        let saved = UserSettings::load().unwrap_or_default();
        Ok(Self {
            workspace: Workspace::Single,
            surfaces: [SurfaceState::new("surface-left")?, SurfaceState::new("surface-right")?],
            settings: ToolSettings::from_saved(saved),
            last_saved: saved,
            active: 0,
            export: None,
            alert: None,
        })
    }

    fn handle_keys(&mut self, ctx: &Context) {
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            for surface in &mut self.surfaces {
                surface.cancel_text_entry(&mut self.settings);
            }
        }

        // While a text field has focus, Delete and paste belong to it.
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace)) {
            self.surfaces[self.active].delete_selected();
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(Key::V)) {
            self.paste_into_active();
        }
    }

    fn paste_into_active(&mut self) {
        match clipboard::read_image() {
            Ok(Some(image)) => {
                if let Err(err) = self.surfaces[self.active].load_image(image) {
                    self.alert = Some(err.to_string());
                }
            }
            Ok(None) => {}
            Err(err) => self.alert = Some(err.to_string()),
        }
    }

    fn upload_into_active(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp"])
            .pick_file()
        else {
            return;
        };
        match image::open(&path) {
            Ok(image) => {
                if let Err(err) = self.surfaces[self.active].load_image(image) {
                    self.alert = Some(err.to_string());
                }
            }
            Err(err) => self.alert = Some(EditorError::from(err).to_string()),
        }
    }

    fn save_active(&mut self) {
        match self.surfaces[self.active].pixel_buffer() {
            Ok(buffer) => self.save_png(buffer),
            Err(err) => self.alert = Some(err.to_string()),
        }
    }

    fn save_png(&mut self, buffer: RgbaImage) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(export_file_name())
            .add_filter("PNG image", &["png"])
            .save_file()
        else {
            return;
        };
        let result = flatten::encode_png(&DynamicImage::ImageRgba8(buffer))
            .and_then(|png| std::fs::write(&path, png).map_err(Into::into));
        if let Err(err) = result {
            self.alert = Some(format!("cannot save PNG: {err}"));
        } else {
            tracing::info!("saved {}", path.display());
        }
    }

    /// Flattens both frames and composites them side by side. Both frames
    /// must hold an image.
    fn build_composite(&self) -> Result<RgbaImage, EditorError> {
        let [left, right] = &self.surfaces;
        if !left.has_image() || !right.has_image() {
            return Err(EditorError::MissingCounterpart);
        }
        let left_buffer = left
            .pixel_buffer()
            .map_err(|_| EditorError::RenderContextUnavailable)?;
        let right_buffer = right
            .pixel_buffer()
            .map_err(|_| EditorError::RenderContextUnavailable)?;
        compose::merge(&left_buffer, &right_buffer)
    }

    fn merge_frames(&mut self) {
        match self.build_composite() {
            Ok(composite) => {
                self.export = Some(ExportDialog {
                    composite,
                    texture: None,
                    status: None,
                });
            }
            Err(err) => self.alert = Some(err.to_string()),
        }
    }

    fn apply_toolbar(&mut self, action: ToolbarAction) {
        if action.upload {
            self.upload_into_active();
        }
        if action.save {
            self.save_active();
        }
        if action.merge {
            self.merge_frames();
        }
    }

    fn show_export_dialog(&mut self, ctx: &Context) {
        let Some(export) = &mut self.export else {
            return;
        };

        let now = ctx.input(|i| i.time);
        if let Some((_, until)) = export.status {
            if now >= until {
                export.status = None;
            } else {
                ctx.request_repaint_after(std::time::Duration::from_millis(100));
            }
        }

        if export.texture.is_none() {
            let size = [export.composite.width() as usize, export.composite.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, export.composite.as_raw());
            export.texture = Some(ctx.load_texture("composite", color, TextureOptions::LINEAR));
        }
        let Some(texture_id) = export.texture.as_ref().map(|texture| texture.id()) else {
            return;
        };

        let mut open = true;
        let mut save_clicked = false;
        let mut copy_clicked = false;
        egui::Window::new("Merged result")
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let full = egui::Vec2::new(
                    export.composite.width() as f32,
                    export.composite.height() as f32,
                );
                let scale = (640.0 / full.x).min(420.0 / full.y).min(1.0);
                ui.image(egui::load::SizedTexture::new(texture_id, full * scale));

                ui.horizontal(|ui| {
                    if ui.button("Save PNG").clicked() {
                        save_clicked = true;
                    }
                    if ui.button("Copy to clipboard").clicked() {
                        copy_clicked = true;
                    }
                    if let Some((message, _)) = &export.status {
                        ui.label(message.clone());
                    }
                });
            });

        if copy_clicked {
            let message = match clipboard::write_image(&export.composite) {
                Ok(()) => "Copied".to_string(),
                Err(err) => err.to_string(),
            };
            export.status = Some((message, now + STATUS_SECONDS));
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        if save_clicked {
            let buffer = export.composite.clone();
            self.save_png(buffer);
        }
        if !open {
            self.export = None;
        }
    }

    fn show_alert(&mut self, ctx: &Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed {
            self.alert = None;
        }
    }

    fn persist_settings(&mut self) {
        let current = self.settings.to_saved();
        if current != self.last_saved {
            if let Err(err) = current.save() {
                tracing::warn!("cannot save settings: {err}");
            }
            self.last_saved = current;
        }
    }
}

impl eframe::App for SnapMixApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        let mut toolbar_action = ToolbarAction::default();
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for (workspace, label) in
                    [(Workspace::Single, "Single"), (Workspace::Dual, "Dual")]
                {
                    if ui
                        .selectable_label(self.workspace == workspace, label)
                        .clicked()
                    {
                        self.workspace = workspace;
                        if workspace == Workspace::Single {
                            self.active = 0;
                        }
                    }
                }
                ui.separator();
                toolbar_action =
                    toolbar::toolbar(ui, &mut self.settings, self.workspace == Workspace::Dual);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.workspace {
            Workspace::Single => {
                let response =
                    canvas::surface_view(ui, &mut self.surfaces[0], &mut self.settings, SINGLE_HINT);
                if response.hovered() {
                    self.active = 0;
                }
            }
            Workspace::Dual => {
                let settings = &mut self.settings;
                let [left, right] = &mut self.surfaces;
                let mut hovered = None;
                ui.columns(2, |columns| {
                    if canvas::surface_view(&mut columns[0], left, settings, DUAL_HINT).hovered() {
                        hovered = Some(0);
                    }
                    if canvas::surface_view(&mut columns[1], right, settings, DUAL_HINT).hovered() {
                        hovered = Some(1);
                    }
                });
                if let Some(index) = hovered {
                    self.active = index;
                }
            }
        });

        self.apply_toolbar(toolbar_action);
        self.show_export_dialog(ctx);
        self.show_alert(ctx);
        self.persist_settings();
    }
}

fn export_file_name() -> String {
    format!("canvas-drawing-{}.png", chrono::Utc::now().timestamp_millis())
}
