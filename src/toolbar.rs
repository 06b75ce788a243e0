use egui::{Slider, Ui};

use crate::annotation::{FontSize, Tool};
use crate::canvas::{color_swatch, PALETTE};
use crate::state::ToolSettings;

/// What the user asked for this frame; the app acts on it after layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarAction {
    pub upload: bool,
    pub save: bool,
    pub merge: bool,
}

/// The shared toolbar: tool choice, pen color and width, text defaults,
/// and the file actions. One settings object feeds every surface.
pub fn toolbar(ui: &mut Ui, settings: &mut ToolSettings, show_merge: bool) -> ToolbarAction {
    let mut action = ToolbarAction::default();

    ui.horizontal_wrapped(|ui| {
        for (tool, label) in [
            (Tool::Select, "Select"),
            (Tool::Pen, "Pen"),
            (Tool::Text, "Text"),
        ] {
            if ui.selectable_label(settings.tool == tool, label).clicked() {
                settings.tool = tool;
            }
        }

        ui.separator();

        match settings.tool {
            Tool::Pen => {
                for color in PALETTE {
                    if color_swatch(ui, color, settings.pen_color == color).clicked() {
                        settings.pen_color = color;
                    }
                }
                ui.add(Slider::new(&mut settings.pen_width, 1.0..=20.0).text("width"));
            }
            Tool::Text => {
                for color in PALETTE {
                    if color_swatch(ui, color, settings.text_color == color).clicked() {
                        settings.text_color = color;
                    }
                }
                let mut size = settings.font_size.as_u8();
                if ui
                    .add(Slider::new(&mut size, FontSize::MIN..=FontSize::MAX).text("size"))
                    .changed()
                {
                    settings.font_size = FontSize::from_px(size);
                }
            }
            Tool::Select => {}
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if show_merge && ui.button("Merge").clicked() {
                action.merge = true;
            }
            if ui.button("Save").clicked() {
                action.save = true;
            }
            if ui.button("Upload").clicked() {
                action.upload = true;
            }
        });
    });

    action
}
