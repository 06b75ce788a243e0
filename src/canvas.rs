use egui::{
    Align2, Area, Color32, FontId, Frame, Id, Order, Pos2, Rect, Response, RichText, Sense, Shape,
    Slider, Stroke, TextEdit, Ui, Vec2,
};

use crate::annotation::FontSize;
use crate::geometry;
use crate::state::{Interaction, SurfaceState, ToolSettings};

/// The sixteen swatches offered for pen and text colors.
pub const PALETTE: [[u8; 4]; 16] = [
    [0x00, 0x00, 0x00, 0xFF],
    [0xFF, 0xFF, 0xFF, 0xFF],
    [0xFF, 0x00, 0x00, 0xFF],
    [0x00, 0xFF, 0x00, 0xFF],
    [0x00, 0x00, 0xFF, 0xFF],
    [0xFF, 0xFF, 0x00, 0xFF],
    [0xFF, 0x00, 0xFF, 0xFF],
    [0x00, 0xFF, 0xFF, 0xFF],
    [0xFF, 0xA5, 0x00, 0xFF],
    [0x80, 0x00, 0x80, 0xFF],
    [0xFF, 0xC0, 0xCB, 0xFF],
    [0xA5, 0x2A, 0x2A, 0xFF],
    [0x80, 0x80, 0x80, 0xFF],
    [0x90, 0xEE, 0x90, 0xFF],
    [0x87, 0xCE, 0xEB, 0xFF],
    [0xDD, 0xA0, 0xDD, 0xFF],
];

const SELECTION_COLOR: Color32 = Color32::from_rgb(0x3B, 0x82, 0xF6);
const SELECTION_MARGIN: f32 = 2.0;
const DASH_LENGTH: f32 = 5.0;

pub fn to_color32(color: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3])
}

/// A small square swatch; a bright border marks the current choice.
pub fn color_swatch(ui: &mut Ui, color: [u8; 4], selected: bool) -> Response {
    let (rect, response) = ui.allocate_exact_size(Vec2::splat(18.0), Sense::click());
    let stroke = if selected {
        Stroke::new(2.0, ui.visuals().strong_text_color())
    } else {
        Stroke::new(1.0, Color32::DARK_GRAY)
    };
    ui.painter().rect(rect, 3.0, to_color32(color), stroke);
    response
}

enum EntryAction {
    None,
    Commit,
    Cancel,
}

/// Shows one editing surface in the remaining space: raster texture, text
/// annotations, selection box, and the text entry popup. Routes pointer
/// events into the surface state.
pub fn surface_view(
    ui: &mut Ui,
    state: &mut SurfaceState,
    settings: &mut ToolSettings,
    hint: &str,
) -> Response {
    let available = ui.available_size();
    let size = Vec2::new(available.x.max(50.0), available.y.max(50.0));
    if let Err(err) = state.set_view_size(size.x as u32, size.y as u32) {
        tracing::warn!("surface resize failed: {err}");
    }

    let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
    let texture = state.texture_id(ui.ctx());
    let painter = ui.painter_at(rect);
    painter.image(
        texture,
        rect,
        Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );

    route_pointer(&response, rect, state, settings);

    for annotation in state.store.annotations() {
        painter.text(
            geometry::surface_to_screen(annotation.position, rect),
            Align2::LEFT_BOTTOM,
            &annotation.text,
            FontId::proportional(annotation.font_size.px()),
            annotation.color32(),
        );
    }

    if let Some(selected) = state.store.selected() {
        let bounds = selected
            .bounds()
            .translate(rect.min.to_vec2())
            .expand(SELECTION_MARGIN);
        draw_dashed_rect(&painter, bounds);
    }

    if !state.has_content() {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            hint,
            FontId::proportional(16.0),
            ui.visuals().weak_text_color(),
        );
    }

    text_entry_popup(ui, rect, state, settings, response.id);

    response
}

fn route_pointer(response: &Response, rect: Rect, state: &mut SurfaceState, settings: &mut ToolSettings) {
    let pointer = response
        .interact_pointer_pos()
        .map(|pos| geometry::screen_to_surface(pos, rect));

    if response.double_clicked() {
        if let Some(point) = pointer {
            state.double_click(point, settings);
        }
        return;
    }
    if response.clicked() {
        if let Some(point) = pointer {
            state.click(point, settings);
        }
        return;
    }
    if response.drag_started() {
        if let Some(point) = pointer {
            state.pointer_down(point, settings);
        }
    }
    if response.dragged() {
        if let Some(point) = pointer {
            state.pointer_move(point, settings);
        }
    }
    if response.drag_stopped() {
        state.pointer_up();
    }
}

fn draw_dashed_rect(painter: &egui::Painter, bounds: Rect) {
    let stroke = Stroke::new(2.0, SELECTION_COLOR);
    let corners = [
        bounds.left_top(),
        bounds.right_top(),
        bounds.right_bottom(),
        bounds.left_bottom(),
        bounds.left_top(),
    ];
    for shape in Shape::dashed_line(&corners, stroke, DASH_LENGTH, DASH_LENGTH) {
        painter.add(shape);
    }
}

fn text_entry_popup(
    ui: &mut Ui,
    rect: Rect,
    state: &mut SurfaceState,
    settings: &mut ToolSettings,
    id: Id,
) {
    if !state.interaction.is_text_entry() {
        return;
    }

    let mut action = EntryAction::None;
    let anchor = match &state.interaction {
        Interaction::TextEntry(pending) => {
            geometry::surface_to_screen(pending.position, rect) + Vec2::new(0.0, 8.0)
        }
        _ => return,
    };

    Area::new(id.with("text_entry"))
        .order(Order::Foreground)
        .fixed_pos(anchor)
        .show(ui.ctx(), |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                let Interaction::TextEntry(pending) = &mut state.interaction else {
                    return;
                };

                ui.set_max_width(260.0);
                let editor = ui.add(
                    TextEdit::multiline(&mut pending.buffer)
                        .desired_rows(2)
                        .desired_width(250.0)
                        .hint_text("Type text"),
                );
                if !ui.memory(|memory| memory.has_focus(editor.id)) && pending.buffer.is_empty() {
                    editor.request_focus();
                }

                ui.horizontal_wrapped(|ui| {
                    for color in PALETTE {
                        if color_swatch(ui, color, pending.color == color).clicked() {
                            pending.color = color;
                        }
                    }
                });

                let mut size = pending.font_size.as_u8();
                if ui
                    .add(
                        Slider::new(&mut size, FontSize::MIN..=FontSize::MAX)
                            .text(RichText::new("px").small()),
                    )
                    .changed()
                {
                    pending.font_size = FontSize::from_px(size);
                }

                ui.horizontal(|ui| {
                    let label = if pending.target.is_some() { "Update" } else { "Add" };
                    if ui.button(label).clicked() {
                        action = EntryAction::Commit;
                    }
                    if ui.button("Cancel").clicked() {
                        action = EntryAction::Cancel;
                    }
                });
            });
        });

    match action {
        EntryAction::Commit => state.commit_text_entry(settings),
        EntryAction::Cancel => state.cancel_text_entry(settings),
        EntryAction::None => {}
    }
}
