use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};
use vernier_core::measure::{Annotation, Label, Modifiers, Point, PointerButton, Shape};
use vernier_core::viewer::Viewport;

use crate::app::VernierApp;

const DASH_LENGTH: f32 = 6.0;
const GAP_LENGTH: f32 = 4.0;
const CIRCLE_SEGMENTS: usize = 72;

pub fn show(ctx: &egui::Context, app: &mut VernierApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let rect = ui.available_rect_before_wrap();
        ui.painter().rect_filled(rect, 0.0, Color32::from_gray(30));
        let response = ui.allocate_rect(rect, Sense::click_and_drag());

        app.viewer
            .viewport_mut()
            .set_view_size(rect.width(), rect.height());

        let Some(texture) = &app.viewport.texture else {
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Waiting for video...",
                FontId::proportional(16.0),
                Color32::from_gray(140),
            );
            return;
        };

        let viewport = app.viewer.viewport();
        let img_rect = image_rect(rect, viewport);
        ui.painter().image(
            texture.id(),
            img_rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        if response.double_clicked() {
            app.viewer.fit_to_view(rect.width(), rect.height());
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll > 0.0 {
                app.viewer.zoom_in();
            } else if scroll < 0.0 {
                app.viewer.zoom_out();
            }
        }

        handle_pointer(ui, &response, rect, app);
        paint_annotations(ui, rect, app);
    });
}

/// Screen rectangle of the frame, centered in the panel.
fn image_rect(panel: Rect, viewport: &Viewport) -> Rect {
    let (ox, oy) = viewport.origin();
    let (fw, fh) = viewport.frame_size().unwrap_or((0, 0));
    let min = panel.min + Vec2::new(ox, oy);
    Rect::from_min_size(
        min,
        Vec2::new(fw as f32 * viewport.zoom(), fh as f32 * viewport.zoom()),
    )
}

fn screen_to_frame(pos: Pos2, panel: Rect, viewport: &Viewport) -> Point {
    viewport.view_to_frame(pos.x - panel.min.x, pos.y - panel.min.y)
}

fn frame_to_screen(point: Point, panel: Rect, viewport: &Viewport) -> Pos2 {
    let (x, y) = viewport.frame_to_view(point);
    Pos2::new(panel.min.x + x, panel.min.y + y)
}

fn handle_pointer(ui: &egui::Ui, response: &egui::Response, panel: Rect, app: &mut VernierApp) {
    let (pressed, released, pos, mods) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.interact_pos(),
            i.modifiers,
        )
    });
    let Some(pos) = pos else {
        return;
    };
    let modifiers = Modifiers {
        ctrl: mods.ctrl,
        shift: mods.shift,
    };
    let point = screen_to_frame(pos, panel, app.viewer.viewport());
    let engine = app.viewer.engine_mut();

    if pressed && response.hovered() {
        engine.pointer_down(point, PointerButton::Primary);
    }
    if engine.is_dragging() {
        engine.pointer_move(point, modifiers);
    }
    if released {
        engine.pointer_up(point, PointerButton::Primary, modifiers);
    }
}

fn paint_annotations(ui: &egui::Ui, panel: Rect, app: &VernierApp) {
    let painter = ui.painter_at(panel);
    let viewport = app.viewer.viewport();
    let engine = app.viewer.engine();

    for annotation in engine.permanent().iter().chain(engine.temporary()) {
        paint_annotation(&painter, annotation, panel, viewport);
    }

    if let Some(center) = engine.pending_center() {
        let c = frame_to_screen(center, panel, viewport);
        let stroke = Stroke::new(1.0, Color32::from_rgb(0, 0, 255));
        painter.line_segment([c - Vec2::X * 5.0, c + Vec2::X * 5.0], stroke);
        painter.line_segment([c - Vec2::Y * 5.0, c + Vec2::Y * 5.0], stroke);
    }
}

fn paint_annotation(
    painter: &egui::Painter,
    annotation: &Annotation,
    panel: Rect,
    viewport: &Viewport,
) {
    let zoom = viewport.zoom();
    let rgb = annotation.stroke.color;
    let color = Color32::from_rgb(rgb.r, rgb.g, rgb.b);
    let stroke = Stroke::new((annotation.stroke.width as f32 * zoom).max(1.0), color);
    let dashed = annotation.stroke.dashed;

    match annotation.shape {
        Shape::Line { p0, p1 } => {
            let points = [
                frame_to_screen(p0, panel, viewport),
                frame_to_screen(p1, panel, viewport),
            ];
            if dashed {
                painter.extend(egui::Shape::dashed_line(&points, stroke, DASH_LENGTH, GAP_LENGTH));
            } else {
                painter.line_segment(points, stroke);
            }
        }
        Shape::Circle {
            center,
            radius_point,
        } => {
            let c = frame_to_screen(center, panel, viewport);
            let radius = center.distance(radius_point) as f32 * zoom;
            if dashed {
                let points: Vec<Pos2> = (0..=CIRCLE_SEGMENTS)
                    .map(|i| {
                        let a = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
                        c + Vec2::new(a.cos(), a.sin()) * radius
                    })
                    .collect();
                painter.extend(egui::Shape::dashed_line(&points, stroke, DASH_LENGTH, GAP_LENGTH));
            } else {
                painter.circle_stroke(c, radius, stroke);
            }
        }
    }

    let label = &annotation.label;
    let l = label.color;
    let (pos, align) = label_placement(label, panel, viewport);
    painter.text(
        pos,
        align,
        &label.text,
        FontId::proportional((label.font_size as f32 * zoom).max(8.0)),
        Color32::from_rgb(l.r, l.g, l.b),
    );
}

/// The label's top-left corner sits on its anchor.
fn label_placement(label: &Label, panel: Rect, viewport: &Viewport) -> (Pos2, Align2) {
    (frame_to_screen(label.anchor, panel, viewport), Align2::LEFT_TOP)
}

#[cfg(test)]
mod tests {
    use vernier_core::measure::Color;

    use super::*;

    fn fitted_viewport() -> Viewport {
        let mut viewport = Viewport::new();
        viewport.frame_resized(100, 50);
        viewport.fit(200.0, 100.0);
        viewport
    }

    #[test]
    fn test_label_top_left_at_anchor() {
        let panel = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(200.0, 100.0));
        let label = Label {
            text: "L: 10 px, 1.00 mm".into(),
            anchor: Point::new(5.0, 5.0),
            color: Color::RED,
            font_size: 10,
        };

        let (pos, align) = label_placement(&label, panel, &fitted_viewport());
        assert_eq!(pos, Pos2::new(20.0, 30.0));
        assert_eq!(align, Align2::LEFT_TOP);
    }

    #[test]
    fn test_screen_frame_mapping_round_trips() {
        let panel = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(200.0, 100.0));
        let viewport = fitted_viewport();
        let point = screen_to_frame(Pos2::new(110.0, 70.0), panel, &viewport);
        assert_eq!(point, Point::new(50.0, 25.0));
        assert_eq!(frame_to_screen(point, panel, &viewport), Pos2::new(110.0, 70.0));
    }
}
