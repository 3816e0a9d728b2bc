use vernier_core::measure::{Calibration, DrawMode};
use vernier_core::transform::StageKind;

use crate::app::VernierApp;

pub fn show(ctx: &egui::Context, app: &mut VernierApp) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            source_controls(ui, app);
            ui.separator();
            transform_controls(ui, app);
            ui.separator();
            measure_controls(ui, app);
            ui.separator();
            zoom_controls(ui, app);
        });
        ui.horizontal(|ui| {
            ui.label("Stream:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut app.ui_state.stream_input).desired_width(320.0),
            );
            let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Add").clicked() || entered {
                app.add_stream();
            }
        });
    });
}

fn source_controls(ui: &mut egui::Ui, app: &mut VernierApp) {
    let mut chosen_source = None;
    let current = app
        .ui_state
        .selected_source
        .clone()
        .unwrap_or_else(|| "None".into());
    egui::ComboBox::from_id_salt("source")
        .selected_text(current)
        .width(200.0)
        .show_ui(ui, |ui| {
            for name in &app.ui_state.source_names {
                let selected = app.ui_state.selected_source.as_deref() == Some(name.as_str());
                if ui.selectable_label(selected, name).clicked() {
                    chosen_source = Some(name.clone());
                }
            }
        });
    if let Some(name) = chosen_source {
        app.switch_source(name);
    }

    let mut chosen_format = None;
    let current = app
        .ui_state
        .selected_format
        .and_then(|i| app.ui_state.formats.get(i))
        .map(|f| f.to_string())
        .unwrap_or_else(|| "Format".into());
    ui.add_enabled_ui(!app.ui_state.formats.is_empty(), |ui| {
        egui::ComboBox::from_id_salt("format")
            .selected_text(current)
            .show_ui(ui, |ui| {
                for (i, format) in app.ui_state.formats.iter().enumerate() {
                    let selected = app.ui_state.selected_format == Some(i);
                    if ui.selectable_label(selected, format.to_string()).clicked() {
                        chosen_format = Some(i);
                    }
                }
            });
    });
    if let Some(index) = chosen_format {
        app.switch_format(index);
    }
}

fn transform_controls(ui: &mut egui::Ui, app: &mut VernierApp) {
    for kind in [StageKind::EdgeDetect, StageKind::GaussianBlur] {
        let mut enabled = app.viewer.transform_enabled(kind);
        if ui.checkbox(&mut enabled, kind.to_string()).changed() {
            app.viewer.set_transform_enabled(kind, enabled);
        }
    }
}

fn measure_controls(ui: &mut egui::Ui, app: &mut VernierApp) {
    let mut mode = app.viewer.engine().mode();
    let before = mode;
    ui.selectable_value(&mut mode, DrawMode::None, "Pointer");
    ui.selectable_value(&mut mode, DrawMode::Line, "Line");
    ui.selectable_value(&mut mode, DrawMode::Circle, "Circle");
    if mode != before {
        app.viewer.set_draw_mode(mode);
    }

    let calibration = app.viewer.engine().calibration();
    let mut x = calibration.mm_per_px_x();
    let mut y = calibration.mm_per_px_y();
    ui.label("mm/px X:");
    let changed_x = ui
        .add(egui::DragValue::new(&mut x).speed(0.001).range(0.001..=1000.0).max_decimals(4))
        .changed();
    ui.label("Y:");
    let changed_y = ui
        .add(egui::DragValue::new(&mut y).speed(0.001).range(0.001..=1000.0).max_decimals(4))
        .changed();
    if changed_x || changed_y {
        app.viewer.set_calibration(Calibration::new(x, y));
    }

    if ui.button("Clear").clicked() {
        app.viewer.clear_annotations();
    }
}

fn zoom_controls(ui: &mut egui::Ui, app: &mut VernierApp) {
    if ui.button("-").on_hover_text("Zoom out").clicked() {
        app.viewer.zoom_out();
    }
    if ui.button("+").on_hover_text("Zoom in").clicked() {
        app.viewer.zoom_in();
    }
    if ui.button("Fit").clicked() {
        if let Some((w, h)) = app.viewer.viewport().view_size() {
            app.viewer.fit_to_view(w, h);
        }
    }
}
