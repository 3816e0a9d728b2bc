use crate::app::VernierApp;

pub fn show(ctx: &egui::Context, app: &VernierApp) {
    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.horizontal(|ui| {
            match app.ui_state.frame_size {
                Some((w, h)) => ui.label(format!("{w}x{h}")),
                None => ui.label("No frame"),
            };
            ui.separator();
            ui.label(format!("Zoom: {:.0}%", app.viewer.viewport().zoom() * 100.0));
            ui.separator();
            ui.label(format!("Frames: {}", app.viewer.frames_shown()));
            ui.separator();
            let engine = app.viewer.engine();
            ui.label(format!("Mode: {}", engine.mode()));
            if let Some(temp) = engine.temporary() {
                ui.separator();
                ui.label(&temp.label.text);
            } else if let Some(center) = engine.pending_center() {
                ui.separator();
                ui.label(format!("Center {center}"));
            }

            if let Some(msg) = app.ui_state.log_messages.last() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(msg).weak());
                });
            }
        });
    });
}
