use vernier_core::config::ViewerConfig;

use crate::app::VernierApp;
use crate::state::DialogResult;

pub fn show(ctx: &egui::Context, app: &mut VernierApp) {
    let snapshot_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S);
    let quit_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q);

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui
                    .add(
                        egui::Button::new("Save Snapshot...")
                            .shortcut_text(ctx.format_shortcut(&snapshot_shortcut)),
                    )
                    .clicked()
                {
                    ui.close();
                    save_snapshot(app);
                }

                ui.separator();

                if ui.button("Import Config...").clicked() {
                    ui.close();
                    import_config(app);
                }
                if ui.button("Export Config...").clicked() {
                    ui.close();
                    export_config(app);
                }

                ui.separator();

                if ui
                    .add(
                        egui::Button::new("Quit")
                            .shortcut_text(ctx.format_shortcut(&quit_shortcut)),
                    )
                    .clicked()
                {
                    ui.close();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                if ui.button("Clear Annotations").clicked() {
                    ui.close();
                    app.viewer.clear_annotations();
                }
                if ui.button("Reset Defaults").clicked() {
                    ui.close();
                    app.apply_config(ViewerConfig::default());
                }
            });

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    ui.close();
                    app.ui_state.show_about = true;
                }
            });
        });

        if ctx.input_mut(|i| i.consume_shortcut(&snapshot_shortcut)) {
            save_snapshot(app);
        }
        if ctx.input_mut(|i| i.consume_shortcut(&quit_shortcut)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

fn save_snapshot(app: &mut VernierApp) {
    if app.viewer.current_frame().is_none() {
        app.ui_state.add_log("No frame to save".into());
        return;
    }
    let tx = app.dialog_sender();
    std::thread::spawn(move || {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("snapshot.png")
            .save_file()
        {
            let _ = tx.send(DialogResult::SnapshotPath(path));
        }
    });
}

fn import_config(app: &mut VernierApp) {
    let tx = app.dialog_sender();
    std::thread::spawn(move || {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("TOML", &["toml"])
            .pick_file()
        else {
            return;
        };
        let result = match ViewerConfig::load(&path) {
            Ok(config) => DialogResult::ConfigImported(Box::new(config)),
            Err(e) => DialogResult::Error(format!("Config import failed: {e}")),
        };
        let _ = tx.send(result);
    });
}

fn export_config(app: &mut VernierApp) {
    let tx = app.dialog_sender();
    std::thread::spawn(move || {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("TOML", &["toml"])
            .set_file_name("vernier.toml")
            .save_file()
        {
            let _ = tx.send(DialogResult::ConfigExportPath(path));
        }
    });
}
