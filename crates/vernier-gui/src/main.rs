mod app;
mod convert;
mod panels;
mod state;

use std::path::PathBuf;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Optional config path as the only argument.
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Vernier"),
        ..Default::default()
    };

    eframe::run_native(
        "Vernier",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::VernierApp::new(
                &cc.egui_ctx,
                config_path.as_deref(),
            )))
        }),
    )
}
