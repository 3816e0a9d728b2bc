use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use tracing::{info, warn};
use vernier_core::config::ViewerConfig;
use vernier_core::transform::StageKind;
use vernier_core::viewer::{VideoViewer, ViewerEvent};

use crate::convert::frame_to_color_image;
use crate::panels;
use crate::state::{DialogResult, UiState, ViewportState};

pub struct VernierApp {
    pub viewer: VideoViewer,
    pub config: ViewerConfig,
    pub ui_state: UiState,
    pub viewport: ViewportState,
    events: mpsc::Receiver<ViewerEvent>,
    dialog_tx: mpsc::Sender<DialogResult>,
    dialog_rx: mpsc::Receiver<DialogResult>,
}

impl VernierApp {
    pub fn new(_ctx: &egui::Context, config_path: Option<&Path>) -> Self {
        let mut ui_state = UiState::default();
        let config = match config_path {
            Some(path) => match ViewerConfig::load(path) {
                Ok(config) => {
                    ui_state.add_log(format!("Loaded config {}", path.display()));
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), "Config load failed: {e}");
                    ui_state.add_log(format!("Config load failed: {e}"));
                    ViewerConfig::default()
                }
            },
            None => ViewerConfig::default(),
        };

        let mut viewer = VideoViewer::from_config(&config);
        let events = viewer.subscribe();
        viewer.start();
        let (dialog_tx, dialog_rx) = mpsc::channel();

        Self {
            viewer,
            config,
            ui_state,
            viewport: ViewportState::default(),
            events,
            dialog_tx,
            dialog_rx,
        }
    }

    /// Sender handed to dialog threads.
    pub fn dialog_sender(&self) -> mpsc::Sender<DialogResult> {
        self.dialog_tx.clone()
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ViewerEvent::SourcesChanged(names) => {
                    if self.ui_state.selected_source.is_none() {
                        self.ui_state.selected_source = names.first().cloned();
                    }
                    self.ui_state.source_names = names;
                }
                ViewerEvent::FormatsChanged(formats) => {
                    self.ui_state.formats = formats;
                    self.ui_state.selected_format = None;
                }
                ViewerEvent::FrameResized { width, height } => {
                    self.ui_state.frame_size = Some((width, height));
                    self.ui_state.add_log(format!("Frame size {width}x{height}"));
                }
            }
        }
    }

    fn poll_dialogs(&mut self) {
        while let Ok(result) = self.dialog_rx.try_recv() {
            match result {
                DialogResult::SnapshotPath(path) => match self.viewer.snapshot(&path) {
                    Ok(()) => self
                        .ui_state
                        .add_log(format!("Saved snapshot {}", path.display())),
                    Err(e) => self.ui_state.add_log(format!("Snapshot failed: {e}")),
                },
                DialogResult::ConfigImported(config) => self.apply_config(*config),
                DialogResult::ConfigExportPath(path) => {
                    match self.current_config().save(&path) {
                        Ok(()) => self
                            .ui_state
                            .add_log(format!("Exported config {}", path.display())),
                        Err(e) => self.ui_state.add_log(format!("Config export failed: {e}")),
                    }
                }
                DialogResult::Error(msg) => self.ui_state.add_log(msg),
            }
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context) {
        let shown = self.viewer.frames_shown();
        if shown == self.viewport.texture_frame {
            return;
        }
        let Some(frame) = self.viewer.current_frame() else {
            return;
        };
        let image = frame_to_color_image(frame);
        if let Some(texture) = &mut self.viewport.texture {
            texture.set(image, egui::TextureOptions::NEAREST);
        } else {
            self.viewport.texture =
                Some(ctx.load_texture("viewport", image, egui::TextureOptions::NEAREST));
        }
        self.viewport.texture_frame = shown;
    }

    /// Apply an imported config. Stage parameters take effect on restart.
    pub fn apply_config(&mut self, config: ViewerConfig) {
        self.viewer
            .set_calibration(config.calibration.to_calibration());
        self.viewer.set_draw_mode(config.draw_mode);
        self.viewer
            .set_transform_enabled(StageKind::EdgeDetect, config.transforms.edge_detect);
        self.viewer
            .set_transform_enabled(StageKind::GaussianBlur, config.transforms.blur);

        let known = self.viewer.available_sources();
        for locator in &config.network_sources {
            if !known.contains(locator) {
                self.viewer.add_network_source(locator);
            }
        }
        info!("Config applied");
        self.ui_state.add_log("Config imported".into());
        self.config = config;
    }

    /// The loaded config updated with the live settings.
    pub fn current_config(&self) -> ViewerConfig {
        let mut config = self.config.clone();
        let calibration = self.viewer.engine().calibration();
        config.calibration.mm_per_px_x = calibration.mm_per_px_x();
        config.calibration.mm_per_px_y = calibration.mm_per_px_y();
        config.draw_mode = self.viewer.engine().mode();
        config.transforms.edge_detect = self.viewer.transform_enabled(StageKind::EdgeDetect);
        config.transforms.blur = self.viewer.transform_enabled(StageKind::GaussianBlur);
        config.network_sources = (1..self.viewer.source_count())
            .filter_map(|i| self.viewer.source(i))
            .flat_map(|s| s.list_available())
            .collect();
        config
    }

    pub fn switch_source(&mut self, identifier: String) {
        match self.viewer.switch_source(&identifier) {
            Ok(()) => {
                self.ui_state.add_log(format!("Source: {identifier}"));
                self.ui_state.selected_source = Some(identifier);
            }
            Err(e) => self.ui_state.add_log(format!("Switch failed: {e}")),
        }
    }

    pub fn switch_format(&mut self, index: usize) {
        self.viewer.switch_format(index);
        self.ui_state.selected_format = Some(index);
        if let Some(format) = self.ui_state.formats.get(index) {
            self.ui_state.add_log(format!("Format: {format}"));
        }
    }

    pub fn add_stream(&mut self) {
        let locator = self.ui_state.stream_input.trim().to_string();
        if locator.is_empty() {
            return;
        }
        self.viewer.add_network_source(&locator);
        self.ui_state.add_log(format!("Added stream {locator}"));
    }
}

impl eframe::App for VernierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_dialogs();
        self.viewer.tick_if_due(Instant::now());
        self.drain_events();
        self.upload_frame(ctx);

        panels::menu_bar::show(ctx, self);
        panels::toolbar::show(ctx, self);
        panels::status::show(ctx, self);
        panels::viewport::show(ctx, self);

        if self.ui_state.show_about {
            egui::Window::new("About Vernier")
                .collapsible(false)
                .resizable(false)
                .open(&mut self.ui_state.show_about)
                .show(ctx, |ui| {
                    ui.heading("Vernier");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.label("Live video measurement viewer");
                });
        }

        ctx.request_repaint_after(self.viewer.ticker().until_next(Instant::now()));
    }
}
