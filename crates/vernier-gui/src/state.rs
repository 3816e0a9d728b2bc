use std::path::PathBuf;

use vernier_core::config::ViewerConfig;
use vernier_core::source::VideoFormat;

const MAX_LOG_MESSAGES: usize = 200;

/// Results of file dialogs, which run on their own threads.
pub enum DialogResult {
    SnapshotPath(PathBuf),
    ConfigImported(Box<ViewerConfig>),
    ConfigExportPath(PathBuf),
    Error(String),
}

pub struct UiState {
    pub log_messages: Vec<String>,
    /// Identifiers across all sources, from the last SourcesChanged event.
    pub source_names: Vec<String>,
    pub selected_source: Option<String>,
    /// Formats of the active source, from the last FormatsChanged event.
    pub formats: Vec<VideoFormat>,
    pub selected_format: Option<usize>,
    pub stream_input: String,
    pub frame_size: Option<(u32, u32)>,
    pub show_about: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            log_messages: Vec::new(),
            source_names: Vec::new(),
            selected_source: None,
            formats: Vec::new(),
            selected_format: None,
            stream_input: "http://".into(),
            frame_size: None,
            show_about: false,
        }
    }
}

impl UiState {
    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
        if self.log_messages.len() > MAX_LOG_MESSAGES {
            let excess = self.log_messages.len() - MAX_LOG_MESSAGES;
            self.log_messages.drain(..excess);
        }
    }
}

#[derive(Default)]
pub struct ViewportState {
    pub texture: Option<egui::TextureHandle>,
    /// `frames_shown` of the viewer when the texture was uploaded.
    pub texture_frame: u64,
}
