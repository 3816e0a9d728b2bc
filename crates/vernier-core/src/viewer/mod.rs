//! The video viewer orchestrator.
//!
//! [`VideoViewer`] owns the frame sources, the transform chain, and the
//! measurement engine. A caller on the UI thread drives it with
//! [`tick`](VideoViewer::tick) at a fixed period; each tick takes the latest
//! frame of the active source, runs it through the chain, and keeps it for
//! display.

pub mod ticker;
pub mod viewport;

use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::{Result, VernierError};
use crate::frame::Frame;
use crate::io::save_frame;
use crate::measure::{Calibration, DrawMode, MeasurementEngine};
#[cfg(feature = "camera")]
use crate::source::NokhwaCapture;
#[cfg(not(feature = "camera"))]
use crate::source::SyntheticCapture;
use crate::source::{
    AnyDecoder, DeviceSource, FrameSource, NetworkSource, ReadyPoll, ReadySignal, StreamDecoder,
    VideoFormat,
};
use crate::transform::{StageKind, TransformChain};

pub use ticker::Ticker;
pub use viewport::Viewport;

/// Notifications for the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    /// Identifiers across all sources changed.
    SourcesChanged(Vec<String>),
    /// Formats of the active source changed.
    FormatsChanged(Vec<VideoFormat>),
    FrameResized { width: u32, height: u32 },
}

type DecoderFactory = Box<dyn Fn() -> Box<dyn StreamDecoder> + Send>;

/// Local capture source used when none is supplied.
pub fn default_device_source(config: &ViewerConfig) -> DeviceSource {
    #[cfg(feature = "camera")]
    let mut source = DeviceSource::new(NokhwaCapture::new());
    #[cfg(not(feature = "camera"))]
    let mut source = DeviceSource::new(SyntheticCapture::new());

    if let Some(preferred) = &config.device.preferred {
        source = source.with_preferred_device(preferred.clone());
    }
    if let Some(index) = config.device.format_index {
        source = source.with_preferred_format(index);
    }
    source
}

pub struct VideoViewer {
    /// Index 0 is the local device source; streams are appended after it.
    sources: Vec<Box<dyn FrameSource>>,
    active: usize,
    pending: Vec<(usize, ReadySignal)>,
    chain: TransformChain,
    engine: MeasurementEngine,
    viewport: Viewport,
    frame: Option<Frame>,
    frames_shown: u64,
    subscribers: Vec<mpsc::Sender<ViewerEvent>>,
    ticker: Ticker,
    decoder_factory: DecoderFactory,
    startup_streams: Vec<String>,
    clear_on_switch: bool,
}

impl VideoViewer {
    /// Build a viewer around `device` with settings from `config`. Nothing
    /// runs until [`start`](Self::start).
    pub fn new(device: impl FrameSource + 'static, config: &ViewerConfig) -> Self {
        let mut chain = TransformChain::with_settings(config.transforms.stage_settings());
        if config.transforms.blur {
            chain.add_kind(StageKind::GaussianBlur);
        }
        if config.transforms.edge_detect {
            chain.add_kind(StageKind::EdgeDetect);
        }

        let mut engine = MeasurementEngine::new(config.calibration.to_calibration());
        engine.set_mode(config.draw_mode);

        Self {
            sources: vec![Box::new(device)],
            active: 0,
            pending: Vec::new(),
            chain,
            engine,
            viewport: Viewport::new(),
            frame: None,
            frames_shown: 0,
            subscribers: Vec::new(),
            ticker: Ticker::new(config.frame_period()),
            decoder_factory: Box::new(|| Box::new(AnyDecoder::new())),
            startup_streams: config.network_sources.clone(),
            clear_on_switch: config.clear_on_switch,
        }
    }

    /// Viewer with the default local device source.
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(default_device_source(config), config)
    }

    /// Decoder constructor used by [`add_network_source`](Self::add_network_source).
    pub fn with_decoder_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn StreamDecoder> + Send + 'static,
    {
        self.decoder_factory = Box::new(factory);
        self
    }

    /// Start every source and add the configured network streams.
    pub fn start(&mut self) {
        for index in 0..self.sources.len() {
            self.start_source(index);
        }
        for locator in std::mem::take(&mut self.startup_streams) {
            self.add_network_source(&locator);
        }
        info!(sources = self.sources.len(), "Viewer started");
    }

    fn start_source(&mut self, index: usize) {
        if let Some(signal) = self.sources[index].start() {
            self.pending.push((index, signal));
        }
    }

    /// Subscribe to viewer notifications.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ViewerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: ViewerEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// One consumption cycle. Returns `true` when a new frame was taken.
    pub fn tick(&mut self) -> bool {
        self.poll_ready();

        let Some(source) = self.sources.get(self.active) else {
            return false;
        };
        if !source.is_ready() {
            return false;
        }
        let Some(frame) = source.get_frame() else {
            return false;
        };

        let shown = self.chain.apply(&frame);
        let (width, height) = shown.dimensions();
        let resized = self.frame.as_ref().map(Frame::dimensions) != Some((width, height));
        self.frame = Some(shown);
        self.frames_shown += 1;

        if resized {
            self.engine.scale_for_frame_width(width);
            self.viewport.frame_resized(width, height);
            info!(width, height, "Frame size changed");
            self.emit(ViewerEvent::FrameResized { width, height });
        }
        true
    }

    /// Run [`tick`](Self::tick) if the fixed period has elapsed.
    pub fn tick_if_due(&mut self, now: Instant) -> bool {
        self.ticker.due(now) && self.tick()
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    fn poll_ready(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let mut changed = false;
        let mut active_formats = None;
        let active = self.active;
        self.pending.retain(|(index, signal)| match signal.poll() {
            ReadyPoll::Pending => true,
            ReadyPoll::Ready(ready) => {
                debug!(source = index, devices = ready.devices.len(), "Source ready");
                changed = true;
                if *index == active {
                    active_formats = Some(ready.formats);
                }
                false
            }
            ReadyPoll::Failed => {
                warn!(source = index, "Source setup failed");
                false
            }
        });

        if changed {
            let available = self.available_sources();
            self.emit(ViewerEvent::SourcesChanged(available));
        }
        if let Some(formats) = active_formats {
            self.emit(ViewerEvent::FormatsChanged(formats));
        }
    }

    /// Identifiers offered by all sources, in source order.
    pub fn available_sources(&self) -> Vec<String> {
        self.sources
            .iter()
            .flat_map(|s| s.list_available())
            .collect()
    }

    pub fn formats(&self) -> Vec<VideoFormat> {
        self.sources
            .get(self.active)
            .map(|s| s.list_formats())
            .unwrap_or_default()
    }

    /// Make the source offering `identifier` active and select it there.
    pub fn switch_source(&mut self, identifier: &str) -> Result<()> {
        let Some(index) = self
            .sources
            .iter()
            .position(|s| s.list_available().iter().any(|id| id == identifier))
        else {
            warn!(identifier, "No source offers this identifier");
            return Err(VernierError::UnknownDevice(identifier.to_string()));
        };

        self.sources[index].select(identifier)?;
        self.active = index;
        if self.clear_on_switch {
            self.engine.clear_all();
        }
        info!(identifier, source = index, "Switched source");

        let formats = self.sources[index].list_formats();
        self.emit(ViewerEvent::FormatsChanged(formats));
        Ok(())
    }

    /// Select a format of the active source. Out-of-range indices are ignored.
    /// Annotations are cleared only if the produced format changes.
    pub fn switch_format(&mut self, index: usize) {
        let Some(source) = self.sources.get_mut(self.active) else {
            return;
        };
        let before = source.current_format();
        source.select_format(index);
        if source.current_format() != before && self.clear_on_switch {
            self.engine.clear_all();
        }
    }

    /// Create, start, and append a network source. Returns its index.
    ///
    /// Sources are never removed.
    pub fn add_network_source(&mut self, locator: &str) -> usize {
        let mut source = NetworkSource::new((self.decoder_factory)());
        source.set_endpoint(locator);
        self.sources.push(Box::new(source));

        let index = self.sources.len() - 1;
        self.start_source(index);
        info!(locator, source = index, "Network source added");
        index
    }

    pub fn set_transform_enabled(&mut self, kind: StageKind, enabled: bool) {
        if enabled {
            self.chain.add_kind(kind);
        } else {
            self.chain.remove_kind(kind);
        }
    }

    pub fn transform_enabled(&self, kind: StageKind) -> bool {
        self.chain.contains_kind(kind)
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.engine.set_mode(mode);
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.engine.set_calibration(calibration);
    }

    pub fn clear_annotations(&mut self) {
        self.engine.clear_all();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn fit_to_view(&mut self, width: f32, height: f32) {
        self.viewport.fit(width, height);
    }

    /// Write the displayed frame, with transforms applied, as PNG.
    pub fn snapshot(&self, path: &Path) -> Result<()> {
        let frame = self.frame.as_ref().ok_or(VernierError::NoFrame)?;
        save_frame(frame, path)
    }

    /// The most recent frame after transforms.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    pub fn active_source(&self) -> usize {
        self.active
    }

    pub fn source(&self, index: usize) -> Option<&dyn FrameSource> {
        self.sources.get(index).map(|s| s.as_ref())
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn engine(&self) -> &MeasurementEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MeasurementEngine {
        &mut self.engine
    }

    pub fn chain(&self) -> &TransformChain {
        &self.chain
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Stop every source and wait for their workers.
    pub fn shutdown(&mut self) {
        for source in &mut self.sources {
            source.stop();
        }
        self.pending.clear();
    }
}

impl Drop for VideoViewer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
