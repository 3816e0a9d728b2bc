use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::{Result, VernierError};
use crate::frame::Frame;

use super::mailbox::FrameMailbox;
use super::worker::{CancelToken, ReadyNotifier, SourceWorker};
use super::{lock, FrameSource, ReadySignal, SourceKind, SourceReady, VideoFormat};

/// Back-off after a failed frame read before trying again.
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Poll period while no capture stream is open.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// A capture target reported by a [`CaptureBackend`].
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureDevice {
    /// Backend-specific stable identifier.
    pub id: String,
    /// Human-readable name, used as the identifier shown to the operator.
    pub description: String,
    pub formats: Vec<VideoFormat>,
}

impl CaptureDevice {
    fn matches(&self, identifier: &str) -> bool {
        self.description == identifier || self.id == identifier
    }
}

/// Platform capture layer: device enumeration and opening.
pub trait CaptureBackend: Send {
    fn name(&self) -> &str;

    fn enumerate(&mut self) -> Result<Vec<CaptureDevice>>;

    /// Open `device` with `format`, or the device default when `None`.
    fn open(
        &mut self,
        device: &CaptureDevice,
        format: Option<VideoFormat>,
    ) -> Result<Box<dyn CaptureStream>>;
}

/// An open capture session. Lives on the worker thread only.
pub trait CaptureStream {
    /// Block until the next frame is delivered. Must return within roughly
    /// one frame interval so the worker can observe cancellation.
    fn next_frame(&mut self) -> Result<Frame>;
}

#[derive(Default)]
struct DeviceState {
    devices: Vec<CaptureDevice>,
    selected: Option<usize>,
    format: Option<usize>,
    /// Bumped whenever the selection changes; the worker reopens on change.
    generation: u64,
}

impl DeviceState {
    fn device(&self) -> Option<&CaptureDevice> {
        self.selected.and_then(|i| self.devices.get(i))
    }

    fn format(&self) -> Option<VideoFormat> {
        let device = self.device()?;
        self.format.and_then(|i| device.formats.get(i).copied())
    }

    fn target(&self) -> Option<(CaptureDevice, Option<VideoFormat>)> {
        self.device().map(|d| (d.clone(), self.format()))
    }
}

/// Frame source backed by a local capture device.
pub struct DeviceSource {
    backend: Arc<Mutex<Box<dyn CaptureBackend>>>,
    backend_name: String,
    state: Arc<Mutex<DeviceState>>,
    mailbox: Arc<FrameMailbox>,
    worker: SourceWorker,
    preferred_device: Option<String>,
    preferred_format: Option<usize>,
}

impl DeviceSource {
    pub fn new(backend: impl CaptureBackend + 'static) -> Self {
        let backend_name = backend.name().to_string();
        Self {
            backend: Arc::new(Mutex::new(Box::new(backend))),
            backend_name,
            state: Arc::new(Mutex::new(DeviceState::default())),
            mailbox: Arc::new(FrameMailbox::new()),
            worker: SourceWorker::new(),
            preferred_device: None,
            preferred_format: None,
        }
    }

    /// Device to open at start instead of the first one enumerated.
    pub fn with_preferred_device(mut self, identifier: impl Into<String>) -> Self {
        self.preferred_device = Some(identifier.into());
        self
    }

    /// Format index to open at start instead of the first one.
    pub fn with_preferred_format(mut self, index: usize) -> Self {
        self.preferred_format = Some(index);
        self
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Description of the device the worker is capturing from.
    pub fn current_device(&self) -> Option<String> {
        lock(&self.state).device().map(|d| d.description.clone())
    }
}

impl FrameSource for DeviceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Device
    }

    fn list_available(&self) -> Vec<String> {
        lock(&self.state)
            .devices
            .iter()
            .map(|d| d.description.clone())
            .collect()
    }

    fn select(&mut self, identifier: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let index = state
            .devices
            .iter()
            .position(|d| d.matches(identifier))
            .ok_or_else(|| VernierError::UnknownDevice(identifier.to_string()))?;

        state.selected = Some(index);
        state.format = (!state.devices[index].formats.is_empty()).then_some(0);
        state.generation += 1;
        info!(device = identifier, "Capture device selected");

        self.preferred_device = Some(identifier.to_string());
        self.preferred_format = None;
        Ok(())
    }

    fn list_formats(&self) -> Vec<VideoFormat> {
        lock(&self.state)
            .device()
            .map(|d| d.formats.clone())
            .unwrap_or_default()
    }

    fn select_format(&mut self, index: usize) {
        let mut state = lock(&self.state);
        let Some(format) = state.device().and_then(|d| d.formats.get(index).copied()) else {
            let available = state.device().map_or(0, |d| d.formats.len());
            warn!(index, available, "Format index out of range, ignored");
            return;
        };
        state.format = Some(index);
        state.generation += 1;
        drop(state);
        info!(%format, "Capture format selected");

        self.preferred_format = Some(index);
    }

    fn current_format(&self) -> Option<VideoFormat> {
        lock(&self.state).format()
    }

    fn start(&mut self) -> Option<ReadySignal> {
        if self.worker.is_running() {
            return None;
        }

        self.mailbox.clear();
        let ctx = DeviceWorker {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
            mailbox: Arc::clone(&self.mailbox),
            preferred_device: self.preferred_device.clone(),
            preferred_format: self.preferred_format,
        };
        info!(backend = %self.backend_name, "Starting device source");
        self.worker
            .start("vernier-device", move |cancel, ready| ctx.run(cancel, ready))
    }

    fn stop(&mut self) {
        if self.worker.is_running() {
            self.worker.stop();
            info!(backend = %self.backend_name, "Device source stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    fn mailbox(&self) -> &FrameMailbox {
        &self.mailbox
    }
}

/// Everything the device worker thread owns or shares.
struct DeviceWorker {
    backend: Arc<Mutex<Box<dyn CaptureBackend>>>,
    state: Arc<Mutex<DeviceState>>,
    mailbox: Arc<FrameMailbox>,
    preferred_device: Option<String>,
    preferred_format: Option<usize>,
}

impl DeviceWorker {
    fn run(self, cancel: CancelToken, ready: ReadyNotifier) {
        let Some((generation, device, format, ready_info)) = self.setup() else {
            return;
        };

        let mut stream = match self.open(&device, format) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(device = %device.description, error = %e, "Failed to open capture device");
                return;
            }
        };
        ready.notify(ready_info);

        let mut seen_generation = generation;
        let mut sequence = 0u64;
        while !cancel.is_cancelled() {
            if let Some((next_generation, target)) = self.selection_changed(seen_generation) {
                seen_generation = next_generation;
                // Release the old session before opening the next one.
                drop(stream.take());
                if let Some((device, format)) = target {
                    stream = match self.open(&device, format) {
                        Ok(stream) => Some(stream),
                        Err(e) => {
                            warn!(
                                device = %device.description,
                                error = %e,
                                "Failed to reopen capture device"
                            );
                            None
                        }
                    };
                }
            }

            match stream.as_mut() {
                Some(stream) => match stream.next_frame() {
                    Ok(frame) => {
                        sequence += 1;
                        self.mailbox.publish(frame.to_bgra().with_sequence(sequence));
                        trace!(sequence, "Device frame published");
                    }
                    Err(e) => {
                        debug!(error = %e, "Dropped device frame");
                        if cancel.wait(READ_RETRY_DELAY) {
                            break;
                        }
                    }
                },
                None => {
                    if cancel.wait(IDLE_POLL) {
                        break;
                    }
                }
            }
        }
    }

    /// Enumerate devices and pick the initial selection.
    #[allow(clippy::type_complexity)]
    fn setup(&self) -> Option<(u64, CaptureDevice, Option<VideoFormat>, SourceReady)> {
        let devices = match lock(&self.backend).enumerate() {
            Ok(devices) if !devices.is_empty() => devices,
            Ok(_) => {
                warn!("No capture devices found");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Capture device enumeration failed");
                return None;
            }
        };

        let selected = self
            .preferred_device
            .as_deref()
            .and_then(|p| devices.iter().position(|d| d.matches(p)))
            .unwrap_or(0);
        let format_count = devices[selected].formats.len();
        let format = match self.preferred_format {
            Some(i) if i < format_count => Some(i),
            _ if format_count > 0 => Some(0),
            _ => None,
        };

        let ready = SourceReady {
            devices: devices.iter().map(|d| d.description.clone()).collect(),
            formats: devices[selected].formats.clone(),
        };
        debug!(count = devices.len(), "Capture devices enumerated");

        let mut state = lock(&self.state);
        state.devices = devices;
        state.selected = Some(selected);
        state.format = format;
        let (device, format) = state.target()?;
        Some((state.generation, device, format, ready))
    }

    fn open(
        &self,
        device: &CaptureDevice,
        format: Option<VideoFormat>,
    ) -> Result<Box<dyn CaptureStream>> {
        let stream = lock(&self.backend).open(device, format)?;
        info!(
            device = %device.description,
            format = %format.map(|f| f.to_string()).unwrap_or_else(|| "default".into()),
            "Capture device opened"
        );
        Ok(stream)
    }

    #[allow(clippy::type_complexity)]
    fn selection_changed(
        &self,
        seen: u64,
    ) -> Option<(u64, Option<(CaptureDevice, Option<VideoFormat>)>)> {
        let state = lock(&self.state);
        (state.generation != seen).then(|| (state.generation, state.target()))
    }
}
