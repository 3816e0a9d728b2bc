use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::consts::STREAM_POLL_PERIOD_MS;
use crate::error::{Result, VernierError};
use crate::frame::Frame;
use crate::viewer::Ticker;

#[cfg(feature = "http-stream")]
use super::http::HttpSnapshotDecoder;
use super::mailbox::FrameMailbox;
use super::synthetic::SyntheticDecoder;
use super::worker::{CancelToken, ReadyNotifier, SourceWorker};
use super::{lock, FrameSource, ReadySignal, SourceKind, SourceReady, VideoFormat};

/// Opens remote streams by locator.
pub trait StreamDecoder: Send {
    fn open(&mut self, locator: &str) -> Result<Box<dyn DecodedStream>>;
}

impl<D: StreamDecoder + ?Sized> StreamDecoder for Box<D> {
    fn open(&mut self, locator: &str) -> Result<Box<dyn DecodedStream>> {
        (**self).open(locator)
    }
}

/// An open remote stream. Lives on the worker thread only.
pub trait DecodedStream {
    /// Read the next decoded frame. A failure affects this read only.
    fn read(&mut self) -> Result<Frame>;

    /// Resolution advertised by the stream, if known up front.
    fn resolution(&self) -> Option<VideoFormat>;
}

/// Decoder that dispatches on the locator scheme.
#[derive(Default)]
pub struct AnyDecoder {
    synthetic: SyntheticDecoder,
    #[cfg(feature = "http-stream")]
    http: HttpSnapshotDecoder,
}

impl AnyDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamDecoder for AnyDecoder {
    fn open(&mut self, locator: &str) -> Result<Box<dyn DecodedStream>> {
        if SyntheticDecoder::accepts(locator) {
            return self.synthetic.open(locator);
        }
        #[cfg(feature = "http-stream")]
        if HttpSnapshotDecoder::accepts(locator) {
            return self.http.open(locator);
        }
        Err(VernierError::SetupFailed(format!(
            "no decoder for stream locator '{locator}'"
        )))
    }
}

#[derive(Default)]
struct StreamState {
    locator: String,
    format: Option<VideoFormat>,
    generation: u64,
}

/// Frame source backed by a remote stream.
pub struct NetworkSource {
    decoder: Arc<Mutex<Box<dyn StreamDecoder>>>,
    state: Arc<Mutex<StreamState>>,
    mailbox: Arc<FrameMailbox>,
    worker: SourceWorker,
    poll_period: Duration,
}

impl NetworkSource {
    pub fn new(decoder: impl StreamDecoder + 'static) -> Self {
        Self {
            decoder: Arc::new(Mutex::new(Box::new(decoder))),
            state: Arc::new(Mutex::new(StreamState::default())),
            mailbox: Arc::new(FrameMailbox::new()),
            worker: SourceWorker::new(),
            poll_period: Duration::from_millis(STREAM_POLL_PERIOD_MS),
        }
    }

    pub fn with_endpoint(mut self, locator: &str) -> Self {
        self.set_endpoint(locator);
        self
    }

    /// Interval between stream reads.
    pub fn with_poll_period(mut self, period: Duration) -> Self {
        self.poll_period = period;
        self
    }

    pub fn endpoint(&self) -> String {
        lock(&self.state).locator.clone()
    }
}

impl FrameSource for NetworkSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Network
    }

    fn list_available(&self) -> Vec<String> {
        let state = lock(&self.state);
        if state.locator.is_empty() {
            Vec::new()
        } else {
            vec![state.locator.clone()]
        }
    }

    fn select(&mut self, identifier: &str) -> Result<()> {
        let state = lock(&self.state);
        if !state.locator.is_empty() && state.locator == identifier {
            Ok(())
        } else {
            Err(VernierError::UnknownDevice(identifier.to_string()))
        }
    }

    fn list_formats(&self) -> Vec<VideoFormat> {
        lock(&self.state).format.into_iter().collect()
    }

    fn select_format(&mut self, index: usize) {
        let available = self.list_formats().len();
        if index < available {
            debug!(index, "Stream resolution is fixed by the remote end");
        } else {
            warn!(index, available, "Format index out of range, ignored");
        }
    }

    fn current_format(&self) -> Option<VideoFormat> {
        lock(&self.state).format
    }

    fn set_endpoint(&mut self, locator: &str) {
        let mut state = lock(&self.state);
        if state.locator == locator {
            return;
        }
        state.locator = locator.to_string();
        state.format = None;
        state.generation += 1;
        info!(locator, "Stream endpoint set");
    }

    fn start(&mut self) -> Option<ReadySignal> {
        if self.worker.is_running() {
            return None;
        }

        self.mailbox.clear();
        let ctx = StreamWorker {
            decoder: Arc::clone(&self.decoder),
            state: Arc::clone(&self.state),
            mailbox: Arc::clone(&self.mailbox),
            poll_period: self.poll_period,
        };
        info!(locator = %self.endpoint(), "Starting network source");
        self.worker
            .start("vernier-stream", move |cancel, ready| ctx.run(cancel, ready))
    }

    fn stop(&mut self) {
        if self.worker.is_running() {
            self.worker.stop();
            info!("Network source stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    fn mailbox(&self) -> &FrameMailbox {
        &self.mailbox
    }
}

struct StreamWorker {
    decoder: Arc<Mutex<Box<dyn StreamDecoder>>>,
    state: Arc<Mutex<StreamState>>,
    mailbox: Arc<FrameMailbox>,
    poll_period: Duration,
}

impl StreamWorker {
    fn run(self, cancel: CancelToken, ready: ReadyNotifier) {
        let (mut seen_generation, locator) = {
            let state = lock(&self.state);
            (state.generation, state.locator.clone())
        };
        if locator.is_empty() {
            warn!("Network source started without an endpoint");
            return;
        }

        let mut stream = match self.open(&locator) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(%locator, error = %e, "Failed to open stream");
                return;
            }
        };
        ready.notify(SourceReady {
            devices: vec![locator],
            formats: self.list_formats(),
        });

        let mut sequence = 0u64;
        let mut ticker = Ticker::new(self.poll_period);
        ticker.due(Instant::now());
        loop {
            if cancel.wait(ticker.until_next(Instant::now())) {
                break;
            }
            if !ticker.due(Instant::now()) {
                continue;
            }

            if let Some((generation, locator)) = self.endpoint_changed(seen_generation) {
                seen_generation = generation;
                drop(stream.take());
                if !locator.is_empty() {
                    stream = match self.open(&locator) {
                        Ok(stream) => Some(stream),
                        Err(e) => {
                            warn!(%locator, error = %e, "Failed to reopen stream");
                            None
                        }
                    };
                }
            }

            let Some(stream) = stream.as_mut() else {
                continue;
            };
            match stream.read() {
                Ok(frame) => {
                    sequence += 1;
                    let frame = frame.to_bgra().with_sequence(sequence);
                    self.record_resolution(&frame);
                    self.mailbox.publish(frame);
                    trace!(sequence, "Stream frame published");
                }
                Err(e) => debug!(error = %e, "Skipped stream frame"),
            }
        }
    }

    fn open(&self, locator: &str) -> Result<Box<dyn DecodedStream>> {
        let stream = lock(&self.decoder).open(locator)?;
        let mut state = lock(&self.state);
        state.format = stream.resolution();
        info!(locator, format = ?state.format, "Stream opened");
        Ok(stream)
    }

    fn list_formats(&self) -> Vec<VideoFormat> {
        lock(&self.state).format.into_iter().collect()
    }

    fn record_resolution(&self, frame: &Frame) {
        let mut state = lock(&self.state);
        if state.format.is_none() {
            state.format = Some(VideoFormat::new(frame.width(), frame.height()));
        }
    }

    fn endpoint_changed(&self, seen: u64) -> Option<(u64, String)> {
        let state = lock(&self.state);
        (state.generation != seen).then(|| (state.generation, state.locator.clone()))
    }
}
