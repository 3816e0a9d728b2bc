//! Frame sources.
//!
//! Every source owns one dedicated worker thread that publishes frames into a
//! single-slot [`FrameMailbox`]. The consumer polls [`FrameSource::is_ready`]
//! and takes the latest frame with [`FrameSource::get_frame`]; there is no
//! queueing and no backpressure onto the producer.
//!
//! - [`DeviceSource`]: local capture devices behind a [`CaptureBackend`]
//! - [`NetworkSource`]: remote streams behind a [`StreamDecoder`]
//!
//! Frames are normalised to the canonical BGRA layout before they are
//! published.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::Frame;

pub mod device;
#[cfg(feature = "http-stream")]
pub mod http;
pub mod mailbox;
pub mod network;
#[cfg(feature = "camera")]
pub mod nokhwa_backend;
pub mod synthetic;
mod worker;

pub use device::{CaptureBackend, CaptureDevice, CaptureStream, DeviceSource};
#[cfg(feature = "http-stream")]
pub use http::HttpSnapshotDecoder;
pub use mailbox::FrameMailbox;
pub use network::{AnyDecoder, DecodedStream, NetworkSource, StreamDecoder};
#[cfg(feature = "camera")]
pub use nokhwa_backend::NokhwaCapture;
pub use synthetic::{SyntheticCapture, SyntheticDecoder};
pub use worker::{CancelToken, ReadyNotifier, SourceWorker};

/// Lock shared worker state, recovering from a poisoned lock. Shared state is
/// only ever replaced field by field, so a panicked worker cannot leave it torn.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A capture resolution offered by a device or stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub fps: Option<u32>,
}

impl VideoFormat {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: None,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fps {
            Some(fps) => write!(f, "{}x{} @ {} fps", self.width, self.height, fps),
            None => write!(f, "{}x{}", self.width, self.height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Device,
    Network,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "Device"),
            Self::Network => write!(f, "Network"),
        }
    }
}

/// What a source knows once its worker finished setup.
#[derive(Clone, Debug, Default)]
pub struct SourceReady {
    pub devices: Vec<String>,
    pub formats: Vec<VideoFormat>,
}

/// Outcome of polling a [`ReadySignal`].
#[derive(Debug)]
pub enum ReadyPoll {
    /// Setup still in progress.
    Pending,
    Ready(SourceReady),
    /// The worker finished without reporting readiness (setup failed).
    Failed,
}

/// Single-shot readiness handle returned by [`FrameSource::start`].
///
/// The worker reports readiness exactly once after its setup succeeded. If
/// setup fails the worker drops its end without reporting, and the signal
/// resolves to [`ReadyPoll::Failed`].
pub struct ReadySignal {
    rx: mpsc::Receiver<SourceReady>,
}

impl ReadySignal {
    pub(crate) fn new(rx: mpsc::Receiver<SourceReady>) -> Self {
        Self { rx }
    }

    pub fn poll(&self) -> ReadyPoll {
        match self.rx.try_recv() {
            Ok(ready) => ReadyPoll::Ready(ready),
            Err(TryRecvError::Empty) => ReadyPoll::Pending,
            Err(TryRecvError::Disconnected) => ReadyPoll::Failed,
        }
    }

    /// Block for up to `timeout` waiting for the outcome.
    pub fn wait(&self, timeout: Duration) -> ReadyPoll {
        match self.rx.recv_timeout(timeout) {
            Ok(ready) => ReadyPoll::Ready(ready),
            Err(RecvTimeoutError::Timeout) => ReadyPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => ReadyPoll::Failed,
        }
    }
}

/// A producer of frames with its own worker thread.
///
/// Lifecycle is Idle <-> Running: [`start`](Self::start) spawns the worker
/// (no-op when already running), [`stop`](Self::stop) cancels it and blocks
/// until it has exited (no-op when idle).
pub trait FrameSource: Send {
    fn kind(&self) -> SourceKind;

    /// Identifiers of the capture targets this source can switch between.
    /// Never blocks on hardware; empty until the worker finished setup.
    fn list_available(&self) -> Vec<String>;

    /// Switch the active capture target. Safe to call while running.
    /// Unknown identifiers are rejected without changing state.
    fn select(&mut self, identifier: &str) -> Result<()>;

    /// Formats of the currently selected target.
    fn list_formats(&self) -> Vec<VideoFormat>;

    /// Apply the format at `index` of [`list_formats`](Self::list_formats).
    /// An out-of-range index is logged and ignored.
    fn select_format(&mut self, index: usize);

    /// Format the source is producing, if known.
    fn current_format(&self) -> Option<VideoFormat>;

    /// Configure the remote locator. Only meaningful for network sources.
    fn set_endpoint(&mut self, _locator: &str) {}

    fn start(&mut self) -> Option<ReadySignal>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    fn mailbox(&self) -> &FrameMailbox;

    fn is_ready(&self) -> bool {
        self.mailbox().is_ready()
    }

    /// Clear readiness and return the most recently published frame.
    fn get_frame(&self) -> Option<Frame> {
        self.mailbox().take()
    }
}
