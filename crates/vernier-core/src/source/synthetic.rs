//! Synthetic capture devices and streams.
//!
//! These produce a moving test pattern and are used when no hardware is
//! available, and by the test suite.

use std::thread;
use std::time::Duration;

use crate::error::{Result, VernierError};
use crate::frame::{Frame, PixelFormat};

use super::device::{CaptureBackend, CaptureDevice, CaptureStream};
use super::network::{DecodedStream, StreamDecoder};
use super::VideoFormat;

/// Locator scheme understood by [`SyntheticDecoder`]: `synthetic://WxH`,
/// optionally followed by `?drop=N` to fail every N-th read.
pub const SYNTHETIC_SCHEME: &str = "synthetic://";

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Side length of the moving square, as a fraction of the frame width.
const MARKER_FRACTION: u32 = 8;

/// Capture backend with in-process test-pattern devices.
pub struct SyntheticCapture {
    devices: Vec<CaptureDevice>,
    frame_interval: Duration,
}

impl SyntheticCapture {
    /// Two devices: one with three formats, one with a single format.
    pub fn new() -> Self {
        Self::with_devices(vec![
            CaptureDevice {
                id: "synthetic-0".into(),
                description: "Synthetic Camera 0".into(),
                formats: vec![
                    VideoFormat::new(640, 480).with_fps(30),
                    VideoFormat::new(1280, 720).with_fps(30),
                    VideoFormat::new(320, 240).with_fps(30),
                ],
            },
            CaptureDevice {
                id: "synthetic-1".into(),
                description: "Synthetic Camera 1".into(),
                formats: vec![VideoFormat::new(800, 600).with_fps(30)],
            },
        ])
    }

    pub fn with_devices(devices: Vec<CaptureDevice>) -> Self {
        Self {
            devices,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    /// A backend that reports no devices.
    pub fn empty() -> Self {
        Self::with_devices(Vec::new())
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticCapture {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn enumerate(&mut self) -> Result<Vec<CaptureDevice>> {
        Ok(self.devices.clone())
    }

    fn open(
        &mut self,
        device: &CaptureDevice,
        format: Option<VideoFormat>,
    ) -> Result<Box<dyn CaptureStream>> {
        if !self.devices.iter().any(|d| d.id == device.id) {
            return Err(VernierError::SetupFailed(format!(
                "unknown synthetic device '{}'",
                device.description
            )));
        }
        let format = format
            .or_else(|| device.formats.first().copied())
            .unwrap_or(VideoFormat::new(640, 480));
        Ok(Box::new(PatternStream::new(
            format,
            PixelFormat::Rgb8,
            self.frame_interval,
        )))
    }
}

/// Decoder for `synthetic://` locators.
#[derive(Default)]
pub struct SyntheticDecoder;

impl SyntheticDecoder {
    pub fn accepts(locator: &str) -> bool {
        locator.starts_with(SYNTHETIC_SCHEME)
    }
}

impl StreamDecoder for SyntheticDecoder {
    fn open(&mut self, locator: &str) -> Result<Box<dyn DecodedStream>> {
        let (format, drop_every) = parse_locator(locator)?;
        let mut stream = PatternStream::new(format, PixelFormat::Bgr8, Duration::ZERO);
        stream.drop_every = drop_every;
        Ok(Box::new(stream))
    }
}

fn parse_locator(locator: &str) -> Result<(VideoFormat, Option<u64>)> {
    let invalid = || VernierError::SetupFailed(format!("invalid synthetic locator '{locator}'"));

    let rest = locator.strip_prefix(SYNTHETIC_SCHEME).ok_or_else(invalid)?;
    let (resolution, query) = match rest.split_once('?') {
        Some((resolution, query)) => (resolution, Some(query)),
        None => (rest, None),
    };

    let (w, h) = resolution.split_once('x').ok_or_else(invalid)?;
    let width: u32 = w.parse().map_err(|_| invalid())?;
    let height: u32 = h.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }

    let drop_every = match query {
        Some(q) => {
            let n: u64 = q
                .strip_prefix("drop=")
                .and_then(|n| n.parse().ok())
                .filter(|&n| n > 0)
                .ok_or_else(invalid)?;
            Some(n)
        }
        None => None,
    };

    Ok((VideoFormat::new(width, height), drop_every))
}

struct PatternStream {
    format: VideoFormat,
    layout: PixelFormat,
    interval: Duration,
    tick: u64,
    drop_every: Option<u64>,
}

impl PatternStream {
    fn new(format: VideoFormat, layout: PixelFormat, interval: Duration) -> Self {
        Self {
            format,
            layout,
            interval,
            tick: 0,
            drop_every: None,
        }
    }

    fn produce(&mut self) -> Result<Frame> {
        self.tick += 1;
        if let Some(n) = self.drop_every {
            if self.tick % n == 0 {
                return Err(VernierError::Capture(format!(
                    "synthetic read {} dropped",
                    self.tick
                )));
            }
        }
        test_pattern(self.format.width, self.format.height, self.tick, self.layout)
    }
}

impl CaptureStream for PatternStream {
    fn next_frame(&mut self) -> Result<Frame> {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        self.produce()
    }
}

impl DecodedStream for PatternStream {
    fn read(&mut self) -> Result<Frame> {
        self.produce()
    }

    fn resolution(&self) -> Option<VideoFormat> {
        Some(self.format)
    }
}

/// Render a horizontal gradient with a white square that moves one step per
/// `tick`.
pub fn test_pattern(width: u32, height: u32, tick: u64, layout: PixelFormat) -> Result<Frame> {
    let bpp = layout.bytes_per_pixel();
    let side = (width / MARKER_FRACTION).clamp(1, height.max(1));
    let travel = u64::from(width.saturating_sub(side).max(1));
    let marker_x = ((tick * 4) % travel) as u32;
    let marker_y = (height - side.min(height)) / 2;

    let mut data = Vec::with_capacity(width as usize * height as usize * bpp);
    for y in 0..height {
        for x in 0..width {
            let in_marker = x >= marker_x
                && x < marker_x + side
                && y >= marker_y
                && y < marker_y + side;
            let (r, g, b) = if in_marker {
                (255, 255, 255)
            } else {
                let shade = (x * 255 / width.max(1)) as u8;
                let band = (y * 255 / height.max(1)) as u8;
                (shade, band / 2, 255 - shade)
            };
            match layout {
                PixelFormat::Rgb8 => data.extend_from_slice(&[r, g, b]),
                PixelFormat::Bgr8 => data.extend_from_slice(&[b, g, r]),
                PixelFormat::Rgba8 => data.extend_from_slice(&[r, g, b, 255]),
                PixelFormat::Bgra8 => data.extend_from_slice(&[b, g, r, 255]),
                PixelFormat::Gray8 => {
                    data.push(((u32::from(r) + u32::from(g) + u32::from(b)) / 3) as u8)
                }
            }
        }
    }
    Frame::from_packed(width, height, layout, data)
}
