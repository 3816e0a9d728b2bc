//! HTTP snapshot streams: every read fetches one still image from the URL.
//!
//! Works with the JPEG/PNG snapshot endpoints most IP cameras expose.

use std::io::Read;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, VernierError};
use crate::frame::{Frame, PixelFormat};

use super::network::{DecodedStream, StreamDecoder};
use super::VideoFormat;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Responses larger than this are rejected.
const MAX_SNAPSHOT_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Default)]
pub struct HttpSnapshotDecoder;

impl HttpSnapshotDecoder {
    pub fn accepts(locator: &str) -> bool {
        locator.starts_with("http://") || locator.starts_with("https://")
    }
}

impl StreamDecoder for HttpSnapshotDecoder {
    fn open(&mut self, locator: &str) -> Result<Box<dyn DecodedStream>> {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build();
        let mut stream = HttpSnapshotStream {
            agent,
            url: locator.to_string(),
            format: None,
        };

        // Probe once so an unreachable endpoint fails the open.
        let first = stream
            .read()
            .map_err(|e| VernierError::SetupFailed(format!("{locator}: {e}")))?;
        stream.format = Some(VideoFormat::new(first.width(), first.height()));
        Ok(Box::new(stream))
    }
}

struct HttpSnapshotStream {
    agent: ureq::Agent,
    url: String,
    format: Option<VideoFormat>,
}

impl HttpSnapshotStream {
    fn fetch(&self) -> Result<Vec<u8>> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| VernierError::Capture(format!("{}: {e}", self.url)))?;

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_SNAPSHOT_BYTES)
            .read_to_end(&mut body)?;
        debug!(url = %self.url, bytes = body.len(), "Snapshot fetched");
        Ok(body)
    }
}

impl DecodedStream for HttpSnapshotStream {
    fn read(&mut self) -> Result<Frame> {
        let body = self.fetch()?;
        let rgba = image::load_from_memory(&body)?.into_rgba8();
        let (width, height) = rgba.dimensions();
        Frame::from_packed(width, height, PixelFormat::Rgba8, rgba.into_raw())
    }

    fn resolution(&self) -> Option<VideoFormat> {
        self.format
    }
}
