//! Hardware capture through `nokhwa`.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use tracing::debug;

use crate::error::{Result, VernierError};
use crate::frame::{Frame, PixelFormat};

use super::device::{CaptureBackend, CaptureDevice, CaptureStream};
use super::VideoFormat;

const FALLBACK_FPS: u32 = 30;

#[derive(Default)]
pub struct NokhwaCapture {
    indices: Vec<(String, CameraIndex)>,
}

impl NokhwaCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_of(&self, id: &str) -> Option<CameraIndex> {
        self.indices
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, index)| index.clone())
    }
}

/// Formats are only discoverable on an opened camera.
fn probe_formats(index: &CameraIndex) -> Vec<VideoFormat> {
    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
    let formats =
        Camera::new(index.clone(), requested).and_then(|mut cam| cam.compatible_camera_formats());
    match formats {
        Ok(formats) => {
            let mut out: Vec<VideoFormat> = formats
                .iter()
                .map(|f| VideoFormat::new(f.width(), f.height()).with_fps(f.frame_rate()))
                .collect();
            out.sort_by(|a, b| (b.width * b.height, b.fps).cmp(&(a.width * a.height, a.fps)));
            out.dedup();
            out
        }
        Err(e) => {
            debug!(%index, error = %e, "Could not probe camera formats");
            Vec::new()
        }
    }
}

impl CaptureBackend for NokhwaCapture {
    fn name(&self) -> &str {
        "nokhwa"
    }

    fn enumerate(&mut self) -> Result<Vec<CaptureDevice>> {
        let cameras = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| VernierError::SetupFailed(format!("camera query: {e}")))?;

        self.indices.clear();
        let mut devices = Vec::with_capacity(cameras.len());
        for info in cameras {
            let id = info.index().to_string();
            self.indices.push((id.clone(), info.index().clone()));
            devices.push(CaptureDevice {
                id,
                description: info.human_name(),
                formats: probe_formats(info.index()),
            });
        }
        Ok(devices)
    }

    fn open(
        &mut self,
        device: &CaptureDevice,
        format: Option<VideoFormat>,
    ) -> Result<Box<dyn CaptureStream>> {
        let index = self
            .index_of(&device.id)
            .ok_or_else(|| VernierError::UnknownDevice(device.description.clone()))?;

        let requested = match format {
            Some(f) => RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                CameraFormat::new(
                    Resolution::new(f.width, f.height),
                    FrameFormat::MJPEG,
                    f.fps.unwrap_or(FALLBACK_FPS),
                ),
            )),
            None => {
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate)
            }
        };

        let mut camera = Camera::new(index, requested)
            .map_err(|e| VernierError::SetupFailed(format!("{}: {e}", device.description)))?;
        camera
            .open_stream()
            .map_err(|e| VernierError::SetupFailed(format!("{}: {e}", device.description)))?;
        Ok(Box::new(NokhwaStream { camera }))
    }
}

struct NokhwaStream {
    camera: Camera,
}

impl CaptureStream for NokhwaStream {
    fn next_frame(&mut self) -> Result<Frame> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| VernierError::Capture(format!("fetch frame: {e}")))?;
        let rgb = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| VernierError::Capture(format!("decode frame: {e}")))?;
        let (width, height) = rgb.dimensions();
        Frame::from_packed(width, height, PixelFormat::Rgb8, rgb.into_raw())
    }
}

impl Drop for NokhwaStream {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            debug!(error = %e, "Failed to stop camera stream");
        }
    }
}
