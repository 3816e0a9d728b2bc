use std::path::Path;

use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::error::{Result, VernierError};
use crate::frame::{Frame, PixelFormat};

/// Save a frame as an 8-bit RGBA PNG.
pub fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    let img = RgbaImage::from_raw(frame.width(), frame.height(), frame.to_rgba_bytes())
        .ok_or(VernierError::InvalidFrame {
            width: frame.width(),
            height: frame.height(),
            stride: frame.stride(),
            len: frame.data().len(),
        })?;

    img.save_with_format(path, ImageFormat::Png)?;
    info!(path = %path.display(), width = frame.width(), height = frame.height(), "Snapshot saved");
    Ok(())
}

/// Load an image file as a canonical BGRA frame.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let rgba = image::open(path)?.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Frame::from_packed(width, height, PixelFormat::Rgba8, rgba.into_raw())?.to_bgra())
}
