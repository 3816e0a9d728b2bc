use thiserror::Error;

use crate::frame::PixelFormat;

#[derive(Error, Debug)]
pub enum VernierError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid frame geometry: {width}x{height}, stride {stride}, {len} bytes")]
    InvalidFrame {
        width: u32,
        height: u32,
        stride: usize,
        len: usize,
    },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Source setup failed: {0}")]
    SetupFailed(String),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("No frame available")]
    NoFrame,
}

pub type Result<T> = std::result::Result<T, VernierError>;
