use std::fmt;
use std::sync::Arc;

use crate::error::{Result, VernierError};

/// Memory layout of one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Canonical layout: blue, green, red, alpha; 8 bits each.
    Bgra8,
    Rgba8,
    Rgb8,
    Bgr8,
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8 | Self::Rgba8 => 4,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Gray8 => 1,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bgra8 => write!(f, "BGRA8"),
            Self::Rgba8 => write!(f, "RGBA8"),
            Self::Rgb8 => write!(f, "RGB8"),
            Self::Bgr8 => write!(f, "BGR8"),
            Self::Gray8 => write!(f, "GRAY8"),
        }
    }
}

/// A decoded image buffer produced by a source.
///
/// Pixel data is immutable once the frame is built and shared by reference
/// count, so cloning a frame is cheap and never copies pixels. A `Frame` can
/// only be constructed fully formed: [`Frame::new`] rejects buffers that are
/// too short for the declared geometry.
#[derive(Clone, Debug)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    /// Bytes per row, including any padding.
    stride: usize,
    data: Arc<[u8]>,
    /// Capture order within the producing source.
    sequence: u64,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<Self> {
        let data = data.into();
        let invalid = || VernierError::InvalidFrame {
            width,
            height,
            stride,
            len: data.len(),
        };

        if width == 0 || height == 0 {
            return Err(invalid());
        }
        let row_bytes = (width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or_else(invalid)?;
        let needed = stride.checked_mul(height as usize).ok_or_else(invalid)?;
        if stride < row_bytes || data.len() < needed {
            return Err(invalid());
        }

        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
            sequence: 0,
        })
    }

    /// Build a frame whose rows are tightly packed.
    pub fn from_packed(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self> {
        let stride = width as usize * format.bytes_per_pixel();
        Self::new(width, height, format, stride, data)
    }

    /// A BGRA frame where every pixel has the same value.
    pub fn filled_bgra(width: u32, height: u32, bgra: [u8; 4]) -> Result<Self> {
        let count = width as usize * height as usize;
        let data: Vec<u8> = bgra.iter().copied().cycle().take(count * 4).collect();
        Self::from_packed(width, height, PixelFormat::Bgra8, data)
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        let len = self.width as usize * self.format.bytes_per_pixel();
        &self.data[start..start + len]
    }

    /// Bytes of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let start = x as usize * bpp;
        &self.row(y)[start..start + bpp]
    }

    /// Normalise into the canonical packed BGRA layout with opaque alpha
    /// for formats that carry none.
    pub fn to_bgra(&self) -> Frame {
        if self.format == PixelFormat::Bgra8
            && self.stride == self.width as usize * PixelFormat::Bgra8.bytes_per_pixel()
        {
            return self.clone();
        }

        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            let row = self.row(y);
            match self.format {
                PixelFormat::Bgra8 => out.extend_from_slice(row),
                PixelFormat::Rgba8 => {
                    for px in row.chunks_exact(4) {
                        out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
                PixelFormat::Rgb8 => {
                    for px in row.chunks_exact(3) {
                        out.extend_from_slice(&[px[2], px[1], px[0], 255]);
                    }
                }
                PixelFormat::Bgr8 => {
                    for px in row.chunks_exact(3) {
                        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
                    }
                }
                PixelFormat::Gray8 => {
                    for &v in row {
                        out.extend_from_slice(&[v, v, v, 255]);
                    }
                }
            }
        }

        Frame {
            width: self.width,
            height: self.height,
            format: PixelFormat::Bgra8,
            stride: self.width as usize * 4,
            data: out.into(),
            sequence: self.sequence,
        }
    }

    /// Packed RGBA bytes, the layout texture uploads and PNG encoders expect.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let bgra = self.to_bgra();
        let mut out = Vec::with_capacity(bgra.data.len());
        for px in bgra.data.chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
        out
    }
}
