use ndarray::{Array2, Zip};
use rayon::prelude::*;

use crate::consts::{DEFAULT_BLUR_SIGMA, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{Result, VernierError};
use crate::frame::{Frame, PixelFormat};

use super::{StageKind, TransformStage};

/// Separable Gaussian blur of the colour channels. Alpha is kept.
#[derive(Clone, Debug)]
pub struct GaussianBlur {
    pub sigma: f32,
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

impl TransformStage for GaussianBlur {
    fn kind(&self) -> StageKind {
        StageKind::GaussianBlur
    }

    fn process(&self, frame: &Frame) -> Result<Frame> {
        if frame.format() != PixelFormat::Bgra8 {
            return Err(VernierError::UnsupportedFormat(frame.format()));
        }
        if self.sigma.is_nan() || self.sigma <= 0.0 {
            return Err(VernierError::Transform(format!(
                "blur sigma must be positive, got {}",
                self.sigma
            )));
        }

        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let planes: Vec<Array2<f32>> = (0..3)
            .into_par_iter()
            .map(|c| blur_plane(&channel_plane(frame, c), self.sigma))
            .collect();

        let mut out = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            let src = frame.row(y as u32);
            for x in 0..w {
                for plane in &planes {
                    out.push(plane[[y, x]].round().clamp(0.0, 255.0) as u8);
                }
                out.push(src[x * 4 + 3]);
            }
        }
        Ok(Frame::from_packed(frame.width(), frame.height(), PixelFormat::Bgra8, out)?
            .with_sequence(frame.sequence()))
    }
}

/// One channel of a BGRA frame as a float plane.
fn channel_plane(frame: &Frame, channel: usize) -> Array2<f32> {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    Array2::from_shape_fn((h, w), |(y, x)| f32::from(frame.row(y as u32)[x * 4 + channel]))
}

/// Blur a plane with a separable Gaussian kernel, clamping at the borders.
pub fn blur_plane(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let kernel = gaussian_kernel(sigma);
    let rows = convolve(data, &kernel, Direction::Horizontal);
    convolve(&rows, &kernel, Direction::Vertical)
}

pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil().max(1.0) as usize;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

#[derive(Clone, Copy)]
enum Direction {
    Horizontal,
    Vertical,
}

fn convolve(data: &Array2<f32>, kernel: &[f32], direction: Direction) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() as isize / 2;
    let tap = |row: usize, col: usize| -> f32 {
        kernel
            .iter()
            .enumerate()
            .map(|(ki, &kv)| {
                let offset = ki as isize - radius;
                let sample = match direction {
                    Direction::Horizontal => {
                        data[[row, (col as isize + offset).clamp(0, w as isize - 1) as usize]]
                    }
                    Direction::Vertical => {
                        data[[(row as isize + offset).clamp(0, h as isize - 1) as usize, col]]
                    }
                };
                sample * kv
            })
            .sum()
    };

    let mut result = Array2::<f32>::zeros((h, w));
    let zip = Zip::indexed(&mut result);
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(|(row, col), v| *v = tap(row, col));
    } else {
        zip.for_each(|(row, col), v| *v = tap(row, col));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_is_normalised() {
        let kernel = gaussian_kernel(1.5);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(kernel.len() % 2, 1);
    }

    #[test]
    fn test_flat_plane_unchanged() {
        let plane = Array2::from_elem((8, 8), 42.0f32);
        let blurred = blur_plane(&plane, 1.0);
        assert!(blurred.iter().all(|&v| (v - 42.0).abs() < 1e-3));
    }
}
