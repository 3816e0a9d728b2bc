use std::collections::VecDeque;

use ndarray::{Array2, Zip};

use crate::consts::{
    DEFAULT_EDGE_BLUR_SIGMA, DEFAULT_EDGE_HIGH_THRESHOLD, DEFAULT_EDGE_LOW_THRESHOLD, LUMINANCE_B,
    LUMINANCE_G, LUMINANCE_R, PARALLEL_PIXEL_THRESHOLD,
};
use crate::error::{Result, VernierError};
use crate::frame::{Frame, PixelFormat};

use super::blur::blur_plane;
use super::{StageKind, TransformStage};

const EDGE: [u8; 4] = [255, 255, 255, 255];
const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Canny-style edge detector producing white edges on black.
///
/// Pipeline: BT.601 luma, Gaussian smoothing, Sobel gradient, non-maximum
/// suppression along the gradient direction, double threshold, and
/// hysteresis (weak pixels survive only when 8-connected to a strong one).
#[derive(Clone, Debug)]
pub struct EdgeDetector {
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Pre-smoothing sigma; zero disables smoothing.
    pub blur_sigma: f32,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_EDGE_LOW_THRESHOLD,
            high_threshold: DEFAULT_EDGE_HIGH_THRESHOLD,
            blur_sigma: DEFAULT_EDGE_BLUR_SIGMA,
        }
    }
}

impl TransformStage for EdgeDetector {
    fn kind(&self) -> StageKind {
        StageKind::EdgeDetect
    }

    fn process(&self, frame: &Frame) -> Result<Frame> {
        if frame.format() != PixelFormat::Bgra8 {
            return Err(VernierError::UnsupportedFormat(frame.format()));
        }
        if self.low_threshold > self.high_threshold {
            return Err(VernierError::Transform(format!(
                "edge thresholds out of order: low {} > high {}",
                self.low_threshold, self.high_threshold
            )));
        }

        let edges = self.detect(&luma_plane(frame));

        let mut out = Vec::with_capacity(edges.len() * 4);
        for &on in edges.iter() {
            out.extend_from_slice(if on { &EDGE } else { &BACKGROUND });
        }
        Ok(Frame::from_packed(frame.width(), frame.height(), PixelFormat::Bgra8, out)?
            .with_sequence(frame.sequence()))
    }
}

impl EdgeDetector {
    /// Edge map of a luma plane (values on the 0..255 scale).
    pub fn detect(&self, luma: &Array2<f32>) -> Array2<bool> {
        let smoothed = if self.blur_sigma > 0.0 {
            blur_plane(luma, self.blur_sigma)
        } else {
            luma.clone()
        };
        let (gx, gy) = sobel(&smoothed);
        let magnitude = Zip::from(&gx).and(&gy).map_collect(|&x, &y| x.hypot(y));
        let thin = non_maximum_suppression(&magnitude, &gx, &gy);
        hysteresis(&thin, self.low_threshold, self.high_threshold)
    }
}

fn luma_plane(frame: &Frame) -> Array2<f32> {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    Array2::from_shape_fn((h, w), |(y, x)| {
        let px = &frame.row(y as u32)[x * 4..x * 4 + 3];
        LUMINANCE_B * f32::from(px[0])
            + LUMINANCE_G * f32::from(px[1])
            + LUMINANCE_R * f32::from(px[2])
    })
}

/// Horizontal and vertical Sobel responses. The 1-pixel border is zero.
fn sobel(data: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = data.dim();
    let mut gx = Array2::<f32>::zeros((h, w));
    let mut gy = Array2::<f32>::zeros((h, w));
    if h < 3 || w < 3 {
        return (gx, gy);
    }

    let kernel = |row: usize, col: usize| -> (f32, f32) {
        if row == 0 || col == 0 || row == h - 1 || col == w - 1 {
            return (0.0, 0.0);
        }
        let p = |dr: usize, dc: usize| data[[row + dr - 1, col + dc - 1]];
        let x = -p(0, 0) + p(0, 2) - 2.0 * p(1, 0) + 2.0 * p(1, 2) - p(2, 0) + p(2, 2);
        let y = -p(0, 0) - 2.0 * p(0, 1) - p(0, 2) + p(2, 0) + 2.0 * p(2, 1) + p(2, 2);
        (x, y)
    };

    let zip = Zip::indexed(&mut gx).and(&mut gy);
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(|(row, col), x, y| (*x, *y) = kernel(row, col));
    } else {
        zip.for_each(|(row, col), x, y| (*x, *y) = kernel(row, col));
    }
    (gx, gy)
}

/// Keep only pixels that are local maxima along the gradient direction.
///
/// Ties keep the pixel on the negative side so a symmetric ridge stays one
/// pixel wide.
fn non_maximum_suppression(mag: &Array2<f32>, gx: &Array2<f32>, gy: &Array2<f32>) -> Array2<f32> {
    let (h, w) = mag.dim();
    let mut out = Array2::<f32>::zeros((h, w));
    if h < 3 || w < 3 {
        return out;
    }

    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let m = mag[[row, col]];
            if m == 0.0 {
                continue;
            }
            let angle = gy[[row, col]].atan2(gx[[row, col]]).to_degrees().rem_euclid(180.0);
            // (dr, dc) of the neighbour in the positive gradient direction.
            let (dr, dc): (isize, isize) = if !(22.5..157.5).contains(&angle) {
                (0, 1)
            } else if angle < 67.5 {
                (1, 1)
            } else if angle < 112.5 {
                (1, 0)
            } else {
                (1, -1)
            };
            let ahead = mag[[(row as isize + dr) as usize, (col as isize + dc) as usize]];
            let behind = mag[[(row as isize - dr) as usize, (col as isize - dc) as usize]];
            if m >= ahead && m > behind {
                out[[row, col]] = m;
            }
        }
    }
    out
}

/// Double threshold, then grow strong pixels into 8-connected weak ones.
fn hysteresis(mag: &Array2<f32>, low: f32, high: f32) -> Array2<bool> {
    let (h, w) = mag.dim();
    let mut edges = Array2::from_elem((h, w), false);
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    for ((row, col), &m) in mag.indexed_iter() {
        if m >= high {
            edges[[row, col]] = true;
            queue.push_back((row, col));
        }
    }

    while let Some((row, col)) = queue.pop_front() {
        for r in row.saturating_sub(1)..=(row + 1).min(h - 1) {
            for c in col.saturating_sub(1)..=(col + 1).min(w - 1) {
                if !edges[[r, c]] && mag[[r, c]] >= low {
                    edges[[r, c]] = true;
                    queue.push_back((r, c));
                }
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hysteresis_keeps_connected_weak_pixels() {
        let mut mag = Array2::<f32>::zeros((3, 5));
        mag[[1, 0]] = 250.0;
        mag[[1, 1]] = 150.0;
        mag[[1, 2]] = 150.0;
        mag[[1, 4]] = 150.0;
        let edges = hysteresis(&mag, 100.0, 200.0);
        assert!(edges[[1, 0]] && edges[[1, 1]] && edges[[1, 2]]);
        assert!(!edges[[1, 4]], "isolated weak pixel must be dropped");
    }

    #[test]
    fn test_sobel_flat_is_zero() {
        let plane = Array2::from_elem((6, 6), 80.0f32);
        let (gx, gy) = sobel(&plane);
        assert!(gx.iter().chain(gy.iter()).all(|&v| v == 0.0));
    }
}
