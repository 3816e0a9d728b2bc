use crate::consts::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use crate::measure::Point;

/// Zoom and placement of the frame inside the view. The frame is centered
/// in the view at the current zoom.
#[derive(Clone, Debug)]
pub struct Viewport {
    zoom: f32,
    frame_size: Option<(u32, u32)>,
    view_size: Option<(f32, f32)>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            frame_size: None,
            view_size: None,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * (1.0 + ZOOM_STEP));
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom * (1.0 - ZOOM_STEP));
    }

    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }

    pub fn view_size(&self) -> Option<(f32, f32)> {
        self.view_size
    }

    /// Record the view size without changing zoom.
    pub fn set_view_size(&mut self, width: f32, height: f32) {
        self.view_size = Some((width, height));
    }

    /// Largest zoom that shows the whole frame in a `width` x `height` view.
    pub fn fit(&mut self, width: f32, height: f32) {
        self.view_size = Some((width, height));
        self.refit();
    }

    /// Called when the displayed frame changes size. Refits when the view
    /// size is known.
    pub fn frame_resized(&mut self, width: u32, height: u32) {
        self.frame_size = Some((width, height));
        self.refit();
    }

    fn refit(&mut self) {
        if let (Some((fw, fh)), Some((vw, vh))) = (self.frame_size, self.view_size) {
            if fw > 0 && fh > 0 && vw > 0.0 && vh > 0.0 {
                self.set_zoom((vw / fw as f32).min(vh / fh as f32));
            }
        }
    }

    /// Top-left corner of the frame in view coordinates.
    pub fn origin(&self) -> (f32, f32) {
        match (self.frame_size, self.view_size) {
            (Some((fw, fh)), Some((vw, vh))) => (
                (vw - fw as f32 * self.zoom) / 2.0,
                (vh - fh as f32 * self.zoom) / 2.0,
            ),
            _ => (0.0, 0.0),
        }
    }

    pub fn view_to_frame(&self, x: f32, y: f32) -> Point {
        let (ox, oy) = self.origin();
        Point::new(
            f64::from((x - ox) / self.zoom),
            f64::from((y - oy) / self.zoom),
        )
    }

    pub fn frame_to_view(&self, point: Point) -> (f32, f32) {
        let (ox, oy) = self.origin();
        (
            ox + point.x as f32 * self.zoom,
            oy + point.y as f32 * self.zoom,
        )
    }
}
