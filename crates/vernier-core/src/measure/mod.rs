//! Interactive measurement overlay.
//!
//! The [`MeasurementEngine`] turns pointer events into line and circle
//! annotations and converts their pixel geometry into millimeters with an
//! anisotropic [`Calibration`].

pub mod engine;
pub mod shape;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_MM_PER_PIXEL, MIN_MM_PER_PIXEL, MM_DISPLAY_PRECISION, PX_DISPLAY_PRECISION,
};

pub use engine::MeasurementEngine;
pub use shape::{Annotation, Color, Label, Shape, Stroke, VisualScale};

/// A position in frame pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// A two-point length in pixels and millimeters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub pixels: f64,
    pub millimeters: f64,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*} px, {:.*} mm",
            PX_DISPLAY_PRECISION, self.pixels, MM_DISPLAY_PRECISION, self.millimeters
        )
    }
}

/// Millimeters per pixel along each axis. Both factors stay at or above
/// [`MIN_MM_PER_PIXEL`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    mm_per_px_x: f64,
    mm_per_px_y: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(DEFAULT_MM_PER_PIXEL, DEFAULT_MM_PER_PIXEL)
    }
}

fn clamp_scale(value: f64) -> f64 {
    if value.is_finite() {
        value.max(MIN_MM_PER_PIXEL)
    } else {
        MIN_MM_PER_PIXEL
    }
}

impl Calibration {
    pub fn new(mm_per_px_x: f64, mm_per_px_y: f64) -> Self {
        Self {
            mm_per_px_x: clamp_scale(mm_per_px_x),
            mm_per_px_y: clamp_scale(mm_per_px_y),
        }
    }

    pub fn mm_per_px_x(&self) -> f64 {
        self.mm_per_px_x
    }

    pub fn mm_per_px_y(&self) -> f64 {
        self.mm_per_px_y
    }

    pub fn set_mm_per_px_x(&mut self, value: f64) {
        self.mm_per_px_x = clamp_scale(value);
    }

    pub fn set_mm_per_px_y(&mut self, value: f64) {
        self.mm_per_px_y = clamp_scale(value);
    }

    /// Length between `a` and `b`. Each axis is scaled independently before
    /// taking the Euclidean norm.
    pub fn measure(&self, a: Point, b: Point) -> Measurement {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        Measurement {
            pixels: dx.hypot(dy),
            millimeters: (dx * self.mm_per_px_x).hypot(dy * self.mm_per_px_y),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    None,
    Line,
    Circle,
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Line => write!(f, "Line"),
            Self::Circle => write!(f, "Circle"),
        }
    }
}

/// Keyboard modifiers that lock a line to one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Lock horizontal: the moving point keeps the start's Y.
    pub ctrl: bool,
    /// Lock vertical: the moving point keeps the start's X.
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
    };

    /// Apply the axis lock to `pos` relative to `start`. Ctrl wins when both
    /// are held.
    pub fn constrain(self, start: Point, pos: Point) -> Point {
        if self.ctrl {
            Point::new(pos.x, start.y)
        } else if self.shift {
            Point::new(start.x, pos.y)
        } else {
            pos
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}
