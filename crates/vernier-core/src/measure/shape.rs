use crate::consts::{
    DEFAULT_FONT_SIZE, DEFAULT_LINE_WIDTH, FONT_SIZE_DIVISOR, LABEL_OFFSET_X, LABEL_OFFSET_Y,
    LINE_WIDTH_DIVISOR, MAX_FONT_SIZE, MAX_LINE_WIDTH, MIN_FONT_SIZE, MIN_LINE_WIDTH,
};

use super::{Calibration, Measurement, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Self = Self { r: 255, g: 0, b: 0 };
    pub const BLUE: Self = Self { r: 0, g: 0, b: 255 };
}

/// Measurement primitive in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Line { p0: Point, p1: Point },
    Circle { center: Point, radius_point: Point },
}

impl Shape {
    /// The two points the measurement is taken between.
    pub fn endpoints(&self) -> (Point, Point) {
        match *self {
            Self::Line { p0, p1 } => (p0, p1),
            Self::Circle {
                center,
                radius_point,
            } => (center, radius_point),
        }
    }

    pub fn measure(&self, calibration: &Calibration) -> Measurement {
        let (a, b) = self.endpoints();
        calibration.measure(a, b)
    }

    fn prefix(&self) -> &'static str {
        match self {
            Self::Line { .. } => "L",
            Self::Circle { .. } => "R",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Line { .. } => Color::RED,
            Self::Circle { .. } => Color::BLUE,
        }
    }

    /// Where the label goes: just right of and above the shape's extent.
    pub fn label_anchor(&self) -> Point {
        match *self {
            Self::Line { p0, p1 } => Point::new(
                p0.x.max(p1.x) + LABEL_OFFSET_X,
                p0.y.min(p1.y) - LABEL_OFFSET_Y,
            ),
            Self::Circle {
                center,
                radius_point,
            } => {
                let r = center.distance(radius_point);
                Point::new(center.x + r + LABEL_OFFSET_X, center.y - r - LABEL_OFFSET_Y)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub anchor: Point,
    pub color: Color,
    pub font_size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: u32,
    /// Previews are dashed, committed shapes solid.
    pub dashed: bool,
}

/// A shape with its derived label and styling.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub shape: Shape,
    pub label: Label,
    pub stroke: Stroke,
    pub measurement: Measurement,
}

impl Annotation {
    /// Derive label and stroke for `shape` from the current calibration and
    /// visual scale.
    pub fn new(shape: Shape, calibration: &Calibration, scale: VisualScale, dashed: bool) -> Self {
        let measurement = shape.measure(calibration);
        let color = shape.color();
        Self {
            label: Label {
                text: format!("{}: {}", shape.prefix(), measurement),
                anchor: shape.label_anchor(),
                color,
                font_size: scale.font_size,
            },
            stroke: Stroke {
                color,
                width: scale.line_width,
                dashed,
            },
            measurement,
            shape,
        }
    }
}

/// Font size and stroke width derived from the frame width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualScale {
    pub font_size: u32,
    pub line_width: u32,
}

impl Default for VisualScale {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl VisualScale {
    pub fn for_frame_width(width: u32) -> Self {
        Self {
            font_size: (width / FONT_SIZE_DIVISOR).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            line_width: (width / LINE_WIDTH_DIVISOR).clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH),
        }
    }
}
