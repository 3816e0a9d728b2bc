use tracing::{debug, info, trace};

use super::shape::{Annotation, Shape, VisualScale};
use super::{Calibration, DrawMode, Modifiers, Point, PointerButton};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    /// Ready for the next press.
    Armed,
    /// Primary button held. `placing_center` is set while the press that
    /// fixes a circle's center is still down.
    Dragging { start: Point, placing_center: bool },
}

/// Draw-mode state machine owning the temporary and permanent annotations.
///
/// Lines are one press-drag-release. Circles take two presses: the first
/// fixes the center, the second drags the radius out from that center and
/// commits on release. Only the primary button draws; every event is ignored
/// while the mode is [`DrawMode::None`].
#[derive(Debug)]
pub struct MeasurementEngine {
    mode: DrawMode,
    awaiting_center: bool,
    center: Option<Point>,
    phase: Phase,
    temporary: Option<Annotation>,
    permanent: Vec<Annotation>,
    calibration: Calibration,
    scale: VisualScale,
}

impl Default for MeasurementEngine {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}

impl MeasurementEngine {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            mode: DrawMode::None,
            awaiting_center: false,
            center: None,
            phase: Phase::Armed,
            temporary: None,
            permanent: Vec::new(),
            calibration,
            scale: VisualScale::default(),
        }
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// True when the next circle press fixes a new center.
    pub fn awaiting_center(&self) -> bool {
        self.awaiting_center
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Circle center fixed by the first press, while waiting for the second.
    pub fn pending_center(&self) -> Option<Point> {
        self.center
    }

    pub fn temporary(&self) -> Option<&Annotation> {
        self.temporary.as_ref()
    }

    pub fn permanent(&self) -> &[Annotation] {
        &self.permanent
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn visual_scale(&self) -> VisualScale {
        self.scale
    }

    /// Switch mode and discard any preview or pending circle center.
    pub fn set_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
        self.awaiting_center = mode == DrawMode::Circle;
        self.center = None;
        self.phase = Phase::Armed;
        self.temporary = None;
        debug!(%mode, "Draw mode set");
    }

    /// Already committed labels keep the calibration they were drawn with.
    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
        info!(
            x = calibration.mm_per_px_x(),
            y = calibration.mm_per_px_y(),
            "Calibration set"
        );
    }

    pub fn set_mm_per_px_x(&mut self, value: f64) {
        let mut calibration = self.calibration;
        calibration.set_mm_per_px_x(value);
        self.set_calibration(calibration);
    }

    pub fn set_mm_per_px_y(&mut self, value: f64) {
        let mut calibration = self.calibration;
        calibration.set_mm_per_px_y(value);
        self.set_calibration(calibration);
    }

    pub fn set_visual_scale(&mut self, scale: VisualScale) {
        self.scale = scale;
    }

    /// Re-derive font size and stroke width for a frame `width` pixels wide.
    pub fn scale_for_frame_width(&mut self, width: u32) {
        self.scale = VisualScale::for_frame_width(width);
    }

    /// Remove every committed annotation. Mode and circle state are kept.
    pub fn clear_all(&mut self) {
        let count = self.permanent.len();
        self.permanent.clear();
        if count > 0 {
            info!(count, "Annotations cleared");
        }
    }

    pub fn pointer_down(&mut self, pos: Point, button: PointerButton) {
        if button != PointerButton::Primary || self.mode == DrawMode::None {
            return;
        }

        match (self.phase, self.mode) {
            (Phase::Armed, DrawMode::Circle) if self.awaiting_center => {
                self.awaiting_center = false;
                self.center = Some(pos);
                self.temporary = Some(self.preview(Shape::Circle {
                    center: pos,
                    radius_point: pos,
                }));
                self.phase = Phase::Dragging {
                    start: pos,
                    placing_center: true,
                };
                trace!(center = %pos, "Circle center placed");
            }
            // Second circle press, including one that arrives before the
            // center press was released.
            (Phase::Armed, DrawMode::Circle)
            | (
                Phase::Dragging {
                    placing_center: true,
                    ..
                },
                DrawMode::Circle,
            ) => {
                let center = self.center.unwrap_or(pos);
                self.begin_shape(center);
            }
            (Phase::Armed, DrawMode::Line) => self.begin_shape(pos),
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, pos: Point, modifiers: Modifiers) {
        if let Phase::Dragging {
            start,
            placing_center: false,
        } = self.phase
        {
            self.update_preview(start, pos, modifiers);
        }
    }

    pub fn pointer_up(&mut self, pos: Point, button: PointerButton, modifiers: Modifiers) {
        if button != PointerButton::Primary || self.mode == DrawMode::None {
            return;
        }

        match self.phase {
            Phase::Dragging {
                placing_center: true,
                ..
            } => {
                // The center stays fixed; the next press drags the radius.
                self.phase = Phase::Armed;
            }
            Phase::Dragging {
                start,
                placing_center: false,
            } => self.commit_shape(start, pos, modifiers),
            Phase::Armed => {}
        }
    }

    fn begin_shape(&mut self, start: Point) {
        self.temporary = Some(self.preview(self.shape_between(start, start)));
        self.phase = Phase::Dragging {
            start,
            placing_center: false,
        };
        trace!(mode = %self.mode, start = %start, "Shape started");
    }

    fn update_preview(&mut self, start: Point, pos: Point, modifiers: Modifiers) {
        let end = self.constrain(start, pos, modifiers);
        self.temporary = Some(self.preview(self.shape_between(start, end)));
    }

    fn commit_shape(&mut self, start: Point, pos: Point, modifiers: Modifiers) {
        let end = self.constrain(start, pos, modifiers);
        self.temporary = None;

        let annotation = Annotation::new(
            self.shape_between(start, end),
            &self.calibration,
            self.scale,
            false,
        );
        info!(label = %annotation.label.text, "Measurement committed");
        self.permanent.push(annotation);

        if self.mode == DrawMode::Circle {
            self.awaiting_center = true;
            self.center = None;
        }
        self.phase = Phase::Armed;
    }

    /// Axis lock applies to lines only.
    fn constrain(&self, start: Point, pos: Point, modifiers: Modifiers) -> Point {
        match self.mode {
            DrawMode::Line => modifiers.constrain(start, pos),
            _ => pos,
        }
    }

    fn shape_between(&self, start: Point, end: Point) -> Shape {
        match self.mode {
            DrawMode::Circle => Shape::Circle {
                center: start,
                radius_point: end,
            },
            _ => Shape::Line { p0: start, p1: end },
        }
    }

    fn preview(&self, shape: Shape) -> Annotation {
        Annotation::new(shape, &self.calibration, self.scale, true)
    }
}
