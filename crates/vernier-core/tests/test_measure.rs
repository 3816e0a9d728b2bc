use approx::assert_relative_eq;

use vernier_core::measure::{
    Calibration, Color, DrawMode, MeasurementEngine, Modifiers, Point, PointerButton, Shape,
    VisualScale,
};

const PRIMARY: PointerButton = PointerButton::Primary;
const CTRL: Modifiers = Modifiers {
    ctrl: true,
    shift: false,
};
const SHIFT: Modifiers = Modifiers {
    ctrl: false,
    shift: true,
};

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn engine(mode: DrawMode) -> MeasurementEngine {
    let mut engine = MeasurementEngine::new(Calibration::new(0.1, 0.1));
    engine.set_mode(mode);
    engine
}

fn drag(engine: &mut MeasurementEngine, from: Point, to: Point, modifiers: Modifiers) {
    engine.pointer_down(from, PRIMARY);
    engine.pointer_move(to, modifiers);
    engine.pointer_up(to, PRIMARY, modifiers);
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

#[test]
fn test_calibration_clamps_to_minimum() {
    let cal = Calibration::new(0.0, -3.0);
    assert_relative_eq!(cal.mm_per_px_x(), 0.001);
    assert_relative_eq!(cal.mm_per_px_y(), 0.001);

    let mut cal = Calibration::new(0.5, 0.5);
    cal.set_mm_per_px_x(f64::NAN);
    cal.set_mm_per_px_y(0.0005);
    assert_relative_eq!(cal.mm_per_px_x(), 0.001);
    assert_relative_eq!(cal.mm_per_px_y(), 0.001);
}

#[test]
fn test_measure_is_anisotropic() {
    let cal = Calibration::new(0.1, 0.2);
    let m = cal.measure(p(0.0, 0.0), p(30.0, 40.0));
    assert_relative_eq!(m.pixels, 50.0);
    // sqrt((30*0.1)^2 + (40*0.2)^2) = sqrt(9 + 64)
    assert_relative_eq!(m.millimeters, 73.0f64.sqrt());
}

#[test]
fn test_measurement_display_precision() {
    let m = Calibration::new(0.1, 0.1).measure(p(0.0, 0.0), p(33.3, 0.0));
    assert_eq!(m.to_string(), "33 px, 3.33 mm");
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

#[test]
fn test_line_commit_label() {
    let mut engine = engine(DrawMode::Line);
    drag(&mut engine, p(100.0, 100.0), p(200.0, 100.0), Modifiers::NONE);

    assert!(engine.temporary().is_none());
    let lines = engine.permanent();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].label.text, "L: 100 px, 10.00 mm");
    assert_eq!(lines[0].label.color, Color::RED);
    assert!(!lines[0].stroke.dashed);
    assert_eq!(lines[0].label.anchor, p(205.0, 95.0));
}

#[test]
fn test_line_preview_follows_pointer() {
    let mut engine = engine(DrawMode::Line);
    engine.pointer_down(p(10.0, 10.0), PRIMARY);

    let preview = engine.temporary().unwrap();
    assert!(preview.stroke.dashed);
    assert_eq!(preview.label.text, "L: 0 px, 0.00 mm");

    engine.pointer_move(p(10.0, 30.0), Modifiers::NONE);
    assert_eq!(engine.temporary().unwrap().label.text, "L: 20 px, 2.00 mm");
    assert!(engine.permanent().is_empty());
}

#[test]
fn test_ctrl_locks_horizontal() {
    let mut engine = engine(DrawMode::Line);
    drag(&mut engine, p(10.0, 10.0), p(50.0, 40.0), CTRL);
    assert_eq!(
        engine.permanent()[0].shape,
        Shape::Line {
            p0: p(10.0, 10.0),
            p1: p(50.0, 10.0)
        }
    );
}

#[test]
fn test_shift_locks_vertical() {
    let mut engine = engine(DrawMode::Line);
    drag(&mut engine, p(10.0, 10.0), p(50.0, 40.0), SHIFT);
    assert_eq!(
        engine.permanent()[0].shape,
        Shape::Line {
            p0: p(10.0, 10.0),
            p1: p(10.0, 40.0)
        }
    );
}

#[test]
fn test_ctrl_locks_preview_horizontal() {
    let mut engine = engine(DrawMode::Line);
    engine.pointer_down(p(10.0, 10.0), PRIMARY);
    for pos in [p(50.0, 40.0), p(-20.0, 3.0), p(70.0, 95.0)] {
        engine.pointer_move(pos, CTRL);
        let Shape::Line { p0, p1 } = engine.temporary().unwrap().shape else {
            panic!("expected a line preview");
        };
        assert_eq!(p0, p(10.0, 10.0));
        assert_eq!(p1, p(pos.x, 10.0));
    }
    assert!(engine.permanent().is_empty());
}

#[test]
fn test_shift_locks_preview_vertical() {
    let mut engine = engine(DrawMode::Line);
    engine.pointer_down(p(10.0, 10.0), PRIMARY);
    for pos in [p(50.0, 40.0), p(-20.0, 3.0), p(70.0, 95.0)] {
        engine.pointer_move(pos, SHIFT);
        let Shape::Line { p1, .. } = engine.temporary().unwrap().shape else {
            panic!("expected a line preview");
        };
        assert_eq!(p1, p(10.0, pos.y));
    }
}

#[test]
fn test_circle_preview_ignores_modifiers() {
    let mut engine = engine(DrawMode::Circle);
    engine.pointer_down(p(0.0, 0.0), PRIMARY);
    engine.pointer_up(p(0.0, 0.0), PRIMARY, Modifiers::NONE);
    engine.pointer_down(p(0.0, 0.0), PRIMARY);

    for modifiers in [CTRL, SHIFT] {
        engine.pointer_move(p(30.0, 40.0), modifiers);
        assert_eq!(
            engine.temporary().unwrap().shape,
            Shape::Circle {
                center: p(0.0, 0.0),
                radius_point: p(30.0, 40.0),
            }
        );
    }
}

#[test]
fn test_lines_accumulate() {
    let mut engine = engine(DrawMode::Line);
    for i in 0..3 {
        let y = 10.0 * i as f64;
        drag(&mut engine, p(0.0, y), p(10.0, y), Modifiers::NONE);
    }
    assert_eq!(engine.permanent().len(), 3);
    assert_eq!(engine.mode(), DrawMode::Line);
}

// ---------------------------------------------------------------------------
// Circles
// ---------------------------------------------------------------------------

#[test]
fn test_circle_two_click_protocol() {
    let mut engine = engine(DrawMode::Circle);
    assert!(engine.awaiting_center());

    // First click fixes the center; nothing is committed.
    engine.pointer_down(p(50.0, 50.0), PRIMARY);
    assert!(!engine.awaiting_center());
    engine.pointer_up(p(50.0, 50.0), PRIMARY, Modifiers::NONE);
    assert!(engine.permanent().is_empty());
    assert_eq!(engine.pending_center(), Some(p(50.0, 50.0)));

    // Second press drags the radius out from the fixed center.
    engine.pointer_down(p(90.0, 90.0), PRIMARY);
    engine.pointer_move(p(80.0, 50.0), Modifiers::NONE);
    assert_eq!(engine.temporary().unwrap().label.text, "R: 30 px, 3.00 mm");
    engine.pointer_up(p(80.0, 50.0), PRIMARY, Modifiers::NONE);

    let circles = engine.permanent();
    assert_eq!(circles.len(), 1);
    assert_eq!(
        circles[0].shape,
        Shape::Circle {
            center: p(50.0, 50.0),
            radius_point: p(80.0, 50.0)
        }
    );
    assert_eq!(circles[0].label.color, Color::BLUE);
    assert_eq!(circles[0].label.anchor, p(85.0, 15.0));
    assert!(engine.awaiting_center());
    assert!(engine.temporary().is_none());
}

#[test]
fn test_circle_ignores_modifiers() {
    let mut engine = engine(DrawMode::Circle);
    engine.pointer_down(p(0.0, 0.0), PRIMARY);
    engine.pointer_up(p(0.0, 0.0), PRIMARY, Modifiers::NONE);
    drag(&mut engine, p(0.0, 0.0), p(30.0, 40.0), CTRL);

    let m = engine.permanent()[0].measurement;
    assert_relative_eq!(m.pixels, 50.0);
}

#[test]
fn test_second_circle_needs_new_center() {
    let mut engine = engine(DrawMode::Circle);
    for _ in 0..2 {
        engine.pointer_down(p(10.0, 10.0), PRIMARY);
        engine.pointer_up(p(10.0, 10.0), PRIMARY, Modifiers::NONE);
        drag(&mut engine, p(10.0, 10.0), p(20.0, 10.0), Modifiers::NONE);
    }
    assert_eq!(engine.permanent().len(), 2);
    assert!(engine.awaiting_center());
}

// ---------------------------------------------------------------------------
// Mode handling and spurious events
// ---------------------------------------------------------------------------

#[test]
fn test_none_mode_ignores_everything() {
    let mut engine = engine(DrawMode::None);
    drag(&mut engine, p(0.0, 0.0), p(10.0, 10.0), Modifiers::NONE);
    assert!(engine.temporary().is_none());
    assert!(engine.permanent().is_empty());
}

#[test]
fn test_non_primary_buttons_are_ignored() {
    let mut engine = engine(DrawMode::Line);
    engine.pointer_down(p(0.0, 0.0), PointerButton::Secondary);
    assert!(!engine.is_dragging());

    engine.pointer_down(p(0.0, 0.0), PRIMARY);
    engine.pointer_up(p(10.0, 0.0), PointerButton::Middle, Modifiers::NONE);
    assert!(engine.is_dragging());
    assert!(engine.permanent().is_empty());
}

#[test]
fn test_move_and_up_without_press_are_ignored() {
    let mut engine = engine(DrawMode::Line);
    engine.pointer_move(p(5.0, 5.0), Modifiers::NONE);
    engine.pointer_up(p(5.0, 5.0), PRIMARY, Modifiers::NONE);
    assert!(engine.temporary().is_none());
    assert!(engine.permanent().is_empty());
}

#[test]
fn test_set_mode_discards_preview() {
    let mut engine = engine(DrawMode::Circle);
    engine.pointer_down(p(5.0, 5.0), PRIMARY);
    assert!(engine.temporary().is_some());

    engine.set_mode(DrawMode::Line);
    assert!(engine.temporary().is_none());
    assert!(!engine.awaiting_center());
    assert!(engine.pending_center().is_none());

    engine.set_mode(DrawMode::Circle);
    assert!(engine.awaiting_center());
}

#[test]
fn test_clear_keeps_mode_and_circle_state() {
    let mut engine = engine(DrawMode::Circle);
    engine.pointer_down(p(0.0, 0.0), PRIMARY);
    engine.pointer_up(p(0.0, 0.0), PRIMARY, Modifiers::NONE);
    drag(&mut engine, p(0.0, 0.0), p(5.0, 0.0), Modifiers::NONE);
    engine.pointer_down(p(9.0, 9.0), PRIMARY);
    engine.pointer_up(p(9.0, 9.0), PRIMARY, Modifiers::NONE);

    engine.clear_all();
    assert!(engine.permanent().is_empty());
    assert_eq!(engine.mode(), DrawMode::Circle);
    assert!(!engine.awaiting_center());
    assert_eq!(engine.pending_center(), Some(p(9.0, 9.0)));
}

#[test]
fn test_calibration_change_keeps_committed_labels() {
    let mut engine = engine(DrawMode::Line);
    drag(&mut engine, p(0.0, 0.0), p(10.0, 0.0), Modifiers::NONE);
    engine.set_mm_per_px_x(1.0);
    drag(&mut engine, p(0.0, 0.0), p(10.0, 0.0), Modifiers::NONE);

    assert_eq!(engine.permanent()[0].label.text, "L: 10 px, 1.00 mm");
    assert_eq!(engine.permanent()[1].label.text, "L: 10 px, 10.00 mm");
}

// ---------------------------------------------------------------------------
// Visual scale
// ---------------------------------------------------------------------------

#[test]
fn test_visual_scale_from_width() {
    assert_eq!(
        VisualScale::for_frame_width(640),
        VisualScale {
            font_size: 21,
            line_width: 2
        }
    );
    assert_eq!(
        VisualScale::for_frame_width(10),
        VisualScale {
            font_size: 1,
            line_width: 1
        }
    );
    assert_eq!(
        VisualScale::for_frame_width(4000),
        VisualScale {
            font_size: 60,
            line_width: 5
        }
    );
}

#[test]
fn test_styling_captured_at_creation() {
    let mut engine = engine(DrawMode::Line);
    engine.scale_for_frame_width(640);
    drag(&mut engine, p(0.0, 0.0), p(10.0, 0.0), Modifiers::NONE);
    engine.scale_for_frame_width(3000);

    let line = &engine.permanent()[0];
    assert_eq!(line.label.font_size, 21);
    assert_eq!(line.stroke.width, 2);
    assert_eq!(engine.visual_scale().line_width, 5);
}
