mod common;

use std::time::{Duration, Instant};

use common::{fast_capture, vga_capture, wait_until, TIMEOUT};
use vernier_core::config::ViewerConfig;
use vernier_core::frame::PixelFormat;
use vernier_core::measure::{Calibration, DrawMode, Modifiers, Point, PointerButton};
use vernier_core::source::{DeviceSource, SyntheticDecoder, VideoFormat};
use vernier_core::transform::StageKind;
use vernier_core::viewer::{VideoViewer, ViewerEvent};

fn viewer_with(capture: vernier_core::source::SyntheticCapture) -> VideoViewer {
    let mut viewer = VideoViewer::new(DeviceSource::new(capture), &ViewerConfig::default())
        .with_decoder_factory(|| Box::new(SyntheticDecoder));
    viewer.start();
    viewer
}

/// Tick until a frame is shown.
fn tick_frame(viewer: &mut VideoViewer) {
    assert!(wait_until(TIMEOUT, || viewer.tick()), "no frame reached the viewer");
}

fn draw_line(viewer: &mut VideoViewer, from: Point, to: Point) {
    let engine = viewer.engine_mut();
    engine.pointer_down(from, PointerButton::Primary);
    engine.pointer_move(to, Modifiers::NONE);
    engine.pointer_up(to, PointerButton::Primary, Modifiers::NONE);
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn test_line_measurement_survives_edge_toggle() {
    let mut viewer = viewer_with(vga_capture());
    tick_frame(&mut viewer);
    assert_eq!(viewer.current_frame().unwrap().dimensions(), (640, 480));

    viewer.set_calibration(Calibration::new(0.1, 0.1));
    viewer.set_draw_mode(DrawMode::Line);
    draw_line(&mut viewer, Point::new(100.0, 100.0), Point::new(200.0, 100.0));
    assert_eq!(viewer.engine().permanent()[0].label.text, "L: 100 px, 10.00 mm");

    viewer.set_transform_enabled(StageKind::EdgeDetect, true);
    assert!(viewer.transform_enabled(StageKind::EdgeDetect));
    tick_frame(&mut viewer);
    assert_eq!(viewer.engine().permanent().len(), 1);

    viewer.set_transform_enabled(StageKind::EdgeDetect, false);
    tick_frame(&mut viewer);
    let annotations = viewer.engine().permanent();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].label.text, "L: 100 px, 10.00 mm");
}

#[test]
fn test_tick_rescales_annotations_to_frame() {
    let mut viewer = viewer_with(vga_capture());
    let events = viewer.subscribe();
    // Readiness is reported before the first frame is published.
    assert!(wait_until(TIMEOUT, || viewer.source(0).unwrap().is_ready()));
    tick_frame(&mut viewer);

    assert_eq!(viewer.engine().visual_scale().font_size, 21);
    assert_eq!(viewer.engine().visual_scale().line_width, 2);
    assert_eq!(viewer.viewport().frame_size(), Some((640, 480)));

    let received: Vec<ViewerEvent> = events.try_iter().collect();
    assert!(received.contains(&ViewerEvent::FrameResized {
        width: 640,
        height: 480
    }));
    assert!(received.contains(&ViewerEvent::SourcesChanged(vec!["VGA Camera".into()])));
}

#[test]
fn test_tick_without_new_frame_keeps_display() {
    let mut viewer = viewer_with(vga_capture());
    tick_frame(&mut viewer);
    let shown = viewer.frames_shown();

    // An immediate second tick usually finds no new frame; either way the
    // display is never emptied.
    viewer.tick();
    assert!(viewer.current_frame().is_some());
    assert!(viewer.frames_shown() >= shown);
}

#[test]
fn test_edge_transform_output_is_displayed() {
    let mut viewer = viewer_with(vga_capture());
    viewer.set_transform_enabled(StageKind::EdgeDetect, true);
    tick_frame(&mut viewer);

    let frame = viewer.current_frame().unwrap();
    assert_eq!(frame.format(), PixelFormat::Bgra8);
    // Edge output is strictly black and white.
    assert!(frame
        .data()
        .chunks_exact(4)
        .all(|px| px == [0, 0, 0, 255] || px == [255, 255, 255, 255]));
}

#[test]
fn test_tick_if_due_respects_period() {
    let mut viewer = viewer_with(vga_capture());
    assert!(wait_until(TIMEOUT, || viewer.source(0).unwrap().is_ready()));

    let now = Instant::now();
    assert!(viewer.tick_if_due(now));
    assert!(!viewer.tick_if_due(now + Duration::from_millis(1)));
}

// ---------------------------------------------------------------------------
// Switching
// ---------------------------------------------------------------------------

#[test]
fn test_switch_source_selects_and_publishes_formats() {
    let mut viewer = viewer_with(fast_capture());
    tick_frame(&mut viewer);
    let events = viewer.subscribe();

    viewer.set_draw_mode(DrawMode::Line);
    draw_line(&mut viewer, Point::new(0.0, 0.0), Point::new(10.0, 0.0));

    viewer.switch_source("Synthetic Camera 1").unwrap();
    assert_eq!(viewer.active_source(), 0);
    assert!(viewer.engine().permanent().is_empty());

    let received: Vec<ViewerEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![ViewerEvent::FormatsChanged(vec![VideoFormat::new(800, 600).with_fps(30)])]
    );

    assert!(wait_until(TIMEOUT, || viewer.tick()
        && viewer.current_frame().map(|f| f.dimensions()) == Some((800, 600))));
}

#[test]
fn test_switch_to_unknown_source_fails() {
    let mut viewer = viewer_with(fast_capture());
    tick_frame(&mut viewer);

    assert!(viewer.switch_source("Missing").is_err());
    assert_eq!(viewer.active_source(), 0);
}

#[test]
fn test_switch_format_clears_annotations() {
    let mut viewer = viewer_with(fast_capture());
    tick_frame(&mut viewer);
    viewer.set_draw_mode(DrawMode::Line);

    draw_line(&mut viewer, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    viewer.switch_format(99);
    assert_eq!(viewer.engine().permanent().len(), 1);

    viewer.switch_format(2);
    assert!(viewer.engine().permanent().is_empty());
    assert!(wait_until(TIMEOUT, || viewer.tick()
        && viewer.current_frame().map(|f| f.dimensions()) == Some((320, 240))));
}

#[test]
fn test_reselecting_current_format_keeps_annotations() {
    let mut viewer = viewer_with(fast_capture());
    tick_frame(&mut viewer);
    viewer.set_draw_mode(DrawMode::Line);

    draw_line(&mut viewer, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    viewer.switch_format(0);
    assert_eq!(viewer.engine().permanent().len(), 1);
}

#[test]
fn test_stream_format_switch_keeps_annotations() {
    let mut viewer = viewer_with(vga_capture());
    viewer.add_network_source("synthetic://160x120");
    assert!(wait_until(TIMEOUT, || {
        viewer.tick();
        viewer.available_sources().contains(&"synthetic://160x120".to_string())
    }));
    viewer.switch_source("synthetic://160x120").unwrap();
    assert!(wait_until(TIMEOUT, || viewer.tick()
        && viewer.current_frame().map(|f| f.dimensions()) == Some((160, 120))));
    assert_eq!(viewer.formats(), vec![VideoFormat::new(160, 120)]);

    viewer.set_draw_mode(DrawMode::Line);
    draw_line(&mut viewer, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    viewer.switch_format(0);
    assert_eq!(viewer.engine().permanent().len(), 1);
}

#[test]
fn test_network_source_is_appended_and_switchable() {
    let mut viewer = viewer_with(vga_capture());
    let index = viewer.add_network_source("synthetic://160x120");
    assert_eq!(index, 1);
    assert_eq!(viewer.source_count(), 2);

    assert!(wait_until(TIMEOUT, || {
        viewer.tick();
        viewer.available_sources().contains(&"synthetic://160x120".to_string())
    }));
    viewer.switch_source("synthetic://160x120").unwrap();
    assert_eq!(viewer.active_source(), 1);
    assert!(wait_until(TIMEOUT, || viewer.tick()
        && viewer.current_frame().map(|f| f.dimensions()) == Some((160, 120))));
}

#[test]
fn test_config_network_sources_start_with_viewer() {
    let config = ViewerConfig {
        network_sources: vec!["synthetic://32x32".into()],
        ..ViewerConfig::default()
    };
    let mut viewer = VideoViewer::new(DeviceSource::new(vga_capture()), &config)
        .with_decoder_factory(|| Box::new(SyntheticDecoder));
    assert_eq!(viewer.source_count(), 1);
    viewer.start();
    assert_eq!(viewer.source_count(), 2);
    assert!(viewer.source(1).unwrap().is_running());
}

// ---------------------------------------------------------------------------
// Snapshot and shutdown
// ---------------------------------------------------------------------------

#[test]
fn test_snapshot_requires_frame() {
    let dir = tempfile::tempdir().unwrap();
    let viewer = VideoViewer::new(DeviceSource::new(vga_capture()), &ViewerConfig::default());
    assert!(viewer.snapshot(&dir.path().join("none.png")).is_err());
}

#[test]
fn test_snapshot_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");

    let mut viewer = viewer_with(vga_capture());
    tick_frame(&mut viewer);
    viewer.snapshot(&path).unwrap();

    let loaded = vernier_core::io::load_frame(&path).unwrap();
    assert_eq!(loaded.dimensions(), (640, 480));
    assert_eq!(loaded.data(), viewer.current_frame().unwrap().data());
}

#[test]
fn test_shutdown_stops_all_sources() {
    let mut viewer = viewer_with(vga_capture());
    viewer.add_network_source("synthetic://16x16");
    viewer.shutdown();
    assert!(!viewer.source(0).unwrap().is_running());
    assert!(!viewer.source(1).unwrap().is_running());
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

#[test]
fn test_zoom_steps_and_fit() {
    let mut viewer = viewer_with(vga_capture());
    tick_frame(&mut viewer);

    viewer.fit_to_view(320.0, 480.0);
    approx::assert_relative_eq!(viewer.viewport().zoom(), 0.5);

    viewer.zoom_in();
    approx::assert_relative_eq!(viewer.viewport().zoom(), 0.525, epsilon = 1e-6);
    viewer.zoom_out();
    approx::assert_relative_eq!(viewer.viewport().zoom(), 0.49875, epsilon = 1e-6);

    let view = viewer.viewport().frame_to_view(Point::new(100.0, 50.0));
    let back = viewer.viewport().view_to_frame(view.0, view.1);
    approx::assert_relative_eq!(back.x, 100.0, epsilon = 1e-3);
    approx::assert_relative_eq!(back.y, 50.0, epsilon = 1e-3);
}

#[test]
fn test_zoom_is_clamped() {
    let mut viewer = viewer_with(vga_capture());
    for _ in 0..200 {
        viewer.zoom_out();
    }
    approx::assert_relative_eq!(viewer.viewport().zoom(), 0.1);
    for _ in 0..400 {
        viewer.zoom_in();
    }
    approx::assert_relative_eq!(viewer.viewport().zoom(), 20.0);
}
