mod common;

use common::{solid_frame, step_frame};
use vernier_core::error::{Result, VernierError};
use vernier_core::frame::{Frame, PixelFormat};
use vernier_core::transform::{
    EdgeDetector, GaussianBlur, StageKind, TransformChain, TransformStage,
};

/// Replaces every pixel with one grey level.
struct Fill {
    kind: StageKind,
    level: u8,
}

impl TransformStage for Fill {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn process(&self, frame: &Frame) -> Result<Frame> {
        let v = self.level;
        Frame::filled_bgra(frame.width(), frame.height(), [v, v, v, 255])
    }
}

fn fill(kind: StageKind, level: u8) -> Box<dyn TransformStage> {
    Box::new(Fill { kind, level })
}

struct Failing;

impl TransformStage for Failing {
    fn kind(&self) -> StageKind {
        StageKind::GaussianBlur
    }

    fn process(&self, _frame: &Frame) -> Result<Frame> {
        Err(VernierError::Transform("always fails".into()))
    }
}

// ---------------------------------------------------------------------------
// Chain operations
// ---------------------------------------------------------------------------

#[test]
fn test_empty_chain_passes_frame_through() {
    let chain = TransformChain::new();
    let input = solid_frame(4, 4, [10, 20, 30, 255]);
    assert_eq!(chain.apply(&input).data(), input.data());
}

#[test]
fn test_add_kind_is_idempotent() {
    let mut chain = TransformChain::new();
    chain.add_kind(StageKind::EdgeDetect);
    chain.add_kind(StageKind::EdgeDetect);
    assert_eq!(chain.len(), 1);
    assert!(chain.contains_kind(StageKind::EdgeDetect));
    assert!(!chain.contains_kind(StageKind::GaussianBlur));
}

#[test]
fn test_remove_kind_removes_every_instance() {
    let mut chain = TransformChain::new();
    chain.insert(fill(StageKind::EdgeDetect, 1));
    chain.add_kind(StageKind::GaussianBlur);
    chain.insert(fill(StageKind::EdgeDetect, 2));
    assert_eq!(chain.len(), 3);

    chain.remove_kind(StageKind::EdgeDetect);
    assert_eq!(chain.kinds(), vec![StageKind::GaussianBlur]);

    chain.remove_kind(StageKind::EdgeDetect);
    assert_eq!(chain.len(), 1);
}

#[test]
fn test_stages_run_in_insertion_order() {
    let mut chain = TransformChain::new();
    chain.insert(fill(StageKind::EdgeDetect, 10));
    chain.insert(fill(StageKind::GaussianBlur, 20));

    let out = chain.apply(&solid_frame(3, 3, [0, 0, 0, 255]));
    assert_eq!(out.pixel(1, 1), &[20, 20, 20, 255]);
}

#[test]
fn test_failing_stage_returns_original_input() {
    let mut chain = TransformChain::new();
    chain.insert(fill(StageKind::EdgeDetect, 99));
    chain.insert(Box::new(Failing));

    let input = solid_frame(3, 3, [1, 2, 3, 255]);
    let out = chain.apply(&input);
    assert_eq!(out.data(), input.data());
}

#[test]
fn test_unsupported_format_falls_back_to_input() {
    let mut chain = TransformChain::new();
    chain.add_kind(StageKind::EdgeDetect);

    let rgb = Frame::from_packed(2, 2, PixelFormat::Rgb8, vec![50; 12]).unwrap();
    let out = chain.apply(&rgb);
    assert_eq!(out.format(), PixelFormat::Rgb8);
    assert_eq!(out.data(), rgb.data());
}

// ---------------------------------------------------------------------------
// Edge detection
// ---------------------------------------------------------------------------

#[test]
fn test_edge_detector_rejects_non_bgra() {
    let rgb = Frame::from_packed(4, 4, PixelFormat::Rgb8, vec![0; 48]).unwrap();
    let err = EdgeDetector::default().process(&rgb);
    assert!(matches!(err, Err(VernierError::UnsupportedFormat(PixelFormat::Rgb8))));
}

#[test]
fn test_edge_detector_finds_vertical_step() {
    let input = step_frame(32, 16).with_sequence(42);
    let out = EdgeDetector::default().process(&input).unwrap();

    assert_eq!(out.format(), PixelFormat::Bgra8);
    assert_eq!(out.dimensions(), (32, 16));
    assert_eq!(out.sequence(), 42);

    let row = 8;
    let edge_cols: Vec<u32> = (0..32).filter(|&x| out.pixel(x, row)[0] == 255).collect();
    assert!(!edge_cols.is_empty(), "step must produce an edge");
    assert!(edge_cols.iter().all(|&x| (14..=17).contains(&x)));

    // Flat regions stay black with opaque alpha.
    assert_eq!(out.pixel(3, row), &[0, 0, 0, 255]);
    assert_eq!(out.pixel(28, row), &[0, 0, 0, 255]);
}

#[test]
fn test_edge_detector_flat_frame_has_no_edges() {
    let out = EdgeDetector::default()
        .process(&solid_frame(20, 20, [128, 128, 128, 255]))
        .unwrap();
    assert!(out.data().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn test_edge_detector_rejects_inverted_thresholds() {
    let detector = EdgeDetector {
        low_threshold: 200.0,
        high_threshold: 100.0,
        blur_sigma: 1.0,
    };
    assert!(detector.process(&step_frame(8, 8)).is_err());
}

// ---------------------------------------------------------------------------
// Blur
// ---------------------------------------------------------------------------

#[test]
fn test_blur_keeps_flat_colour_and_alpha() {
    let input = solid_frame(16, 16, [40, 80, 120, 200]);
    let out = GaussianBlur::default().process(&input).unwrap();
    assert_eq!(out.pixel(8, 8), &[40, 80, 120, 200]);
    assert_eq!(out.pixel(0, 0), &[40, 80, 120, 200]);
}

#[test]
fn test_blur_softens_step() {
    let out = GaussianBlur { sigma: 2.0 }.process(&step_frame(32, 4)).unwrap();
    let left = out.pixel(15, 2)[0];
    let right = out.pixel(16, 2)[0];
    assert!(left > 0 && left < 255);
    assert!(right > 0 && right < 255);
    assert_eq!(out.pixel(0, 2)[0], 0);
    assert_eq!(out.pixel(31, 2)[0], 255);
}

#[test]
fn test_blur_rejects_bad_sigma() {
    let stage = GaussianBlur { sigma: 0.0 };
    assert!(stage.process(&solid_frame(4, 4, [0, 0, 0, 255])).is_err());
}
