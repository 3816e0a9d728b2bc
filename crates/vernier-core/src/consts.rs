/// Period of the orchestrator's consumption tick, in milliseconds.
pub const FRAME_UPDATE_PERIOD_MS: u64 = 50;

/// Poll period of network-stream workers (~30 Hz), in milliseconds.
pub const STREAM_POLL_PERIOD_MS: u64 = 33;

/// Smallest accepted calibration factor, in millimeters per pixel.
pub const MIN_MM_PER_PIXEL: f64 = 0.001;

/// Calibration factor used until the operator sets one.
pub const DEFAULT_MM_PER_PIXEL: f64 = 0.001;

/// Label font size is frame width divided by this, clamped to
/// [`MIN_FONT_SIZE`, `MAX_FONT_SIZE`].
pub const FONT_SIZE_DIVISOR: u32 = 30;
pub const MIN_FONT_SIZE: u32 = 1;
pub const MAX_FONT_SIZE: u32 = 60;

/// Stroke width is frame width divided by this, clamped to
/// [`MIN_LINE_WIDTH`, `MAX_LINE_WIDTH`].
pub const LINE_WIDTH_DIVISOR: u32 = 300;
pub const MIN_LINE_WIDTH: u32 = 1;
pub const MAX_LINE_WIDTH: u32 = 5;

/// Font size and stroke width before any frame has been seen.
pub const DEFAULT_FONT_SIZE: u32 = 10;
pub const DEFAULT_LINE_WIDTH: u32 = 1;

/// Decimal digits shown for pixel lengths.
pub const PX_DISPLAY_PRECISION: usize = 0;

/// Decimal digits shown for physical lengths.
pub const MM_DISPLAY_PRECISION: usize = 2;

/// Horizontal gap between a shape's extent and its label, in pixels.
pub const LABEL_OFFSET_X: f64 = 5.0;

/// Vertical gap between a shape's extent and its label, in pixels.
pub const LABEL_OFFSET_Y: f64 = 5.0;

/// Relative zoom change per zoom-in/zoom-out step.
pub const ZOOM_STEP: f32 = 0.05;
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 20.0;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Canny-style hysteresis thresholds on the 0..255 gradient scale.
pub const DEFAULT_EDGE_LOW_THRESHOLD: f32 = 100.0;
pub const DEFAULT_EDGE_HIGH_THRESHOLD: f32 = 200.0;

/// Pre-smoothing sigma for edge detection (roughly a 5x5 kernel).
pub const DEFAULT_EDGE_BLUR_SIGMA: f32 = 1.0;

/// Sigma of the standalone blur stage.
pub const DEFAULT_BLUR_SIGMA: f32 = 1.5;

/// ITU-R BT.601 luminance coefficients.
pub const LUMINANCE_R: f32 = 0.299;
pub const LUMINANCE_G: f32 = 0.587;
pub const LUMINANCE_B: f32 = 0.114;
