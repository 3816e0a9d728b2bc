#![allow(dead_code)]

use std::time::{Duration, Instant};

use vernier_core::frame::{Frame, PixelFormat};
use vernier_core::source::{
    CaptureDevice, FrameSource, ReadyPoll, SourceReady, SyntheticCapture, VideoFormat,
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Poll `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// Synthetic backend with the default devices and a short frame interval.
pub fn fast_capture() -> SyntheticCapture {
    SyntheticCapture::new().with_frame_interval(Duration::from_millis(5))
}

/// Single 640x480 device.
pub fn vga_capture() -> SyntheticCapture {
    SyntheticCapture::with_devices(vec![CaptureDevice {
        id: "vga".into(),
        description: "VGA Camera".into(),
        formats: vec![VideoFormat::new(640, 480)],
    }])
    .with_frame_interval(Duration::from_millis(5))
}

/// Start `source` and block until it reports readiness.
pub fn start_ready(source: &mut dyn FrameSource) -> SourceReady {
    let signal = source.start().expect("source was idle");
    match signal.wait(TIMEOUT) {
        ReadyPoll::Ready(ready) => ready,
        other => panic!("source did not become ready: {other:?}"),
    }
}

/// Take the next published frame, waiting for one.
pub fn next_frame(source: &dyn FrameSource) -> Frame {
    assert!(
        wait_until(TIMEOUT, || source.is_ready()),
        "no frame published"
    );
    source.get_frame().expect("ready implies a frame")
}

/// BGRA frame, black on the left half and white on the right half.
pub fn step_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _y in 0..height {
        for x in 0..width {
            let v = if x < width / 2 { 0 } else { 255 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Frame::from_packed(width, height, PixelFormat::Bgra8, data).unwrap()
}

pub fn solid_frame(width: u32, height: u32, bgra: [u8; 4]) -> Frame {
    Frame::filled_bgra(width, height, bgra).unwrap()
}
