use vernier_core::frame::Frame;

/// Convert a frame in any supported layout to an egui ColorImage.
pub fn frame_to_color_image(frame: &Frame) -> egui::ColorImage {
    let (w, h) = frame.dimensions();
    let pixels = frame
        .to_rgba_bytes()
        .chunks_exact(4)
        .map(|p| egui::Color32::from_rgba_unmultiplied(p[0], p[1], p[2], p[3]))
        .collect();

    egui::ColorImage {
        size: [w as usize, h as usize],
        pixels,
        source_size: Default::default(),
    }
}
