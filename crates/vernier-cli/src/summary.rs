use std::path::PathBuf;
use std::time::Duration;

use console::Style;
use vernier_core::transform::StageKind;

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub struct RunSummary {
    pub source: String,
    pub resolution: Option<(u32, u32)>,
    pub frames: u64,
    pub elapsed: Duration,
    pub stages: Vec<StageKind>,
    pub snapshot: Option<PathBuf>,
}

pub fn print_run_summary(summary: &RunSummary) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Vernier Run"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(11)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Source"),
        s.method.apply_to(&summary.source)
    );
    let resolution = summary
        .resolution
        .map(|(w, h)| format!("{w}x{h}"))
        .unwrap_or_else(|| "-".into());
    println!(
        "  {:<14}{}",
        s.label.apply_to("Resolution"),
        s.value.apply_to(resolution)
    );

    let secs = summary.elapsed.as_secs_f64();
    let fps = if secs > 0.0 {
        summary.frames as f64 / secs
    } else {
        0.0
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(summary.frames)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Elapsed"),
        s.value.apply_to(format!("{secs:.2} s ({fps:.1} fps)"))
    );

    if summary.stages.is_empty() {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Transforms"),
            s.disabled.apply_to("none")
        );
    } else {
        let names: Vec<String> = summary.stages.iter().map(|k| k.to_string()).collect();
        println!(
            "  {:<14}{}",
            s.label.apply_to("Transforms"),
            s.method.apply_to(names.join(" \u{2192} "))
        );
    }

    if let Some(ref path) = summary.snapshot {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Snapshot"),
            s.path.apply_to(path.display())
        );
    }
    println!();
}
