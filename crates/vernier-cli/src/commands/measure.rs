use anyhow::Result;
use clap::{Args, ValueEnum};
use vernier_core::config::ViewerConfig;
use vernier_core::measure::{DrawMode, MeasurementEngine, Modifiers, Point, PointerButton};

#[derive(Clone, Copy, ValueEnum)]
pub enum ShapeArg {
    Line,
    Circle,
}

#[derive(Args)]
pub struct MeasureArgs {
    /// Shape to draw
    #[arg(value_enum)]
    pub shape: ShapeArg,

    /// Start point (line) or center (circle), as X,Y in pixels
    #[arg(value_parser = parse_point)]
    pub from: Point,

    /// End point (line) or a point on the circle, as X,Y in pixels
    #[arg(value_parser = parse_point)]
    pub to: Point,

    /// Millimeters per pixel, horizontal (overrides the config)
    #[arg(long)]
    pub mm_per_px_x: Option<f64>,

    /// Millimeters per pixel, vertical (overrides the config)
    #[arg(long)]
    pub mm_per_px_y: Option<f64>,

    /// Lock the line horizontally
    #[arg(long, conflicts_with = "vertical")]
    pub horizontal: bool,

    /// Lock the line vertically
    #[arg(long)]
    pub vertical: bool,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad X in '{s}': {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad Y in '{s}': {e}"))?;
    Ok(Point::new(x, y))
}

/// Replay the pointer gestures an operator would make and print the label.
pub fn run(args: &MeasureArgs, config: &ViewerConfig) -> Result<()> {
    let mut calibration = config.calibration.to_calibration();
    if let Some(x) = args.mm_per_px_x {
        calibration.set_mm_per_px_x(x);
    }
    if let Some(y) = args.mm_per_px_y {
        calibration.set_mm_per_px_y(y);
    }

    let modifiers = Modifiers {
        ctrl: args.horizontal,
        shift: args.vertical,
    };
    let mut engine = MeasurementEngine::new(calibration);
    match args.shape {
        ShapeArg::Line => engine.set_mode(DrawMode::Line),
        ShapeArg::Circle => {
            engine.set_mode(DrawMode::Circle);
            engine.pointer_down(args.from, PointerButton::Primary);
            engine.pointer_up(args.from, PointerButton::Primary, modifiers);
        }
    }
    engine.pointer_down(args.from, PointerButton::Primary);
    engine.pointer_move(args.to, modifiers);
    engine.pointer_up(args.to, PointerButton::Primary, modifiers);

    for annotation in engine.permanent() {
        println!("{}", annotation.label.text);
    }
    Ok(())
}
