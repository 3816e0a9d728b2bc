use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use vernier_core::config::ViewerConfig;
use vernier_core::transform::StageKind;
use vernier_core::viewer::VideoViewer;

use crate::summary::{print_run_summary, RunSummary};

/// Longest sleep between tick attempts.
const MAX_IDLE_SLEEP: Duration = Duration::from_millis(5);

#[derive(Args)]
pub struct RunArgs {
    /// Number of frames to consume
    #[arg(short = 'n', long, default_value = "100")]
    pub frames: u64,

    /// Enable edge detection
    #[arg(long)]
    pub edges: bool,

    /// Enable Gaussian blur
    #[arg(long)]
    pub blur: bool,

    /// Read from a network stream locator instead of the local device
    #[arg(long)]
    pub stream: Option<String>,

    /// Capture device to open (description or id)
    #[arg(long)]
    pub device: Option<String>,

    /// Format index of the device
    #[arg(long)]
    pub format: Option<usize>,

    /// Save the last displayed frame as PNG
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Give up after this many seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

pub fn run(args: &RunArgs, config: &ViewerConfig) -> Result<()> {
    let mut config = config.clone();
    config.transforms.edge_detect |= args.edges;
    config.transforms.blur |= args.blur;
    if args.device.is_some() {
        config.device.preferred = args.device.clone();
    }
    if args.format.is_some() {
        config.device.format_index = args.format;
    }

    let mut viewer = VideoViewer::from_config(&config);
    viewer.start();
    let source_name = match &args.stream {
        Some(locator) => {
            viewer.add_network_source(locator);
            viewer
                .switch_source(locator)
                .with_context(|| format!("Failed to switch to stream {locator}"))?;
            locator.clone()
        }
        None => config
            .device
            .preferred
            .clone()
            .unwrap_or_else(|| "default device".into()),
    };

    let pb = ProgressBar::new(args.frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Capturing");

    let started = Instant::now();
    let deadline = started + Duration::from_secs(args.timeout);
    while viewer.frames_shown() < args.frames {
        let now = Instant::now();
        if now > deadline {
            pb.abandon_with_message("Timed out");
            bail!(
                "Timed out after {} of {} frames",
                viewer.frames_shown(),
                args.frames
            );
        }
        if viewer.tick_if_due(now) {
            pb.set_position(viewer.frames_shown());
        } else {
            let wait = viewer.ticker().until_next(now);
            std::thread::sleep(wait.clamp(Duration::from_millis(1), MAX_IDLE_SLEEP));
        }
    }
    pb.finish_with_message("Done");
    let elapsed = started.elapsed();

    if let Some(ref path) = args.snapshot {
        viewer
            .snapshot(path)
            .with_context(|| format!("Failed to save snapshot {}", path.display()))?;
    }

    let stages: Vec<StageKind> = viewer.chain().kinds();
    print_run_summary(&RunSummary {
        source: source_name,
        resolution: viewer.current_frame().map(|f| f.dimensions()),
        frames: viewer.frames_shown(),
        elapsed,
        stages,
        snapshot: args.snapshot.clone(),
    });

    viewer.shutdown();
    Ok(())
}
