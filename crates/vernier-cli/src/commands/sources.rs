use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use vernier_core::config::ViewerConfig;
use vernier_core::source::{FrameSource, ReadyPoll};
use vernier_core::viewer::default_device_source;

#[derive(Args)]
pub struct SourcesArgs {
    /// Seconds to wait for the capture backend
    #[arg(long, default_value = "5")]
    pub timeout: u64,
}

pub fn run(args: &SourcesArgs, config: &ViewerConfig) -> Result<()> {
    let mut source = default_device_source(config);
    println!("Backend:     {}", source.backend_name());

    let Some(signal) = source.start() else {
        bail!("Device source is already running");
    };
    let ready = match signal.wait(Duration::from_secs(args.timeout)) {
        ReadyPoll::Ready(ready) => ready,
        ReadyPoll::Failed => {
            source.stop();
            bail!("No capture device could be opened");
        }
        ReadyPoll::Pending => {
            source.stop();
            bail!("Timed out waiting for the capture backend");
        }
    };

    println!("Devices:     {}", ready.devices.len());
    for device in &ready.devices {
        // Formats belong to the selected device, so select each in turn.
        source.select(device)?;
        println!();
        println!("  {device}");
        for (index, format) in source.list_formats().iter().enumerate() {
            println!("    [{index}] {format}");
        }
    }

    source.stop();
    Ok(())
}
