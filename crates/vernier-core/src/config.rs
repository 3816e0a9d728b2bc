use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::{
    DEFAULT_BLUR_SIGMA, DEFAULT_EDGE_BLUR_SIGMA, DEFAULT_EDGE_HIGH_THRESHOLD,
    DEFAULT_EDGE_LOW_THRESHOLD, DEFAULT_MM_PER_PIXEL, FRAME_UPDATE_PERIOD_MS,
};
use crate::error::{Result, VernierError};
use crate::measure::{Calibration, DrawMode};
use crate::transform::{EdgeDetector, GaussianBlur, StageSettings};

/// Viewer settings, stored as TOML. Missing sections take their defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Consumption tick period in milliseconds.
    pub frame_period_ms: u64,
    pub calibration: CalibrationConfig,
    pub transforms: TransformConfig,
    /// Stream locators added at start-up.
    pub network_sources: Vec<String>,
    pub draw_mode: DrawMode,
    /// Clear committed annotations when the source or format changes.
    pub clear_on_switch: bool,
    pub device: DeviceConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            frame_period_ms: FRAME_UPDATE_PERIOD_MS,
            calibration: CalibrationConfig::default(),
            transforms: TransformConfig::default(),
            network_sources: Vec::new(),
            draw_mode: DrawMode::None,
            clear_on_switch: true,
            device: DeviceConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| VernierError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VernierError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Tick period, at least one millisecond.
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms.max(1))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub mm_per_px_x: f64,
    pub mm_per_px_y: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            mm_per_px_x: DEFAULT_MM_PER_PIXEL,
            mm_per_px_y: DEFAULT_MM_PER_PIXEL,
        }
    }
}

impl CalibrationConfig {
    /// Out-of-range factors are clamped to the minimum.
    pub fn to_calibration(&self) -> Calibration {
        Calibration::new(self.mm_per_px_x, self.mm_per_px_y)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub edge_detect: bool,
    pub blur: bool,
    pub edge: EdgeConfig,
    pub blur_sigma: f32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            edge_detect: false,
            blur: false,
            edge: EdgeConfig::default(),
            blur_sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

impl TransformConfig {
    pub fn stage_settings(&self) -> StageSettings {
        StageSettings {
            edge: EdgeDetector {
                low_threshold: self.edge.low_threshold,
                high_threshold: self.edge.high_threshold,
                blur_sigma: self.edge.blur_sigma,
            },
            blur: GaussianBlur {
                sigma: self.blur_sigma,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub blur_sigma: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_EDGE_LOW_THRESHOLD,
            high_threshold: DEFAULT_EDGE_HIGH_THRESHOLD,
            blur_sigma: DEFAULT_EDGE_BLUR_SIGMA,
        }
    }
}

/// Initial device selection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device description or id to open instead of the first one.
    pub preferred: Option<String>,
    pub format_index: Option<usize>,
}
