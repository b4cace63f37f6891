//! `foothold.toml`: scan tuning, marker styling and scene gating.

use std::error::Error;
use std::fs;
use std::path::Path;

use foothold_runtime::{ActivationMode, ScanSettings};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FootholdConfig {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub debug: DebugOptions,
    #[serde(default)]
    pub scenes: Scenes,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct General {
    #[serde(default = "default_activation_key")]
    pub activation_key: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_detection_range")]
    pub detection_range: f32,
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f32,
    #[serde(default = "default_max_points")]
    pub max_points_per_frame: u32,
    #[serde(default = "default_true")]
    pub concave_detection: bool,
}
fn default_activation_key() -> String {
    "F".into()
}
fn default_mode() -> String {
    ActivationMode::Continuous.name().into()
}
fn default_detection_range() -> f32 {
    10.0
}
fn default_grid_spacing() -> f32 {
    0.5
}
fn default_max_points() -> u32 {
    100
}
fn default_true() -> bool {
    true
}
impl Default for General {
    fn default() -> Self {
        Self {
            activation_key: default_activation_key(),
            mode: default_mode(),
            detection_range: default_detection_range(),
            grid_spacing: default_grid_spacing(),
            max_points_per_frame: default_max_points(),
            concave_detection: default_true(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StandableColor {
    #[default]
    White,
    Green,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NonStandableColor {
    #[default]
    Red,
    Magenta,
}

impl StandableColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            StandableColor::White => [255, 255, 255],
            StandableColor::Green => [0, 255, 0],
        }
    }
}

impl NonStandableColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            NonStandableColor::Red => [255, 0, 0],
            NonStandableColor::Magenta => [255, 0, 255],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Appearance {
    #[serde(default)]
    pub standable_color: StandableColor,
    #[serde(default)]
    pub non_standable_color: NonStandableColor,
    #[serde(default = "default_scale_percent")]
    pub scale_percent: f32,
}
fn default_scale_percent() -> f32 {
    100.0
}
impl Default for Appearance {
    fn default() -> Self {
        Self {
            standable_color: StandableColor::default(),
            non_standable_color: NonStandableColor::default(),
            scale_percent: default_scale_percent(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DebugOptions {
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_stats_interval")]
    pub stats_interval_frames: u32,
}
fn default_stats_interval() -> u32 {
    120
}
impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            stats_interval_frames: default_stats_interval(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Scenes {
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
}
fn default_prefixes() -> Vec<String> {
    vec!["Level_".into(), "Airport".into()]
}
impl Default for Scenes {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
        }
    }
}

impl Scenes {
    /// Only scenes whose name starts with a configured prefix get scanned.
    pub fn allows(&self, scene: &str) -> bool {
        self.prefixes.iter().any(|p| scene.starts_with(p.as_str()))
    }
}

fn clamp_logged<T: PartialOrd + Copy + std::fmt::Display>(name: &str, v: T, lo: T, hi: T) -> T {
    // NaN compares false both ways and falls through to `lo`
    let clamped = if v >= lo && v <= hi {
        v
    } else if v > hi {
        hi
    } else {
        lo
    };
    if clamped != v {
        log::warn!("config: {} = {} out of range [{}, {}], using {}", name, v, lo, hi, clamped);
    }
    clamped
}

impl FootholdConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: FootholdConfig = toml::from_str(s)?;
        Ok(cfg.validated())
    }

    /// Pulls every numeric field into its allowed range and normalizes the mode name.
    pub fn validated(mut self) -> Self {
        let g = &mut self.general;
        g.detection_range = clamp_logged("general.detection_range", g.detection_range, 5.0, 28.0);
        g.grid_spacing = clamp_logged("general.grid_spacing", g.grid_spacing, 0.1, 2.0);
        g.max_points_per_frame =
            clamp_logged("general.max_points_per_frame", g.max_points_per_frame, 10, 20_000);
        match g.mode.parse::<ActivationMode>() {
            Ok(m) => g.mode = m.name().into(),
            Err(e) => {
                log::warn!("config: {}, using {}", e, ActivationMode::Continuous);
                g.mode = default_mode();
            }
        }
        if g.activation_key.trim().is_empty() {
            log::warn!("config: empty activation_key, using {}", default_activation_key());
            g.activation_key = default_activation_key();
        }
        let a = &mut self.appearance;
        a.scale_percent = clamp_logged("appearance.scale_percent", a.scale_percent, 1.0, 200.0);
        let d = &mut self.debug;
        d.stats_interval_frames = d.stats_interval_frames.max(1);
        self
    }

    pub fn activation_mode(&self) -> ActivationMode {
        self.general.mode.parse().unwrap_or_default()
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings::new(
            self.general.grid_spacing,
            self.general.detection_range,
            self.general.max_points_per_frame,
            self.general.concave_detection,
        )
    }

    /// Marker scale in world units (a fifth of a unit at 100%).
    pub fn marker_scale(&self) -> f32 {
        0.2 * self.appearance.scale_percent / 100.0
    }

    /// Marker pool size: one marker per column of the active area.
    pub fn marker_pool_size(&self) -> usize {
        let per_axis = 2.0 * self.general.detection_range / self.general.grid_spacing;
        (per_axis * per_axis) as usize
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FootholdConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    FootholdConfig::from_toml_str(&s)
}
