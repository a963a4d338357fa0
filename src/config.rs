//! Simulation parameters.
//!
//! Every group has a `Default` built from the `DEFAULT_*` constants below and
//! can be overridden from a JSON preset passed on the command line.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::scanner::HitTest;
use crate::signal::Response;

// ===================================================================================
// Default Constants (used as initial slider defaults)
// ===================================================================================

pub const DEFAULT_DOMAIN_WIDTH: f32 = 400.0;
pub const DEFAULT_DOMAIN_HEIGHT: f32 = 200.0;
pub const DEFAULT_SCAN_STEP: f32 = 2.0;
pub const DEFAULT_ROW_STEP: f32 = 10.0;

pub const DEFAULT_BAR_WIDTH: f32 = 60.0;
pub const DEFAULT_BAR_HEIGHT: f32 = 10.0;
pub const DEFAULT_FACE_OFFSET: f32 = 40.0;

pub const DEFAULT_DIFFUSION: f32 = 0.1;
pub const DEFAULT_MAX_SPEED: f32 = 2.0;
pub const DEFAULT_DRAG: f32 = 0.99;
pub const DEFAULT_ATTRACTION: f32 = 0.001;
pub const DEFAULT_NEAR_DECAY: f32 = 0.995;
pub const DEFAULT_FAR_DECAY: f32 = 0.97;
pub const DEFAULT_EXPIRY_ALPHA: f32 = 0.01;

pub const DEFAULT_MAX_SIGNAL: f32 = 200.0;
pub const DEFAULT_DECREMENT: f32 = 10.0;
pub const DEFAULT_COLLISION_WEIGHT: f32 = 15.0;

pub const DEFAULT_INTENSITY_SCALE: f32 = 30.0;

pub const DEFAULT_CATALYST_RADIUS: f32 = 50.0;
pub const DEFAULT_SPAWN_CHANCE: f64 = 0.5;
pub const DEFAULT_SPAWN_SPEED: f32 = 2.5;
pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 50;
pub const DEFAULT_STRIP_HEIGHT: f32 = 5.0;
pub const DEFAULT_WIDTH_PER_PARTICLE: f32 = 10.0;

// ===================================================================================
// Parameter groups
// ===================================================================================

/// Logical raster domain `[0, width) x [0, height)` and the probe stride.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub width: f32,
    pub height: f32,
    pub step: f32,
    pub row_step: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            width: DEFAULT_DOMAIN_WIDTH,
            height: DEFAULT_DOMAIN_HEIGHT,
            step: DEFAULT_SCAN_STEP,
            row_step: DEFAULT_ROW_STEP,
        }
    }
}

/// Size of the electrode bar. `face_offset` places the detecting face of the
/// side view above the bottom edge of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectrodeConfig {
    pub bar_width: f32,
    pub bar_height: f32,
    pub face_offset: f32,
    pub hit_test: HitTest,
}

impl Default for ElectrodeConfig {
    fn default() -> Self {
        ElectrodeConfig {
            bar_width: DEFAULT_BAR_WIDTH,
            bar_height: DEFAULT_BAR_HEIGHT,
            face_offset: DEFAULT_FACE_OFFSET,
            hit_test: HitTest::TopFace,
        }
    }
}

/// Per-tick particle forces and fading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Width of the uniform velocity jitter added every tick.
    pub diffusion: f32,
    pub max_speed: Option<f32>,
    pub drag: f32,
    /// Pull towards the reference centre per unit of displacement.
    pub attraction: f32,
    /// Attraction only acts beyond this distance.
    pub attraction_radius: f32,
    pub near_decay: f32,
    pub far_decay: f32,
    /// Past this distance alpha decays with `far_decay`.
    pub far_radius: f32,
    pub expiry_alpha: f32,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        DynamicsConfig {
            diffusion: DEFAULT_DIFFUSION,
            max_speed: Some(DEFAULT_MAX_SPEED),
            drag: DEFAULT_DRAG,
            attraction: DEFAULT_ATTRACTION,
            attraction_radius: DEFAULT_CATALYST_RADIUS * 2.0,
            near_decay: DEFAULT_NEAR_DECAY,
            far_decay: DEFAULT_FAR_DECAY,
            far_radius: DEFAULT_CATALYST_RADIUS * 3.0,
            expiry_alpha: DEFAULT_EXPIRY_ALPHA,
        }
    }
}

impl DynamicsConfig {
    /// Free drift with a single constant fade, no forces.
    pub fn ballistic(decay: f32) -> Self {
        DynamicsConfig {
            diffusion: 0.0,
            max_speed: None,
            drag: 1.0,
            attraction: 0.0,
            attraction_radius: 0.0,
            near_decay: decay,
            far_decay: decay,
            far_radius: f32::MAX,
            expiry_alpha: DEFAULT_EXPIRY_ALPHA,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub max: f32,
    pub decrement: f32,
    pub collision_weight: f32,
    pub response: Response,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            max: DEFAULT_MAX_SIGNAL,
            decrement: DEFAULT_DECREMENT,
            collision_weight: DEFAULT_COLLISION_WEIGHT,
            response: Response::Accumulate,
        }
    }
}

/// Pixel size of the persistent signal image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub width: usize,
    pub height: usize,
    pub intensity_scale: f32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        RasterConfig {
            width: DEFAULT_DOMAIN_WIDTH as usize,
            height: DEFAULT_DOMAIN_HEIGHT as usize,
            intensity_scale: DEFAULT_INTENSITY_SCALE,
        }
    }
}

/// Where and how often catalytic products appear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub catalyst_radius: f32,
    pub spawn_chance: f64,
    pub spawn_speed: f32,
    pub batch_interval_ms: u64,
    pub strip_height: f32,
    pub width_per_particle: f32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        EmitterConfig {
            catalyst_radius: DEFAULT_CATALYST_RADIUS,
            spawn_chance: DEFAULT_SPAWN_CHANCE,
            spawn_speed: DEFAULT_SPAWN_SPEED,
            batch_interval_ms: DEFAULT_BATCH_INTERVAL_MS,
            strip_height: DEFAULT_STRIP_HEIGHT,
            width_per_particle: DEFAULT_WIDTH_PER_PARTICLE,
        }
    }
}

/// Everything the combined SECM scan needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecmConfig {
    pub scan: ScanConfig,
    pub electrode: ElectrodeConfig,
    pub dynamics: DynamicsConfig,
    pub signal: SignalConfig,
    pub raster: RasterConfig,
    pub emitter: EmitterConfig,
}

impl SecmConfig {
    pub fn validate(&self) -> Result<()> {
        let scan = &self.scan;
        if !(scan.width.is_finite() && scan.height.is_finite())
            || scan.width <= 0.0
            || scan.height <= 0.0
        {
            return Err(ConfigError::InvalidDomain {
                width: scan.width,
                height: scan.height,
            });
        }
        if !(scan.step > 0.0) {
            return Err(ConfigError::InvalidStep(scan.step));
        }
        if !(scan.row_step > 0.0) {
            return Err(ConfigError::InvalidRowStep(scan.row_step));
        }
        if !(self.signal.max > 0.0) {
            return Err(ConfigError::InvalidMaxSignal(self.signal.max));
        }
        if !(self.signal.decrement >= 0.0) {
            return Err(ConfigError::InvalidDecrement(self.signal.decrement));
        }
        if self.raster.width == 0 || self.raster.height == 0 {
            return Err(ConfigError::InvalidRaster {
                width: self.raster.width,
                height: self.raster.height,
            });
        }
        if !(self.raster.intensity_scale >= 0.0) {
            return Err(ConfigError::InvalidIntensityScale(self.raster.intensity_scale));
        }

        let electrode = &self.electrode;
        if !(electrode.bar_width > 0.0 && electrode.bar_height > 0.0) {
            return Err(ConfigError::InvalidElectrode {
                width: electrode.bar_width,
                height: electrode.bar_height,
            });
        }
        if !(self.emitter.catalyst_radius > 0.0) {
            return Err(ConfigError::InvalidCatalystRadius(self.emitter.catalyst_radius));
        }
        if !(self.emitter.strip_height > 0.0) {
            return Err(ConfigError::InvalidStripHeight(self.emitter.strip_height));
        }
        let expiry = self.dynamics.expiry_alpha;
        if !(0.0..1.0).contains(&expiry) {
            return Err(ConfigError::InvalidExpiryAlpha(expiry));
        }

        let factors = [
            ("drag", self.dynamics.drag),
            ("near_decay", self.dynamics.near_decay),
            ("far_decay", self.dynamics.far_decay),
        ];
        for (name, value) in factors {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidFactor { name, value });
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a preset and rejects it if it does not validate.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: SecmConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
