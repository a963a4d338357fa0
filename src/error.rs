//! Error types for secm_viz.

use thiserror::Error;

/// Rejected parameter combinations, reported by `SecmConfig::validate`.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("scan domain must be positive and finite, got {width}x{height}")]
    InvalidDomain { width: f32, height: f32 },

    #[error("scan step must be positive, got {0}")]
    InvalidStep(f32),

    #[error("scan row step must be positive, got {0}")]
    InvalidRowStep(f32),

    #[error("maximum signal must be positive, got {0}")]
    InvalidMaxSignal(f32),

    #[error("signal decrement must be non-negative, got {0}")]
    InvalidDecrement(f32),

    #[error("raster buffer must be at least 1x1, got {width}x{height}")]
    InvalidRaster { width: usize, height: usize },

    #[error("{name} must lie in (0, 1], got {value}")]
    InvalidFactor { name: &'static str, value: f32 },

    #[error("electrode bar must be positive, got {width}x{height}")]
    InvalidElectrode { width: f32, height: f32 },

    #[error("catalyst radius must be positive, got {0}")]
    InvalidCatalystRadius(f32),

    #[error("catalyst strip height must be positive, got {0}")]
    InvalidStripHeight(f32),

    #[error("image intensity scale must be non-negative, got {0}")]
    InvalidIntensityScale(f32),

    #[error("expiry alpha must lie in [0, 1), got {0}")]
    InvalidExpiryAlpha(f32),
}

/// Failure to bring up the decorative background.
#[derive(Debug, Error, PartialEq)]
pub enum BackdropError {
    #[error("viewport {width}x{height} is too small for the backdrop")]
    DegenerateViewport { width: f32, height: f32 },

    #[error("backdrop needs at least one contour, got {0}")]
    NoContours(usize),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
