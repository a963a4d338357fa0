//! Simulations behind the SECM walkthrough.
//!
//! Everything here is single-threaded and frame-driven: the host calls each
//! illustration's `tick` once per displayed frame and hands it a `Surface`
//! to draw on. The only parallel work is inside `ParticleSystem::step`.

pub mod backdrop;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod illustration;
pub mod particle;
pub mod pixel_matrix;
pub mod raster;
pub mod reaction;
pub mod scanner;
pub mod schedule;
pub mod signal;
pub mod surface;

pub use config::SecmConfig;
pub use error::{BackdropError, ConfigError};
pub use particle::{Particle, ParticleSystem};
pub use raster::{RasterCompositor, RasterImage};
pub use scanner::{ElectrodeScanner, ElectrodeState, ScanEvent};
pub use signal::{SignalAccumulator, SignalSample};
