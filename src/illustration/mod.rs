pub mod detector;
pub mod diffusion;
pub mod plume;
pub mod secm;

pub use detector::DetectorDemo;
pub use diffusion::DiffusionDemo;
pub use plume::ElectrodePlume;
pub use secm::{SecmScan, SecmViews, TickReport};
