pub mod config;
pub mod error;
pub mod types;

pub use config::{AcquisitionConfig, Config, RenderBackend};
pub use error::{PriceScoutError, Result};
pub use types::*;
