//! PV-system calculation service: resolves per-installation physical
//! parameters once and converts solar irradiance into electrical power.

/// TOML configuration and presets.
pub mod config;
pub mod error;
/// Result export.
pub mod io;
/// Energy-system model and its loader.
pub mod model;
pub mod params;
pub mod profile;
pub mod service;
/// Local scheduler, clock, and run summary.
pub mod sim;
pub mod transform;

pub use error::{Error, ResolutionError, Result};
pub use params::{EntityId, ParameterStore, PhysicalParameters};
pub use service::PvSystemService;
