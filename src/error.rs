//! Error types for parameter resolution and power calculations.

use std::path::PathBuf;

use thiserror::Error;

use crate::params::EntityId;

/// Result type for calculation service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to resolve a requested installation against the energy-system model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    /// No object in the model carries the requested identifier.
    #[error("entity {entity_id} not found in energy system model")]
    NotFound { entity_id: EntityId },

    /// More than one object in the model carries the requested identifier.
    #[error("entity {entity_id} is ambiguous: {count} objects share this id")]
    Ambiguous { entity_id: EntityId, count: usize },

    /// The identifier belongs to an object that is not an asset.
    #[error("entity {entity_id} is not an asset")]
    NotAnAsset { entity_id: EntityId },
}

/// Errors raised by the calculation service and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Initialization could not resolve an entity.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A tick arrived for an entity that was never initialized.
    #[error("unknown entity {entity_id}: not initialized")]
    UnknownEntity { entity_id: EntityId },

    /// A resolved physical parameter is not strictly positive.
    #[error("invalid parameter for entity {entity_id}: {name} = {value} (must be > 0)")]
    InvalidParameter {
        entity_id: EntityId,
        name: &'static str,
        value: f64,
    },

    /// A required input is missing from the parameter bag.
    #[error("calculation {calculation}: missing input {input}")]
    MissingInput {
        calculation: &'static str,
        input: &'static str,
    },

    /// No calculation is registered under this name.
    #[error("unknown calculation {0}")]
    UnknownCalculation(String),

    /// A calculation was invoked before the service was initialized.
    #[error("calculation service not initialized")]
    NotInitialized,

    /// The service was initialized a second time.
    #[error("calculation service already initialized")]
    AlreadyInitialized,

    /// The energy-system model could not be loaded.
    #[error("failed to load energy system from {path}: {message}")]
    Model { path: PathBuf, message: String },

    /// An irradiance profile could not be loaded.
    #[error("failed to load irradiance profile from {path}: {message}")]
    Profile { path: PathBuf, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_names_entity_parameter_and_value() {
        let err = Error::InvalidParameter {
            entity_id: EntityId::from("pv-1"),
            name: "surface_area",
            value: 0.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("pv-1"));
        assert!(msg.contains("surface_area"));
        assert!(msg.contains("= 0"));
    }

    #[test]
    fn resolution_error_is_transparent() {
        let err: Error = ResolutionError::NotFound {
            entity_id: EntityId::from("missing"),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "entity missing not found in energy system model"
        );
    }
}
