//! Per-installation physical parameters resolved once from the energy-system model.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, ResolutionError, Result};
use crate::model::{EnergySystemModel, ModelObject, PV_INSTALLATION};

/// Opaque, globally unique identifier of one installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Static physical constants of one PV installation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParameters {
    /// Panel surface area (m²).
    pub surface_area: f64,
    /// Panel efficiency (fraction of irradiance converted to power).
    pub panel_efficiency: f64,
}

impl PhysicalParameters {
    /// Checks that both parameters are strictly positive.
    ///
    /// NaN is rejected as well.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first offending
    /// parameter (surface area is checked before efficiency).
    pub fn validate(&self, entity_id: &EntityId) -> Result<()> {
        check_positive(entity_id, "surface_area", self.surface_area)?;
        check_positive(entity_id, "panel_efficiency", self.panel_efficiency)
    }
}

fn check_positive(entity_id: &EntityId, name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            entity_id: entity_id.clone(),
            name,
            value,
        })
    }
}

/// Immutable map from installation id to its physical parameters.
///
/// Built once by [`ParameterStore::initialize`]; there is no mutation path
/// afterwards, so a store can be shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: HashMap<EntityId, PhysicalParameters>,
}

impl ParameterStore {
    /// Resolves every id in `entity_ids` against `model`.
    ///
    /// The model graph is traversed once; each id must then match exactly
    /// one asset.
    ///
    /// # Errors
    ///
    /// * [`ResolutionError::NotFound`] if an id has no matching object
    /// * [`ResolutionError::Ambiguous`] if several objects share the id
    /// * [`ResolutionError::NotAnAsset`] if the id belongs to an area
    pub fn initialize<M>(
        entity_ids: &[EntityId],
        model: &M,
    ) -> std::result::Result<Self, ResolutionError>
    where
        M: EnergySystemModel + ?Sized,
    {
        let objects = model.objects();
        let mut index: HashMap<&str, Vec<ModelObject<'_>>> = HashMap::new();
        for object in &objects {
            index.entry(object.id()).or_default().push(*object);
        }

        let mut params = HashMap::with_capacity(entity_ids.len());
        for entity_id in entity_ids {
            let asset = match index.get(entity_id.as_str()).map(Vec::as_slice) {
                None | Some([]) => {
                    return Err(ResolutionError::NotFound {
                        entity_id: entity_id.clone(),
                    });
                }
                Some([ModelObject::Asset(asset)]) => *asset,
                Some([ModelObject::Area(_)]) => {
                    return Err(ResolutionError::NotAnAsset {
                        entity_id: entity_id.clone(),
                    });
                }
                Some(matches) => {
                    return Err(ResolutionError::Ambiguous {
                        entity_id: entity_id.clone(),
                        count: matches.len(),
                    });
                }
            };

            if asset.asset_type != PV_INSTALLATION {
                warn!(
                    entity_id = %entity_id,
                    asset_type = %asset.asset_type,
                    "resolved asset is not a PV installation"
                );
            }

            let resolved = PhysicalParameters {
                surface_area: asset.surface_area,
                panel_efficiency: asset.panel_efficiency,
            };
            info!(
                entity_id = %entity_id,
                surface_area = resolved.surface_area,
                panel_efficiency = resolved.panel_efficiency,
                "resolved installation parameters"
            );
            params.insert(entity_id.clone(), resolved);
        }

        Ok(Self { params })
    }

    /// Returns the parameters stored for `entity_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntity`] if the id was never initialized.
    pub fn get(&self, entity_id: &EntityId) -> Result<&PhysicalParameters> {
        self.params.get(entity_id).ok_or_else(|| Error::UnknownEntity {
            entity_id: entity_id.clone(),
        })
    }

    /// Number of resolved installations.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Resolved ids in sorted order.
    pub fn entity_ids(&self) -> Vec<&EntityId> {
        let mut ids: Vec<&EntityId> = self.params.keys().collect();
        ids.sort();
        ids
    }
}
