//! Energy-system model: a queryable object graph of areas and assets.
//!
//! The calculation service only needs a lookup-by-identifier across the
//! whole graph, expressed by [`EnergySystemModel`]. [`EnergySystem`] is the
//! JSON-backed implementation used by the binary and the tests.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Asset type name of photovoltaic installations.
pub const PV_INSTALLATION: &str = "PVInstallation";

/// A queryable energy-system object graph.
pub trait EnergySystemModel {
    /// Returns every identified object of the graph in depth-first order.
    fn objects(&self) -> Vec<ModelObject<'_>>;
}

/// A borrowed node of the model graph.
#[derive(Debug, Clone, Copy)]
pub enum ModelObject<'a> {
    Area(&'a Area),
    Asset(&'a Asset),
}

impl<'a> ModelObject<'a> {
    /// Identifier of the underlying object, borrowed from the model.
    pub fn id(&self) -> &'a str {
        match self {
            ModelObject::Area(area) => &area.id,
            ModelObject::Asset(asset) => &asset.id,
        }
    }
}

/// Root of a persisted energy-system description.
#[derive(Debug, Clone, Deserialize)]
pub struct EnergySystem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

/// A geographical or logical area holding assets and nested sub-areas.
#[derive(Debug, Clone, Deserialize)]
pub struct Area {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub areas: Vec<Area>,
}

/// A physical asset.
///
/// Physical attributes absent from the description default to `0`, so an
/// incomplete installation still resolves and is rejected later by the
/// positive-parameter check.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Asset class, e.g. `"PVInstallation"`.
    #[serde(rename = "type", default)]
    pub asset_type: String,
    /// Panel surface area (m²).
    #[serde(rename = "surfaceArea", default)]
    pub surface_area: f64,
    /// Panel efficiency (fraction).
    #[serde(rename = "panelEfficiency", default)]
    pub panel_efficiency: f64,
}

impl Asset {
    /// Creates a PV installation asset.
    pub fn pv_installation(id: &str, surface_area: f64, panel_efficiency: f64) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            asset_type: PV_INSTALLATION.to_string(),
            surface_area,
            panel_efficiency,
        }
    }
}

impl EnergySystem {
    /// Creates a system with a single top-level area holding `assets`.
    pub fn with_assets(id: &str, assets: Vec<Asset>) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            areas: vec![Area {
                id: format!("{id}-area"),
                name: None,
                assets,
                areas: Vec::new(),
            }],
        }
    }

    /// Parses an energy system from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Model {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| Error::Model {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parses an energy system from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the JSON is invalid.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Model {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }
}

impl EnergySystemModel for EnergySystem {
    fn objects(&self) -> Vec<ModelObject<'_>> {
        let mut out = Vec::new();
        for area in &self.areas {
            collect_area(area, &mut out);
        }
        out
    }
}

fn collect_area<'a>(area: &'a Area, out: &mut Vec<ModelObject<'a>>) {
    out.push(ModelObject::Area(area));
    for asset in &area.assets {
        out.push(ModelObject::Asset(asset));
    }
    for sub in &area.areas {
        collect_area(sub, out);
    }
}
