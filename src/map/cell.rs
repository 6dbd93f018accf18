use crate::errors::HexRouteResult;
use crate::map::attributes::{Attribute, AttributeKind};
use crate::spatial::{CellId, LatLon, SpatialIndex};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Road presence and connectivity of a cell
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize,
)]
pub enum RoadTopology {
    #[default]
    NoRoad,
    /// Road that cannot be crossed from the surrounding terrain
    IsolatedRoad,
    /// Ordinary traversable road
    ConnectedRoad,
    /// Explicit connector onto an isolated road
    Junction,
}

impl RoadTopology {
    /// Highway and entry-type cells that can launch road shortcuts
    pub fn is_hub(self) -> bool {
        matches!(self, RoadTopology::IsolatedRoad | RoadTopology::Junction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub vertices: Vec<LatLon>,
    pub center: LatLon,
    /// 1-ring neighbours; may reference cells outside the grid
    pub neighbors: Vec<CellId>,
    pub road: RoadTopology,
    pub elevation: Option<f64>,
    pub slope: Option<f64>,
    /// Terrain class code -> occurrence count
    pub terrain: BTreeMap<u16, u32>,
    pub attributes: Vec<Attribute>,
}

impl Cell {
    /// Build a bare cell from the index geometry
    pub fn create(id: CellId, index: &dyn SpatialIndex) -> HexRouteResult<Self> {
        let neighbors = index
            .neighbors(id)?
            .into_iter()
            .filter(|neighbor| *neighbor != id)
            .collect();

        Ok(Self {
            id,
            vertices: index.boundary(id)?,
            center: index.center(id)?,
            neighbors,
            road: RoadTopology::NoRoad,
            elevation: None,
            slope: None,
            terrain: BTreeMap::new(),
            attributes: Vec::new(),
        })
    }

    /// First attribute of `kind`
    pub fn attribute(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.kind == kind)
    }

    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        self.attribute(kind).is_some()
    }

    pub fn record_terrain_class(&mut self, code: u16) {
        *self.terrain.entry(code).or_insert(0) += 1;
    }

    /// Most frequent terrain class, smallest code on ties
    pub fn dominant_terrain_class(&self) -> Option<u16> {
        self.terrain
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(code, _)| *code)
    }
}
