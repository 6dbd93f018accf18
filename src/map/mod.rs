use crate::errors::{HexRouteError, HexRouteResult};
use crate::spatial::{CellId, LatLon, SpatialIndex, Tessellation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};
use validator::Validate;

pub mod attributes;
pub mod cell;
pub mod roads;
pub mod snapshot;

pub use attributes::{Attribute, AttributeKind, AttributeValue, SubAttribute, SubAttributeKind};
pub use cell::{Cell, RoadTopology};
pub use roads::RoadAdjacencyGraph;
pub use snapshot::GridSnapshot;

/// Repository of cells keyed by identifier, plus the derived-attribute registry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Grid {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub tessellation: Tessellation,
    /// Resolution the grid was ingested at
    #[validate(range(max = 15))]
    pub resolution: u8,
    /// Bounding polygon, in order
    pub region: Vec<LatLon>,
    cells: HashMap<CellId, Cell>,
    attribute_kinds: BTreeMap<String, usize>,
}

impl Grid {
    /// Create an empty grid with validation
    pub fn new(name: impl Into<String>, tessellation: Tessellation, resolution: u8) -> HexRouteResult<Self> {
        let grid = Self {
            name: name.into(),
            tessellation,
            resolution,
            region: Vec::new(),
            cells: HashMap::new(),
            attribute_kinds: BTreeMap::new(),
        };

        grid.validate().map_err(|e| HexRouteError::InvalidGridData {
            reason: format!("Grid validation failed: {e}"),
        })?;

        Ok(grid)
    }

    pub fn with_region(mut self, region: Vec<LatLon>) -> Self {
        self.region = region;
        self
    }

    /// Insert a cell, replacing any cell with the same identifier
    pub fn add_cell(&mut self, cell: Cell) -> Option<Cell> {
        self.cells.insert(cell.id, cell)
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Cell identifiers in ascending order
    pub fn sorted_ids(&self) -> Vec<CellId> {
        let mut ids: Vec<CellId> = self.cells.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Append an attribute to an existing cell
    pub fn attach(&mut self, id: CellId, attribute: Attribute) -> HexRouteResult<()> {
        let cell = self.cells.get_mut(&id).ok_or_else(|| missing_cell(id))?;
        cell.attributes.push(attribute);
        Ok(())
    }

    pub fn set_road_topology(&mut self, id: CellId, road: RoadTopology) -> HexRouteResult<()> {
        let cell = self.cells.get_mut(&id).ok_or_else(|| missing_cell(id))?;
        cell.road = road;
        Ok(())
    }

    /// Record that a derivation pass for `name` has run.
    ///
    /// Returns `false` for a repeated registration, which keeps the first position.
    pub fn register_attribute_kind(&mut self, name: &str) -> bool {
        if let Some(&position) = self.attribute_kinds.get(name) {
            let duplicate = HexRouteError::DuplicateAttributeRegistration {
                kind: name.to_string(),
                position,
            };
            warn!("{duplicate}");
            return false;
        }

        let position = self.attribute_kinds.len();
        self.attribute_kinds.insert(name.to_string(), position);
        debug!("Registered attribute kind '{name}' at position {position}");
        true
    }

    pub fn is_attribute_kind_registered(&self, name: &str) -> bool {
        self.attribute_kinds.contains_key(name)
    }

    /// Registered kinds with their insertion order
    pub fn attribute_kinds(&self) -> &BTreeMap<String, usize> {
        &self.attribute_kinds
    }

    /// Centre of a cell, falling back to the index for cells outside the grid
    pub fn center_of(&self, index: &dyn SpatialIndex, id: CellId) -> HexRouteResult<LatLon> {
        match self.cells.get(&id) {
            Some(cell) => Ok(cell.center),
            None => index.center(id),
        }
    }

    /// Distance between two cell centres as measured by the index
    pub fn dist(&self, index: &dyn SpatialIndex, a: CellId, b: CellId) -> HexRouteResult<f64> {
        Ok(index.distance(self.center_of(index, a)?, self.center_of(index, b)?))
    }

    /// Add every cell within `rings` of `center` that is not already present
    pub fn fill_disk(&mut self, index: &dyn SpatialIndex, center: CellId, rings: u32) -> HexRouteResult<usize> {
        let mut added = 0;
        for id in index.disk(center, rings)? {
            if !self.contains(id) {
                self.add_cell(Cell::create(id, index)?);
                added += 1;
            }
        }
        Ok(added)
    }
}

fn missing_cell(id: CellId) -> HexRouteError {
    HexRouteError::InvalidGridData {
        reason: format!("cell {id} is not part of the grid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::PlanarHexIndex;

    fn planar_grid(rings: u32) -> (Grid, PlanarHexIndex, CellId) {
        let index = PlanarHexIndex::new(100.0);
        let mut grid = Grid::new("test", Tessellation::Planar { base_edge_m: 100.0 }, 0).unwrap();
        let center = index.cell_at(LatLon::new(0.0, 0.0), 0).unwrap();
        grid.fill_disk(&index, center, rings).unwrap();
        (grid, index, center)
    }

    #[test]
    fn test_grid_validation() {
        assert!(Grid::new("", Tessellation::H3, 9).is_err());
        assert!(Grid::new("survey", Tessellation::H3, 16).is_err());
        assert!(Grid::new("survey", Tessellation::H3, 15).is_ok());
    }

    #[test]
    fn test_neighbor_lists_never_contain_self() {
        let (grid, _, _) = planar_grid(3);
        assert_eq!(grid.len(), 37);
        for cell in grid.cells() {
            assert!(cell.neighbors.len() <= 6);
            assert!(!cell.neighbors.contains(&cell.id));
        }
    }

    #[test]
    fn test_add_cell_overwrites() {
        let (mut grid, index, center) = planar_grid(1);
        let mut replacement = Cell::create(center, &index).unwrap();
        replacement.elevation = Some(42.0);

        assert!(grid.add_cell(replacement).is_some());
        assert_eq!(grid.len(), 7);
        assert_eq!(grid.get(center).unwrap().elevation, Some(42.0));
    }

    #[test]
    fn test_attach_and_topology_require_existing_cell() {
        let (mut grid, index, center) = planar_grid(1);
        grid.attach(center, Attribute::marker(AttributeKind::Water)).unwrap();
        grid.set_road_topology(center, RoadTopology::ConnectedRoad).unwrap();

        let cell = grid.get(center).unwrap();
        assert!(cell.has_attribute(AttributeKind::Water));
        assert_eq!(cell.road, RoadTopology::ConnectedRoad);

        let outside = index.cell_at(LatLon::new(5000.0, 5000.0), 0).unwrap();
        assert!(grid.attach(outside, Attribute::marker(AttributeKind::Water)).is_err());
        assert!(grid.set_road_topology(outside, RoadTopology::Junction).is_err());
    }

    #[test]
    fn test_register_attribute_kind_first_wins() {
        let (mut grid, _, _) = planar_grid(0);
        assert!(grid.register_attribute_kind("relief"));
        assert!(grid.register_attribute_kind("roughness"));
        assert!(!grid.register_attribute_kind("relief"));

        assert_eq!(grid.attribute_kinds().get("relief"), Some(&0));
        assert_eq!(grid.attribute_kinds().get("roughness"), Some(&1));
        assert!(grid.is_attribute_kind_registered("roughness"));
    }

    #[test]
    fn test_dist_between_adjacent_cells() {
        let (grid, index, center) = planar_grid(1);
        let neighbor = grid.get(center).unwrap().neighbors[0];
        let d = grid.dist(&index, center, neighbor).unwrap();
        assert!((d - 100.0 * 3f64.sqrt()).abs() < 1e-9);
    }
}
