use crate::config::range_types::{CvThreshold, DiscountFactor};
use crate::map::{AttributeKind, Cell, Grid, RoadAdjacencyGraph, RoadTopology};
use crate::spatial::CellId;
use serde::{Deserialize, Serialize};

/// An off-grid edge offered by [`CostModel::enhance`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortcut {
    pub target: CellId,
    /// Multiplier on the centre distance to `target`
    pub cost_factor: f64,
    /// Road topology the target takes on for the rest of the run
    pub topology: RoadTopology,
}

/// Edge-cost policy consulted by the planner.
///
/// The planner evaluates the hooks in a fixed order: a passable road pair
/// overrides every rejection, otherwise a rejected edge is skipped and a
/// surviving edge is priced through [`CostModel::reward`].
pub trait CostModel: Send + Sync {
    /// Road pairs that are always crossable
    fn has_passable_road(&self, current: RoadTopology, neighbor: RoadTopology) -> bool;

    /// Factor applied to a passable-road edge, in (0, 1]
    fn passable_road_discount(&self) -> f64;

    /// Veto the edge into `neighbor`
    fn reject(&self, current: RoadTopology, neighbor: &Cell, grid: &Grid) -> bool;

    /// Adjusted cost of entering `neighbor`; never larger than `base_cost`
    fn reward(&self, neighbor: &Cell, base_cost: f64) -> f64;

    /// Road shortcuts leaving `current`, in ascending target order
    fn enhance(
        &self,
        current: CellId,
        topology: RoadTopology,
        roads: &RoadAdjacencyGraph,
    ) -> Vec<Shortcut>;

    /// Derived attribute this model depends on, checked once per run
    fn required_attribute_kind(&self) -> Option<AttributeKind> {
        None
    }

    /// Cost of the edge into `neighbor`, or `None` when it is rejected
    fn edge_cost(
        &self,
        current: RoadTopology,
        neighbor: &Cell,
        grid: &Grid,
        base_cost: f64,
    ) -> Option<f64> {
        if self.has_passable_road(current, neighbor.road) {
            return Some(base_cost * self.passable_road_discount());
        }
        if self.reject(current, neighbor, grid) {
            return None;
        }
        Some(self.reward(neighbor, base_cost))
    }
}

/// Tunables for [`TerrainCostModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostSettings {
    pub passable_road_discount: DiscountFactor,
    pub road_reward: DiscountFactor,
    pub road_shortcut_factor: DiscountFactor,
    pub blocking_kinds: Vec<AttributeKind>,
    /// Reject cells whose elevation coefficient of variation exceeds this
    pub cv_threshold: Option<CvThreshold>,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            passable_road_discount: DiscountFactor::new(0.1),
            road_reward: DiscountFactor::new(0.4),
            road_shortcut_factor: DiscountFactor::new(0.2),
            blocking_kinds: vec![
                AttributeKind::Water,
                AttributeKind::Building,
                AttributeKind::Forest,
                AttributeKind::Plowland,
                AttributeKind::ShrubWood,
            ],
            cv_threshold: None,
        }
    }
}

/// Road, land-cover and relief aware cost model
#[derive(Debug, Clone, Default)]
pub struct TerrainCostModel {
    settings: CostSettings,
}

impl TerrainCostModel {
    pub fn new(settings: CostSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CostSettings {
        &self.settings
    }

    fn incompatible_roads(current: RoadTopology, neighbor: RoadTopology) -> bool {
        use RoadTopology::*;
        matches!((current, neighbor), (IsolatedRoad, NoRoad) | (NoRoad, IsolatedRoad))
    }

    fn exceeds_cv(&self, neighbor: &Cell, grid: &Grid) -> bool {
        let Some(threshold) = self.settings.cv_threshold else {
            return false;
        };
        let kind = AttributeKind::ElevationCoefficientOfVariation;
        // Not derived for this grid: nothing can be vouched for
        if !grid.is_attribute_kind_registered(&kind.name()) {
            return true;
        }
        match neighbor.attribute(kind).and_then(|a| a.value().as_number()) {
            Some(cv) => cv > threshold.get(),
            None => true,
        }
    }
}

impl CostModel for TerrainCostModel {
    fn has_passable_road(&self, current: RoadTopology, neighbor: RoadTopology) -> bool {
        use RoadTopology::*;
        matches!(
            (current, neighbor),
            (NoRoad, ConnectedRoad)
                | (IsolatedRoad, IsolatedRoad)
                | (IsolatedRoad, ConnectedRoad)
                | (ConnectedRoad, IsolatedRoad)
                | (ConnectedRoad, ConnectedRoad)
        )
    }

    fn passable_road_discount(&self) -> f64 {
        self.settings.passable_road_discount.get()
    }

    fn reject(&self, current: RoadTopology, neighbor: &Cell, grid: &Grid) -> bool {
        Self::incompatible_roads(current, neighbor.road)
            || self
                .settings
                .blocking_kinds
                .iter()
                .any(|kind| neighbor.has_attribute(*kind))
            || self.exceeds_cv(neighbor, grid)
    }

    fn reward(&self, neighbor: &Cell, base_cost: f64) -> f64 {
        match neighbor.road {
            RoadTopology::ConnectedRoad => self.settings.road_reward.apply(base_cost),
            _ => base_cost,
        }
    }

    fn enhance(
        &self,
        current: CellId,
        topology: RoadTopology,
        roads: &RoadAdjacencyGraph,
    ) -> Vec<Shortcut> {
        if !topology.is_hub() {
            return Vec::new();
        }
        roads
            .neighbors(current)
            .map(|target| Shortcut {
                target,
                cost_factor: self.settings.road_shortcut_factor.get(),
                topology: RoadTopology::Junction,
            })
            .collect()
    }

    fn required_attribute_kind(&self) -> Option<AttributeKind> {
        self.settings
            .cv_threshold
            .map(|_| AttributeKind::ElevationCoefficientOfVariation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Attribute;
    use crate::spatial::{LatLon, PlanarHexIndex, SpatialIndex, Tessellation};

    fn grid_with_cell() -> (Grid, CellId) {
        let index = PlanarHexIndex::new(100.0);
        let mut grid = Grid::new("cost", Tessellation::Planar { base_edge_m: 100.0 }, 0).unwrap();
        let id = index.cell_at(LatLon::new(0.0, 0.0), 0).unwrap();
        grid.fill_disk(&index, id, 0).unwrap();
        (grid, id)
    }

    #[test]
    fn test_passable_road_bypasses_rejection() {
        let model = TerrainCostModel::default();
        let (mut grid, id) = grid_with_cell();
        grid.attach(id, Attribute::marker(AttributeKind::Water)).unwrap();
        grid.attach(id, Attribute::marker(AttributeKind::Building)).unwrap();
        grid.set_road_topology(id, RoadTopology::ConnectedRoad).unwrap();
        let cell = grid.get(id).unwrap();

        assert!(model.reject(RoadTopology::NoRoad, cell, &grid));
        assert!(model.has_passable_road(RoadTopology::NoRoad, cell.road));
        let cost = model.edge_cost(RoadTopology::NoRoad, cell, &grid, 100.0).unwrap();
        assert!((cost - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_each_blocking_kind_rejects() {
        let model = TerrainCostModel::default();
        for kind in [
            AttributeKind::Water,
            AttributeKind::Building,
            AttributeKind::Forest,
            AttributeKind::Plowland,
            AttributeKind::ShrubWood,
        ] {
            let (mut grid, id) = grid_with_cell();
            grid.attach(id, Attribute::marker(kind)).unwrap();
            let cell = grid.get(id).unwrap();
            assert_eq!(model.edge_cost(RoadTopology::NoRoad, cell, &grid, 1.0), None, "{kind}");
        }

        let (mut grid, id) = grid_with_cell();
        grid.attach(id, Attribute::marker(AttributeKind::Grass)).unwrap();
        let cell = grid.get(id).unwrap();
        assert_eq!(model.edge_cost(RoadTopology::NoRoad, cell, &grid, 1.0), Some(1.0));
    }

    #[test]
    fn test_isolated_road_cannot_meet_open_terrain() {
        let model = TerrainCostModel::default();
        let (mut grid, id) = grid_with_cell();
        assert!(model.reject(RoadTopology::IsolatedRoad, grid.get(id).unwrap(), &grid));

        grid.set_road_topology(id, RoadTopology::IsolatedRoad).unwrap();
        assert!(model.reject(RoadTopology::NoRoad, grid.get(id).unwrap(), &grid));
        assert!(!model.reject(RoadTopology::Junction, grid.get(id).unwrap(), &grid));
    }

    #[test]
    fn test_cv_threshold_is_conservative() {
        let model = TerrainCostModel::new(CostSettings {
            cv_threshold: Some(CvThreshold::new(0.3)),
            ..CostSettings::default()
        });
        let cv = AttributeKind::ElevationCoefficientOfVariation;
        let (mut grid, id) = grid_with_cell();
        grid.attach(id, Attribute::number(cv, 0.1)).unwrap();

        // Kind never derived for this grid
        assert!(model.reject(RoadTopology::NoRoad, grid.get(id).unwrap(), &grid));

        grid.register_attribute_kind(&cv.name());
        assert!(!model.reject(RoadTopology::NoRoad, grid.get(id).unwrap(), &grid));

        let (mut steep, steep_id) = grid_with_cell();
        steep.register_attribute_kind(&cv.name());
        assert!(model.reject(RoadTopology::NoRoad, steep.get(steep_id).unwrap(), &steep));
        steep.attach(steep_id, Attribute::number(cv, 0.8)).unwrap();
        assert!(model.reject(RoadTopology::NoRoad, steep.get(steep_id).unwrap(), &steep));
        assert_eq!(model.required_attribute_kind(), Some(cv));
    }

    #[test]
    fn test_reward_never_increases_cost() {
        let model = TerrainCostModel::default();
        let (mut grid, id) = grid_with_cell();
        for road in [
            RoadTopology::NoRoad,
            RoadTopology::IsolatedRoad,
            RoadTopology::ConnectedRoad,
            RoadTopology::Junction,
        ] {
            grid.set_road_topology(id, road).unwrap();
            assert!(model.reward(grid.get(id).unwrap(), 50.0) <= 50.0);
        }
        assert!((model.reward(grid.get(id).unwrap(), 50.0) - 50.0).abs() < 1e-12);
        grid.set_road_topology(id, RoadTopology::ConnectedRoad).unwrap();
        assert!((model.reward(grid.get(id).unwrap(), 50.0) - 20.0).abs() < 1e-12);

        let discount = model.passable_road_discount();
        assert!(discount > 0.0 && discount <= 1.0);
    }

    #[test]
    fn test_enhance_only_from_hubs() {
        let model = TerrainCostModel::default();
        let (hub, b, c) = (CellId::new(10), CellId::new(30), CellId::new(20));
        let mut roads = RoadAdjacencyGraph::new();
        roads.add_edge(hub, b);
        roads.add_edge(hub, c);

        let shortcuts = model.enhance(hub, RoadTopology::Junction, &roads);
        let targets: Vec<CellId> = shortcuts.iter().map(|s| s.target).collect();
        assert_eq!(targets, vec![c, b]);
        assert!(shortcuts.iter().all(|s| (s.cost_factor - 0.2).abs() < 1e-12));
        assert!(shortcuts.iter().all(|s| s.topology.is_hub()));

        assert!(model.enhance(hub, RoadTopology::ConnectedRoad, &roads).is_empty());
        assert!(model.enhance(CellId::new(99), RoadTopology::IsolatedRoad, &roads).is_empty());
    }
}
