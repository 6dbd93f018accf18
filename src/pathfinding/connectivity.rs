use crate::map::{Grid, RoadAdjacencyGraph};
use crate::pathfinding::cost_model::CostModel;
use crate::spatial::CellId;
use pathfinding::prelude::bfs_reach;

/// Grid cells reachable from `start` under `cost_model`, in ascending order.
///
/// Each cell is left with its own grid topology and road shortcuts are
/// followed only onto cells that exist in the grid, so the result is a
/// diagnostic approximation of what a planning run can reach.
pub fn reachable_cells(
    grid: &Grid,
    cost_model: &dyn CostModel,
    roads: Option<&RoadAdjacencyGraph>,
    start: CellId,
) -> Vec<CellId> {
    if !grid.contains(start) {
        return Vec::new();
    }

    let successors = |id: &CellId| -> Vec<CellId> {
        let Some(cell) = grid.get(*id) else {
            return Vec::new();
        };
        let mut next: Vec<CellId> = cell
            .neighbors
            .iter()
            .filter_map(|n| grid.get(*n))
            .filter(|neighbor| cost_model.edge_cost(cell.road, neighbor, grid, 1.0).is_some())
            .map(|neighbor| neighbor.id)
            .collect();
        if let Some(roads) = roads {
            next.extend(
                cost_model
                    .enhance(cell.id, cell.road, roads)
                    .into_iter()
                    .map(|shortcut| shortcut.target)
                    .filter(|target| grid.contains(*target)),
            );
        }
        next
    };

    let mut reached: Vec<CellId> = bfs_reach(start, successors).collect();
    reached.sort_unstable();
    reached
}

/// Whether `goal` lies in the component reachable from `start`
pub fn can_reach(
    grid: &Grid,
    cost_model: &dyn CostModel,
    roads: Option<&RoadAdjacencyGraph>,
    start: CellId,
    goal: CellId,
) -> bool {
    reachable_cells(grid, cost_model, roads, start)
        .binary_search(&goal)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Attribute, AttributeKind};
    use crate::pathfinding::cost_model::TerrainCostModel;
    use crate::pathfinding::test_support::mock_grid;

    #[test]
    fn test_water_splits_components() {
        let (mut grid, _) = mock_grid(&[(1, 0, 0), (2, 1, 0), (3, 2, 0), (4, 3, 0)]);
        grid.attach(CellId::new(3), Attribute::marker(AttributeKind::Water))
            .unwrap();
        let model = TerrainCostModel::default();

        assert_eq!(
            reachable_cells(&grid, &model, None, CellId::new(1)),
            vec![CellId::new(1), CellId::new(2)]
        );
        assert!(!can_reach(&grid, &model, None, CellId::new(1), CellId::new(4)));
    }

    #[test]
    fn test_road_shortcut_joins_components() {
        let (mut grid, _) = mock_grid(&[(1, 0, 0), (2, 1, 0), (3, 2, 0), (4, 3, 0)]);
        grid.attach(CellId::new(2), Attribute::marker(AttributeKind::Water))
            .unwrap();
        grid.set_road_topology(CellId::new(1), crate::map::RoadTopology::Junction)
            .unwrap();
        let mut roads = RoadAdjacencyGraph::new();
        roads.add_edge(CellId::new(1), CellId::new(3));
        let model = TerrainCostModel::default();

        assert!(can_reach(&grid, &model, Some(&roads), CellId::new(1), CellId::new(4)));
    }

    #[test]
    fn test_unknown_start_reaches_nothing() {
        let (grid, _) = mock_grid(&[(1, 0, 0)]);
        let model = TerrainCostModel::default();
        assert!(reachable_cells(&grid, &model, None, CellId::new(99)).is_empty());
    }
}
