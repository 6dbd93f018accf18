//! Per-run A* state kept outside the grid.
//!
//! Every planning run owns its node arena and open heap, so the grid is only
//! ever borrowed immutably and concurrent runs never share scratch state.

use crate::errors::{HexRouteError, HexRouteResult};
use crate::map::{Grid, RoadAdjacencyGraph, RoadTopology};
use crate::pathfinding::cost_model::CostModel;
use crate::spatial::{CellId, LatLon, SpatialIndex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Open,
    Closed,
}

/// Search bookkeeping for one cell within one run
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub id: CellId,
    /// Cost so far
    pub g: f64,
    /// Heuristic distance to the goal
    pub h: f64,
    /// Arena slot of the predecessor
    pub parent: Option<usize>,
    pub state: NodeState,
    /// Road topology used when leaving this node; shortcut targets take the hub type
    pub topology: RoadTopology,
}

impl SearchNode {
    pub fn f(&self) -> f64 {
        self.g + self.h
    }
}

/// Heap entry ordered so the smallest (f, id) pops first
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    g: f64,
    id: CellId,
    slot: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of a single [`PlanningRun::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The cell was closed and its successors relaxed
    Expanded(CellId),
    GoalReached,
    /// The open set is empty
    Exhausted,
}

pub struct PlanningRun<'a> {
    grid: &'a Grid,
    index: &'a dyn SpatialIndex,
    cost_model: &'a dyn CostModel,
    roads: Option<&'a RoadAdjacencyGraph>,
    start: CellId,
    goal: CellId,
    goal_center: LatLon,
    nodes: Vec<SearchNode>,
    slots: HashMap<CellId, usize>,
    open: BinaryHeap<OpenEntry>,
    expanded: usize,
    goal_slot: Option<usize>,
}

impl<'a> PlanningRun<'a> {
    /// Start a run with `start` as the only open node
    pub fn new(
        grid: &'a Grid,
        index: &'a dyn SpatialIndex,
        cost_model: &'a dyn CostModel,
        roads: Option<&'a RoadAdjacencyGraph>,
        start: CellId,
        goal: CellId,
    ) -> HexRouteResult<Self> {
        let goal_center = grid.center_of(index, goal)?;
        let start_topology = grid.get(start).map(|cell| cell.road).unwrap_or_default();

        let mut run = Self {
            grid,
            index,
            cost_model,
            roads,
            start,
            goal,
            goal_center,
            nodes: Vec::new(),
            slots: HashMap::new(),
            open: BinaryHeap::new(),
            expanded: 0,
            goal_slot: None,
        };
        run.offer(start, 0.0, None, start_topology)?;
        Ok(run)
    }

    /// Pop the best open node and expand it
    pub fn step(&mut self) -> HexRouteResult<StepOutcome> {
        let Some(slot) = self.pop_open() else {
            return Ok(StepOutcome::Exhausted);
        };

        let current = self.nodes[slot].clone();
        if current.id == self.goal {
            self.goal_slot = Some(slot);
            return Ok(StepOutcome::GoalReached);
        }

        self.nodes[slot].state = NodeState::Closed;
        self.expanded += 1;
        trace!("Expanding {} (g={:.3}, h={:.3})", current.id, current.g, current.h);

        let (grid, index, cost_model) = (self.grid, self.index, self.cost_model);
        if let Some(roads) = self.roads {
            for shortcut in cost_model.enhance(current.id, current.topology, roads) {
                let base = grid.dist(index, current.id, shortcut.target)?;
                let g = current.g + shortcut.cost_factor * base;
                self.offer(shortcut.target, g, Some(slot), shortcut.topology)?;
            }
        }

        let neighbors = match grid.get(current.id) {
            Some(cell) => cell.neighbors.clone(),
            None => index.neighbors(current.id)?,
        };
        for neighbor_id in neighbors {
            let Some(neighbor) = grid.get(neighbor_id) else {
                continue;
            };
            if self.is_closed(neighbor_id) {
                continue;
            }
            let base = grid.dist(index, current.id, neighbor_id)?;
            let Some(cost) = cost_model.edge_cost(current.topology, neighbor, grid, base) else {
                continue;
            };
            self.offer(neighbor_id, current.g + cost, Some(slot), neighbor.road)?;
        }

        Ok(StepOutcome::Expanded(current.id))
    }

    /// Insert `id` or lower its cost; closed nodes are never reopened
    fn offer(
        &mut self,
        id: CellId,
        g: f64,
        parent: Option<usize>,
        topology: RoadTopology,
    ) -> HexRouteResult<bool> {
        let slot = match self.slots.get(&id) {
            Some(&slot) => {
                let node = &mut self.nodes[slot];
                if node.state == NodeState::Closed || g >= node.g {
                    return Ok(false);
                }
                node.g = g;
                node.parent = parent;
                node.topology = topology;
                slot
            }
            None => {
                let h = self
                    .index
                    .distance(self.grid.center_of(self.index, id)?, self.goal_center);
                let slot = self.nodes.len();
                self.nodes.push(SearchNode {
                    id,
                    g,
                    h,
                    parent,
                    state: NodeState::Open,
                    topology,
                });
                self.slots.insert(id, slot);
                slot
            }
        };

        let node = &self.nodes[slot];
        self.open.push(OpenEntry {
            f: node.f(),
            g: node.g,
            id,
            slot,
        });
        Ok(true)
    }

    fn pop_open(&mut self) -> Option<usize> {
        while let Some(entry) = self.open.pop() {
            let node = &self.nodes[entry.slot];
            // Superseded by a cheaper entry or already settled
            if node.state == NodeState::Open && node.g == entry.g {
                return Some(entry.slot);
            }
        }
        None
    }

    /// Cells from start to goal, once the goal has been reached
    pub fn reconstruct(&self) -> HexRouteResult<Vec<CellId>> {
        let goal_slot = self.goal_slot.ok_or(HexRouteError::Unreachable {
            expanded: self.expanded,
        })?;

        let bound = self.expanded + 1;
        let mut path = Vec::new();
        let mut cursor = Some(goal_slot);
        while let Some(slot) = cursor {
            if path.len() > bound {
                return Err(HexRouteError::InvalidGridData {
                    reason: format!("parent chain from {} exceeds {bound} cells", self.goal),
                });
            }
            let node = &self.nodes[slot];
            path.push(node.id);
            cursor = node.parent;
        }
        path.reverse();

        if path.first() != Some(&self.start) {
            return Err(HexRouteError::InvalidGridData {
                reason: format!("parent chain does not end at start cell {}", self.start),
            });
        }
        Ok(path)
    }

    pub fn node(&self, id: CellId) -> Option<&SearchNode> {
        self.slots.get(&id).map(|&slot| &self.nodes[slot])
    }

    pub fn parent_of(&self, id: CellId) -> Option<CellId> {
        self.node(id)
            .and_then(|node| node.parent)
            .map(|slot| self.nodes[slot].id)
    }

    pub fn is_open(&self, id: CellId) -> bool {
        self.node(id).is_some_and(|node| node.state == NodeState::Open)
    }

    pub fn is_closed(&self, id: CellId) -> bool {
        self.node(id).is_some_and(|node| node.state == NodeState::Closed)
    }

    pub fn open_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.state == NodeState::Open)
            .count()
    }

    /// Number of closed nodes
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Cost of the reached goal
    pub fn goal_cost(&self) -> Option<f64> {
        self.goal_slot.map(|slot| self.nodes[slot].g)
    }

    pub fn start(&self) -> CellId {
        self.start
    }

    pub fn goal(&self) -> CellId {
        self.goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Attribute, AttributeKind};
    use crate::pathfinding::cost_model::TerrainCostModel;
    use crate::pathfinding::test_support::{MockIndex, mock_grid};
    use crate::spatial::planar::Axial;
    use crate::spatial::{PlanarHexIndex, Tessellation};
    use approx::assert_relative_eq;

    fn hex(q: i64, r: i64) -> CellId {
        PlanarHexIndex::encode(0, Axial::new(q, r)).unwrap()
    }

    #[test]
    fn test_open_entry_orders_by_f_then_id() {
        let mut heap = BinaryHeap::new();
        for (f, id) in [(2.0, 9), (1.0, 8), (2.0, 3), (1.0, 12)] {
            heap.push(OpenEntry {
                f,
                g: 0.0,
                id: CellId::new(id),
                slot: 0,
            });
        }
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|e| e.id.get()).collect();
        assert_eq!(order, vec![8, 12, 3, 9]);
    }

    #[test]
    fn test_first_step_expands_start_through_policy() {
        let index = PlanarHexIndex::new(100.0);
        let mut grid = Grid::new("seed", Tessellation::Planar { base_edge_m: 100.0 }, 0).unwrap();
        grid.fill_disk(&index, hex(0, 0), 2).unwrap();
        grid.attach(hex(1, 0), Attribute::marker(AttributeKind::Water)).unwrap();
        let model = TerrainCostModel::default();

        let mut run = PlanningRun::new(&grid, &index, &model, None, hex(0, 0), hex(2, 0)).unwrap();
        assert_eq!(run.step().unwrap(), StepOutcome::Expanded(hex(0, 0)));

        assert!(run.is_closed(hex(0, 0)));
        assert_eq!(run.open_count(), 5);
        assert!(run.node(hex(1, 0)).is_none());
        let neighbor = run.node(hex(0, 1)).unwrap();
        assert_relative_eq!(neighbor.g, 100.0 * 3f64.sqrt(), epsilon = 1e-9);
        assert_eq!(run.parent_of(hex(0, 1)), Some(hex(0, 0)));
    }

    #[test]
    fn test_closed_nodes_are_not_reopened() {
        let (grid, index) = mock_grid(&[(1, 0, 0), (2, 1, 0), (3, 2, 0)]);
        let model = TerrainCostModel::default();
        let mut run = PlanningRun::new(&grid, &index, &model, None, CellId::new(1), CellId::new(3)).unwrap();

        run.step().unwrap();
        assert!(!run.offer(CellId::new(1), -5.0, None, RoadTopology::NoRoad).unwrap());
        assert_eq!(run.node(CellId::new(1)).unwrap().g, 0.0);
    }

    #[test]
    fn test_reconstruct_is_bounded_and_ends_at_start() {
        let (grid, index) = mock_grid(&[(1, 0, 0), (2, 1, 0), (3, 2, 0), (4, 3, 0)]);
        let model = TerrainCostModel::default();
        let mut run = PlanningRun::new(&grid, &index, &model, None, CellId::new(1), CellId::new(4)).unwrap();

        while run.step().unwrap() != StepOutcome::GoalReached {}
        let path = run.reconstruct().unwrap();
        assert_eq!(path.first(), Some(&CellId::new(1)));
        assert_eq!(path.last(), Some(&CellId::new(4)));
        assert!(path.len() <= run.expanded() + 1);
        assert_eq!(run.goal_cost(), Some(3.0));
    }

    #[test]
    fn test_mock_index_is_usable_for_cells() {
        let index = MockIndex::new(&[(5, 0, 0), (6, 1, 0)]);
        assert_eq!(index.neighbors(CellId::new(5)).unwrap(), vec![CellId::new(6)]);
        assert_eq!(index.distance(LatLon::new(0.0, 0.0), LatLon::new(1.0, 2.0)), 3.0);
    }
}
