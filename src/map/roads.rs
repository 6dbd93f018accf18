//! Road connectivity that is independent of grid adjacency, and the passes
//! that project road geometry onto cell topology.

use crate::errors::HexRouteResult;
use crate::map::{Grid, RoadTopology};
use crate::spatial::{CellId, LatLon, SpatialIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Symmetric cell -> cell-set road graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadAdjacencyGraph {
    adjacency: BTreeMap<CellId, BTreeSet<CellId>>,
}

impl RoadAdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterise each polyline's vertices at `resolution` and link consecutive distinct cells
    pub fn build(
        lines: &[Vec<LatLon>],
        resolution: u8,
        index: &dyn SpatialIndex,
    ) -> HexRouteResult<Self> {
        let mut graph = Self::new();
        for line in lines {
            let mut previous: Option<CellId> = None;
            for vertex in line {
                let cell = index.cell_at(*vertex, resolution)?;
                match previous {
                    Some(prev) if prev != cell => graph.add_edge(prev, cell),
                    Some(_) => {}
                    None => {
                        graph.adjacency.entry(cell).or_default();
                    }
                }
                previous = Some(cell);
            }
        }

        info!(
            "Built road adjacency graph: {} cells, {} edges from {} lines",
            graph.len(),
            graph.edge_count(),
            lines.len()
        );
        Ok(graph)
    }

    /// Link `a` and `b` in both directions; self-loops are ignored
    pub fn add_edge(&mut self, a: CellId, b: CellId) {
        if a == b {
            return;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Road neighbours of `id` in ascending order
    pub fn neighbors(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Each undirected edge once, smaller identifier first
    pub fn edges(&self) -> impl Iterator<Item = (CellId, CellId)> + '_ {
        self.adjacency.iter().flat_map(|(&a, targets)| {
            targets.iter().filter(move |&&b| a < b).map(move |&b| (a, b))
        })
    }

    /// Tag every grid cell crossed by a graph edge as an isolated road
    pub fn mark_isolated_roads(&self, grid: &mut Grid, index: &dyn SpatialIndex) -> HexRouteResult<usize> {
        let mut marked = 0;
        for (a, b) in self.edges() {
            for cell in index.line(a, b)? {
                if grid.set_road_topology(cell, RoadTopology::IsolatedRoad).is_ok() {
                    marked += 1;
                }
            }
        }
        debug!("Marked {marked} isolated road cells");
        Ok(marked)
    }
}

/// Rasterise each polyline segment and tag the crossed grid cells as connected roads
pub fn mark_connected_roads(
    grid: &mut Grid,
    index: &dyn SpatialIndex,
    lines: &[Vec<LatLon>],
    resolution: u8,
) -> HexRouteResult<usize> {
    let mut marked = 0;
    for line in lines {
        for pair in line.windows(2) {
            let from = index.cell_at(pair[0], resolution)?;
            let to = index.cell_at(pair[1], resolution)?;
            for cell in index.line(from, to)? {
                if grid.set_road_topology(cell, RoadTopology::ConnectedRoad).is_ok() {
                    marked += 1;
                }
            }
        }
    }
    debug!("Marked {marked} connected road cells");
    Ok(marked)
}

/// Tag the cells containing each access point as junctions
pub fn mark_junctions(
    grid: &mut Grid,
    index: &dyn SpatialIndex,
    points: &[LatLon],
    resolution: u8,
) -> HexRouteResult<usize> {
    let mut marked = 0;
    for point in points {
        let cell = index.cell_at(*point, resolution)?;
        if grid.set_road_topology(cell, RoadTopology::Junction).is_ok() {
            marked += 1;
        }
    }
    debug!("Marked {marked} junction cells");
    Ok(marked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{PlanarHexIndex, Tessellation};
    use crate::spatial::planar::Axial;

    fn cell(q: i64, r: i64) -> CellId {
        PlanarHexIndex::encode(0, Axial::new(q, r)).unwrap()
    }

    fn point(index: &PlanarHexIndex, id: CellId) -> LatLon {
        index.center(id).unwrap()
    }

    #[test]
    fn test_build_links_consecutive_cells_symmetrically() {
        let index = PlanarHexIndex::new(100.0);
        let (a, b, c) = (cell(0, 0), cell(3, 0), cell(3, 3));
        let line = vec![point(&index, a), point(&index, a), point(&index, b), point(&index, c)];

        let graph = RoadAdjacencyGraph::build(&[line], 0, &index).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbors(a).collect::<Vec<_>>(), vec![b]);
        assert_eq!(graph.neighbors(b).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(graph.neighbors(c).collect::<Vec<_>>(), vec![b]);
        assert!(!graph.neighbors(a).any(|n| n == a));
    }

    #[test]
    fn test_single_vertex_line_is_isolated_node() {
        let index = PlanarHexIndex::new(100.0);
        let graph = RoadAdjacencyGraph::build(&[vec![LatLon::new(0.0, 0.0)]], 0, &index).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_mark_passes_tag_grid_cells() {
        let index = PlanarHexIndex::new(100.0);
        let mut grid = Grid::new("roads", Tessellation::Planar { base_edge_m: 100.0 }, 0).unwrap();
        grid.fill_disk(&index, cell(0, 0), 4).unwrap();

        let mut graph = RoadAdjacencyGraph::new();
        graph.add_edge(cell(-3, 0), cell(0, 0));
        let isolated = graph.mark_isolated_roads(&mut grid, &index).unwrap();
        assert_eq!(isolated, 4);
        assert_eq!(grid.get(cell(-2, 0)).unwrap().road, RoadTopology::IsolatedRoad);

        let junctions = mark_junctions(&mut grid, &index, &[point(&index, cell(0, 0))], 0).unwrap();
        assert_eq!(junctions, 1);
        assert_eq!(grid.get(cell(0, 0)).unwrap().road, RoadTopology::Junction);

        let road = vec![point(&index, cell(0, 1)), point(&index, cell(2, 1))];
        let connected = mark_connected_roads(&mut grid, &index, &[road], 0).unwrap();
        assert_eq!(connected, 3);
        assert_eq!(grid.get(cell(1, 1)).unwrap().road, RoadTopology::ConnectedRoad);
    }
}
