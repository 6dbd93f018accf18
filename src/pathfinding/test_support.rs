//! Integer-coordinate index for deterministic search tests.
//!
//! Cells sit on a square lattice, neighbours are the four axis-adjacent cells
//! present in the index and distance is Manhattan, so every cost is exact.

use crate::errors::{HexRouteError, HexRouteResult};
use crate::map::{Cell, Grid};
use crate::spatial::{CellId, LatLon, SpatialIndex, Tessellation};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

#[derive(Debug, Clone)]
pub struct MockIndex {
    cells: BTreeMap<CellId, (i64, i64)>,
}

impl MockIndex {
    /// `(id, x, y)` triples
    pub fn new(cells: &[(u64, i64, i64)]) -> Self {
        Self {
            cells: cells
                .iter()
                .map(|&(id, x, y)| (CellId::new(id), (x, y)))
                .collect(),
        }
    }

    fn position(&self, cell: CellId) -> HexRouteResult<(i64, i64)> {
        self.cells
            .get(&cell)
            .copied()
            .ok_or(HexRouteError::InvalidCell { id: cell.get() })
    }
}

impl SpatialIndex for MockIndex {
    fn resolutions(&self) -> RangeInclusive<u8> {
        0..=0
    }

    fn cell_at(&self, position: LatLon, resolution: u8) -> HexRouteResult<CellId> {
        if resolution != 0 {
            return Err(HexRouteError::InvalidResolution { resolution });
        }
        self.cells
            .iter()
            .find(|(_, (x, y))| *x as f64 == position.lon && *y as f64 == position.lat)
            .map(|(id, _)| *id)
            .ok_or(HexRouteError::InvalidCoordinate {
                lat: position.lat,
                lon: position.lon,
            })
    }

    fn boundary(&self, cell: CellId) -> HexRouteResult<Vec<LatLon>> {
        Ok(vec![self.center(cell)?])
    }

    fn center(&self, cell: CellId) -> HexRouteResult<LatLon> {
        let (x, y) = self.position(cell)?;
        Ok(LatLon::new(y as f64, x as f64))
    }

    fn neighbors(&self, cell: CellId) -> HexRouteResult<Vec<CellId>> {
        let (x, y) = self.position(cell)?;
        Ok(self
            .cells
            .iter()
            .filter(|(_, (nx, ny))| (nx - x).abs() + (ny - y).abs() == 1)
            .map(|(id, _)| *id)
            .collect())
    }

    fn disk(&self, cell: CellId, k: u32) -> HexRouteResult<Vec<CellId>> {
        let (x, y) = self.position(cell)?;
        Ok(self
            .cells
            .iter()
            .filter(|(_, (nx, ny))| (nx - x).abs() + (ny - y).abs() <= k as i64)
            .map(|(id, _)| *id)
            .collect())
    }

    fn line(&self, from: CellId, to: CellId) -> HexRouteResult<Vec<CellId>> {
        Ok(vec![from, to])
    }

    fn distance(&self, a: LatLon, b: LatLon) -> f64 {
        (a.lat - b.lat).abs() + (a.lon - b.lon).abs()
    }
}

/// A grid holding one cell per mock index entry
pub fn mock_grid(cells: &[(u64, i64, i64)]) -> (Grid, MockIndex) {
    let index = MockIndex::new(cells);
    let mut grid = Grid::new("mock", Tessellation::H3, 0).unwrap();
    for &(id, _, _) in cells {
        grid.add_cell(Cell::create(CellId::new(id), &index).unwrap());
    }
    (grid, index)
}
