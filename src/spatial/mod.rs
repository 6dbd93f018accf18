//! Hexagonal spatial index abstraction.
//!
//! The rest of the crate never computes tessellation geometry itself: it asks a
//! [`SpatialIndex`] for cell identifiers, boundaries, centres, rings and lines.

use crate::errors::HexRouteResult;
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

pub mod h3;
pub mod planar;

pub use h3::H3Index;
pub use planar::PlanarHexIndex;

/// Opaque cell identifier produced by a [`SpatialIndex`].
///
/// Ordering is total and is used as the deterministic tie-break key during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Serialize, Deserialize)]
pub struct CellId(u64);

impl CellId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// A geolocated point in degrees (metres for the planar index)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Capability set of a hierarchical hexagonal tessellation
pub trait SpatialIndex: Send + Sync {
    /// Resolutions supported, coarsest first
    fn resolutions(&self) -> RangeInclusive<u8>;

    /// Cell containing `position` at `resolution`
    fn cell_at(&self, position: LatLon, resolution: u8) -> HexRouteResult<CellId>;

    /// Polygon boundary of a cell, in order
    fn boundary(&self, cell: CellId) -> HexRouteResult<Vec<LatLon>>;

    fn center(&self, cell: CellId) -> HexRouteResult<LatLon>;

    /// 1-ring neighbours, never including `cell` itself
    fn neighbors(&self, cell: CellId) -> HexRouteResult<Vec<CellId>>;

    /// Every cell within `k` steps of `cell`, including `cell`
    fn disk(&self, cell: CellId, k: u32) -> HexRouteResult<Vec<CellId>>;

    /// Chain of cells on the straight line from `from` to `to`, both ends included
    fn line(&self, from: CellId, to: CellId) -> HexRouteResult<Vec<CellId>>;

    /// Distance between two points (great-circle metres for geographic indexes)
    fn distance(&self, a: LatLon, b: LatLon) -> f64;
}

/// Which index a grid was built with, so a loaded grid can rebuild it
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Tessellation {
    #[default]
    H3,
    Planar { base_edge_m: f64 },
}

impl Tessellation {
    pub fn index(&self) -> Box<dyn SpatialIndex> {
        match *self {
            Tessellation::H3 => Box::new(H3Index),
            Tessellation::Planar { base_edge_m } => Box::new(PlanarHexIndex::new(base_edge_m)),
        }
    }
}

impl fmt::Display for Tessellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tessellation::H3 => write!(f, "h3"),
            Tessellation::Planar { base_edge_m } => write!(f, "planar (base edge {base_edge_m} m)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_ordering_and_display() {
        let a = CellId::new(0x10);
        let b = CellId::new(0x2f);
        assert!(a < b);
        assert_eq!(a.to_string(), "10");
        assert_eq!(b.to_string(), "2f");
        assert_eq!(CellId::from(7u64).get(), 7);
    }

    #[test]
    fn test_tessellation_rebuilds_index() {
        let planar = Tessellation::Planar { base_edge_m: 1000.0 };
        let index = planar.index();
        assert_eq!(index.resolutions(), 0..=15);

        let origin = index.cell_at(LatLon::new(0.0, 0.0), 3).unwrap();
        assert_eq!(index.neighbors(origin).unwrap().len(), 6);
    }

    #[test]
    fn test_latlon_finite() {
        assert!(LatLon::new(32.05, 118.8).is_finite());
        assert!(!LatLon::new(f64::NAN, 118.8).is_finite());
    }
}
