//! [`SpatialIndex`] backed by the H3 hierarchical hexagonal grid (`h3o`).

use crate::errors::{HexRouteError, HexRouteResult};
use crate::spatial::{CellId, LatLon, SpatialIndex};
use h3o::{CellIndex, LatLng, Resolution};
use std::ops::RangeInclusive;

/// Stateless adapter over `h3o`
#[derive(Debug, Clone, Copy, Default)]
pub struct H3Index;

impl H3Index {
    fn cell(id: CellId) -> HexRouteResult<CellIndex> {
        CellIndex::try_from(id.get()).map_err(|_| HexRouteError::InvalidCell { id: id.get() })
    }

    fn latlng(position: LatLon) -> HexRouteResult<LatLng> {
        LatLng::new(position.lat, position.lon).map_err(|_| HexRouteError::InvalidCoordinate {
            lat: position.lat,
            lon: position.lon,
        })
    }

    fn to_latlon(point: LatLng) -> LatLon {
        LatLon::new(point.lat(), point.lng())
    }
}

impl SpatialIndex for H3Index {
    fn resolutions(&self) -> RangeInclusive<u8> {
        0..=15
    }

    fn cell_at(&self, position: LatLon, resolution: u8) -> HexRouteResult<CellId> {
        let resolution = Resolution::try_from(resolution)
            .map_err(|_| HexRouteError::InvalidResolution { resolution })?;
        let cell = Self::latlng(position)?.to_cell(resolution);
        Ok(CellId::new(u64::from(cell)))
    }

    fn boundary(&self, cell: CellId) -> HexRouteResult<Vec<LatLon>> {
        let boundary = Self::cell(cell)?.boundary();
        Ok(boundary.iter().copied().map(Self::to_latlon).collect())
    }

    fn center(&self, cell: CellId) -> HexRouteResult<LatLon> {
        Ok(Self::to_latlon(LatLng::from(Self::cell(cell)?)))
    }

    fn neighbors(&self, cell: CellId) -> HexRouteResult<Vec<CellId>> {
        let index = Self::cell(cell)?;
        let ring: Vec<CellIndex> = index.grid_disk(1);
        Ok(ring
            .into_iter()
            .filter(|neighbor| *neighbor != index)
            .map(|neighbor| CellId::new(u64::from(neighbor)))
            .collect())
    }

    fn disk(&self, cell: CellId, k: u32) -> HexRouteResult<Vec<CellId>> {
        let disk: Vec<CellIndex> = Self::cell(cell)?.grid_disk(k);
        Ok(disk
            .into_iter()
            .map(|member| CellId::new(u64::from(member)))
            .collect())
    }

    fn line(&self, from: CellId, to: CellId) -> HexRouteResult<Vec<CellId>> {
        let (from, to) = (Self::cell(from)?, Self::cell(to)?);
        let malformed = |e: h3o::error::LocalIjError| HexRouteError::MalformedGeometry {
            reason: format!("no grid line between {from} and {to}: {e}"),
        };
        from.grid_path_cells(to)
            .map_err(malformed)?
            .map(|step| step.map(|cell| CellId::new(u64::from(cell))).map_err(malformed))
            .collect()
    }

    fn distance(&self, a: LatLon, b: LatLon) -> f64 {
        match (Self::latlng(a), Self::latlng(b)) {
            (Ok(a), Ok(b)) => a.distance_m(b),
            _ => f64::INFINITY,
        }
    }
}
