//! Flat axial hexagon tessellation on a local metric plane.
//!
//! Positions are interpreted as metres: `lon` is the x axis and `lat` the y axis.
//! Each finer resolution shrinks the hexagon edge by a factor of √7, mirroring
//! the aperture of the H3 hierarchy. Hexagons are pointy-top.

use crate::errors::{HexRouteError, HexRouteResult};
use crate::spatial::{CellId, LatLon, SpatialIndex};
use std::ops::RangeInclusive;

const MAX_RESOLUTION: u8 = 15;
const AXIS_BITS: u32 = 28;
const AXIS_OFFSET: i64 = 1 << (AXIS_BITS - 1);
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;

/// Axial hex coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Axial {
    pub q: i64,
    pub r: i64,
}

impl Axial {
    pub const fn new(q: i64, r: i64) -> Self {
        Self { q, r }
    }

    const DIRECTIONS: [Axial; 6] = [
        Axial::new(1, 0),
        Axial::new(1, -1),
        Axial::new(0, -1),
        Axial::new(-1, 0),
        Axial::new(-1, 1),
        Axial::new(0, 1),
    ];

    pub fn distance(self, other: Axial) -> i64 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
    }

    /// Round fractional cube coordinates to the nearest hexagon
    fn round(q: f64, r: f64) -> Axial {
        let s = -q - r;
        let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
        let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());
        if dq > dr && dq > ds {
            rq = -rr - rs;
        } else if dr > ds {
            rr = -rq - rs;
        }
        Axial::new(rq as i64, rr as i64)
    }
}

/// Planar hexagonal index with a configurable coarsest edge length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarHexIndex {
    base_edge_m: f64,
}

impl PlanarHexIndex {
    pub fn new(base_edge_m: f64) -> Self {
        Self { base_edge_m }
    }

    /// Edge length of a hexagon at `resolution`
    pub fn edge_length(&self, resolution: u8) -> f64 {
        self.base_edge_m / 7f64.sqrt().powi(resolution as i32)
    }

    pub fn encode(resolution: u8, axial: Axial) -> HexRouteResult<CellId> {
        if resolution > MAX_RESOLUTION {
            return Err(HexRouteError::InvalidResolution { resolution });
        }
        let outside = || HexRouteError::MalformedGeometry {
            reason: format!("axial coordinate ({}, {}) is outside the index", axial.q, axial.r),
        };
        let limit = 1i64 << AXIS_BITS;
        let q = axial.q.checked_add(AXIS_OFFSET).ok_or_else(outside)?;
        let r = axial.r.checked_add(AXIS_OFFSET).ok_or_else(outside)?;
        if !(0..limit).contains(&q) || !(0..limit).contains(&r) {
            return Err(outside());
        }
        Ok(CellId::new(
            ((resolution as u64) << (2 * AXIS_BITS)) | ((q as u64) << AXIS_BITS) | r as u64,
        ))
    }

    pub fn decode(cell: CellId) -> HexRouteResult<(u8, Axial)> {
        let raw = cell.get();
        let resolution = raw >> (2 * AXIS_BITS);
        if resolution > MAX_RESOLUTION as u64 {
            return Err(HexRouteError::InvalidCell { id: raw });
        }
        let q = ((raw >> AXIS_BITS) & AXIS_MASK) as i64 - AXIS_OFFSET;
        let r = (raw & AXIS_MASK) as i64 - AXIS_OFFSET;
        Ok((resolution as u8, Axial::new(q, r)))
    }

    fn axial_center(&self, resolution: u8, axial: Axial) -> LatLon {
        let size = self.edge_length(resolution);
        let x = size * 3f64.sqrt() * (axial.q as f64 + axial.r as f64 / 2.0);
        let y = size * 1.5 * axial.r as f64;
        LatLon::new(y, x)
    }
}

impl SpatialIndex for PlanarHexIndex {
    fn resolutions(&self) -> RangeInclusive<u8> {
        0..=MAX_RESOLUTION
    }

    fn cell_at(&self, position: LatLon, resolution: u8) -> HexRouteResult<CellId> {
        if resolution > MAX_RESOLUTION {
            return Err(HexRouteError::InvalidResolution { resolution });
        }
        if !position.is_finite() {
            return Err(HexRouteError::InvalidCoordinate {
                lat: position.lat,
                lon: position.lon,
            });
        }
        let size = self.edge_length(resolution);
        let (x, y) = (position.lon, position.lat);
        let q = (3f64.sqrt() / 3.0 * x - y / 3.0) / size;
        let r = (2.0 / 3.0 * y) / size;
        Self::encode(resolution, Axial::round(q, r))
    }

    fn boundary(&self, cell: CellId) -> HexRouteResult<Vec<LatLon>> {
        let (resolution, axial) = Self::decode(cell)?;
        let center = self.axial_center(resolution, axial);
        let size = self.edge_length(resolution);
        Ok((0..6)
            .map(|corner| {
                let angle = (60.0 * corner as f64 - 30.0).to_radians();
                LatLon::new(center.lat + size * angle.sin(), center.lon + size * angle.cos())
            })
            .collect())
    }

    fn center(&self, cell: CellId) -> HexRouteResult<LatLon> {
        let (resolution, axial) = Self::decode(cell)?;
        Ok(self.axial_center(resolution, axial))
    }

    fn neighbors(&self, cell: CellId) -> HexRouteResult<Vec<CellId>> {
        let (resolution, axial) = Self::decode(cell)?;
        Axial::DIRECTIONS
            .iter()
            .map(|d| Self::encode(resolution, Axial::new(axial.q + d.q, axial.r + d.r)))
            .collect()
    }

    fn disk(&self, cell: CellId, k: u32) -> HexRouteResult<Vec<CellId>> {
        let (resolution, axial) = Self::decode(cell)?;
        let k = k as i64;
        let mut cells = Vec::new();
        for dq in -k..=k {
            for dr in (-k).max(-dq - k)..=k.min(-dq + k) {
                cells.push(Self::encode(
                    resolution,
                    Axial::new(axial.q + dq, axial.r + dr),
                )?);
            }
        }
        Ok(cells)
    }

    fn line(&self, from: CellId, to: CellId) -> HexRouteResult<Vec<CellId>> {
        let (res_a, a) = Self::decode(from)?;
        let (res_b, b) = Self::decode(to)?;
        if res_a != res_b {
            return Err(HexRouteError::MalformedGeometry {
                reason: format!("cells {from} and {to} are at different resolutions"),
            });
        }
        let steps = a.distance(b);
        if steps == 0 {
            return Ok(vec![from]);
        }
        // Nudge off exact edges so ties round consistently
        let (aq, ar) = (a.q as f64 + 1e-6, a.r as f64 + 1e-6);
        let (bq, br) = (b.q as f64 + 1e-6, b.r as f64 + 1e-6);
        (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                Self::encode(res_a, Axial::round(aq + (bq - aq) * t, ar + (br - ar) * t))
            })
            .collect()
    }

    fn distance(&self, a: LatLon, b: LatLon) -> f64 {
        (a.lat - b.lat).hypot(a.lon - b.lon)
    }
}
