//! Neighbourhood-derived terrain metrics.
//!
//! Each pass samples a cell's own elevation plus the elevations of its
//! neighbours that exist in the grid, registers its kind on the grid and
//! appends one attribute per cell. Running a pass twice only warns.

use crate::errors::HexRouteResult;
use crate::map::{Attribute, AttributeKind, AttributeValue, Grid};
use crate::spatial::{CellId, LatLon, SpatialIndex};
use tracing::info;

pub mod constants;

use constants::{CURVATURE_DECIMALS, CURVATURE_SCALE, CV_DECIMALS, EXPOSURE_DECIMALS, SLOPE_PASS};

/// Own elevation followed by present neighbours' elevations
fn neighbourhood_samples(grid: &Grid, id: CellId) -> Vec<f64> {
    let Some(cell) = grid.get(id) else {
        return Vec::new();
    };
    cell.elevation
        .into_iter()
        .chain(
            cell.neighbors
                .iter()
                .filter_map(|n| grid.get(*n))
                .filter_map(|neighbor| neighbor.elevation),
        )
        .collect()
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation; `None` below two samples
pub fn sample_std_dev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let avg = mean(samples);
    let variance =
        samples.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
    Some(variance.sqrt())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Compute `metric` for every cell and attach the results under `kind`
fn run_pass<F>(grid: &mut Grid, kind: AttributeKind, metric: F) -> usize
where
    F: Fn(&[f64]) -> Option<AttributeValue>,
{
    if !grid.register_attribute_kind(&kind.name()) {
        return 0;
    }

    let view: &Grid = grid;
    let values: Vec<(CellId, AttributeValue)> = view
        .sorted_ids()
        .into_iter()
        .filter_map(|id| metric(&neighbourhood_samples(view, id)).map(|value| (id, value)))
        .collect();

    let annotated = values.len();
    for (id, value) in values {
        if let Some(cell) = grid.get_mut(id) {
            cell.attributes.push(Attribute::new(kind, value));
        }
    }
    info!("Derived {kind} for {annotated}/{} cells", grid.len());
    annotated
}

/// Relief: highest minus lowest elevation of the neighbourhood, 0 with fewer than two samples
pub fn derive_relief(grid: &mut Grid) -> usize {
    run_pass(grid, AttributeKind::Relief, |samples| {
        if samples.len() < 2 {
            return Some(AttributeValue::Number(0.0));
        }
        let max = samples.iter().copied().fold(f64::MIN, f64::max);
        let min = samples.iter().copied().fold(f64::MAX, f64::min);
        Some(AttributeValue::Number(max - min))
    })
}

/// Roughness: sample standard deviation of the neighbourhood
pub fn derive_roughness(grid: &mut Grid) -> usize {
    run_pass(grid, AttributeKind::Roughness, |samples| {
        sample_std_dev(samples).map(AttributeValue::Number)
    })
}

/// Coefficient of variation: standard deviation over mean, unknown for a zero mean
pub fn derive_coefficient_of_variation(grid: &mut Grid) -> usize {
    run_pass(
        grid,
        AttributeKind::ElevationCoefficientOfVariation,
        |samples| {
            let sd = sample_std_dev(samples)?;
            let avg = mean(samples);
            if avg == 0.0 {
                return Some(AttributeValue::Unknown);
            }
            Some(AttributeValue::Number(round_to(sd / avg, CV_DECIMALS)))
        },
    )
}

/// Slope: mean absolute rise to each present neighbour over the centre distance
pub fn derive_slope(grid: &mut Grid, index: &dyn SpatialIndex) -> HexRouteResult<usize> {
    if !grid.register_attribute_kind(SLOPE_PASS) {
        return Ok(0);
    }

    let mut slopes = Vec::new();
    for cell in grid.cells() {
        let Some(elevation) = cell.elevation else {
            continue;
        };
        let mut gradients = Vec::new();
        for neighbor in cell.neighbors.iter().filter_map(|n| grid.get(*n)) {
            let Some(other) = neighbor.elevation else {
                continue;
            };
            let run = index.distance(cell.center, neighbor.center);
            if run > 0.0 {
                gradients.push((other - elevation).abs() / run);
            }
        }
        if !gradients.is_empty() {
            slopes.push((cell.id, mean(&gradients)));
        }
    }

    let annotated = slopes.len();
    for (id, slope) in slopes {
        if let Some(cell) = grid.get_mut(id) {
            cell.slope = Some(slope);
        }
    }
    info!("Derived slope for {annotated}/{} cells", grid.len());
    Ok(annotated)
}

/// Signed east and north offsets in metres from `origin` to `point`
pub fn metric_offset(index: &dyn SpatialIndex, origin: LatLon, point: LatLon) -> (f64, f64) {
    let dx = index.distance(origin, LatLon::new(origin.lat, point.lon));
    let dy = index.distance(origin, LatLon::new(point.lat, origin.lon));
    (
        dx.copysign(point.lon - origin.lon),
        dy.copysign(point.lat - origin.lat),
    )
}

/// East, north and rise from a cell centre to one present neighbour
#[derive(Debug, Clone, Copy)]
struct Rise {
    dx: f64,
    dy: f64,
    dz: f64,
}

impl Rise {
    fn run_sq(&self) -> f64 {
        self.dx * self.dx + self.dy * self.dy
    }
}

/// Least-squares plane through the centre; `None` when the neighbours are collinear
fn plane_gradient(rises: &[Rise]) -> Option<(f64, f64)> {
    let (mut sxx, mut sxy, mut syy, mut sxz, mut syz) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for rise in rises {
        sxx += rise.dx * rise.dx;
        sxy += rise.dx * rise.dy;
        syy += rise.dy * rise.dy;
        sxz += rise.dx * rise.dz;
        syz += rise.dy * rise.dz;
    }
    let det = sxx * syy - sxy * sxy;
    if det <= 1e-9 * sxx * syy {
        return None;
    }
    Some((
        (syy * sxz - sxy * syz) / det,
        (sxx * syz - sxy * sxz) / det,
    ))
}

/// Attach `metric` of each elevated cell's rises under `kind`; cells without elevation get `Unknown`
fn run_surface_pass<F>(
    grid: &mut Grid,
    index: &dyn SpatialIndex,
    kind: AttributeKind,
    metric: F,
) -> usize
where
    F: Fn(&[Rise]) -> AttributeValue,
{
    if !grid.register_attribute_kind(&kind.name()) {
        return 0;
    }

    let view: &Grid = grid;
    let values: Vec<(CellId, AttributeValue)> = view
        .cells()
        .map(|cell| {
            let Some(elevation) = cell.elevation else {
                return (cell.id, AttributeValue::Unknown);
            };
            let rises: Vec<Rise> = cell
                .neighbors
                .iter()
                .filter_map(|n| view.get(*n))
                .filter_map(|neighbor| {
                    let (dx, dy) = metric_offset(index, cell.center, neighbor.center);
                    let rise = Rise {
                        dx,
                        dy,
                        dz: neighbor.elevation? - elevation,
                    };
                    (rise.run_sq() > 0.0 && rise.run_sq().is_finite()).then_some(rise)
                })
                .collect();
            (cell.id, metric(&rises))
        })
        .collect();

    let annotated = values.len();
    for (id, value) in values {
        if let Some(cell) = grid.get_mut(id) {
            cell.attributes.push(Attribute::new(kind, value));
        }
    }
    info!("Derived {kind} for {annotated}/{} cells", grid.len());
    annotated
}

/// Curvature: mean curvature of the neighbourhood surface, scaled by 1000.
/// Negative in hollows, positive on crests, unknown without neighbours.
pub fn derive_curvature(grid: &mut Grid, index: &dyn SpatialIndex) -> HexRouteResult<usize> {
    Ok(run_surface_pass(grid, index, AttributeKind::Curvature, |rises| {
        if rises.is_empty() {
            return AttributeValue::Unknown;
        }
        let laplacian = 4.0 / rises.len() as f64
            * rises.iter().map(|r| r.dz / r.run_sq()).sum::<f64>();
        let (gx, gy) = plane_gradient(rises).unwrap_or((0.0, 0.0));
        let curvature = -laplacian / (2.0 * (1.0 + gx * gx + gy * gy).powf(1.5));
        AttributeValue::Number(round_to(curvature * CURVATURE_SCALE, CURVATURE_DECIMALS))
    }))
}

/// Exposure: compass bearing the slope faces, clockwise from north in [0, 360).
/// Unknown on flat ground or when the neighbours do not span a plane.
pub fn derive_exposure(grid: &mut Grid, index: &dyn SpatialIndex) -> HexRouteResult<usize> {
    Ok(run_surface_pass(grid, index, AttributeKind::Exposure, |rises| {
        let Some((gx, gy)) = plane_gradient(rises) else {
            return AttributeValue::Unknown;
        };
        if gx.hypot(gy) < 1e-12 {
            return AttributeValue::Unknown;
        }
        let bearing = (-gx).atan2(-gy).to_degrees().rem_euclid(360.0);
        let bearing = round_to(bearing, EXPOSURE_DECIMALS);
        AttributeValue::Number(if bearing >= 360.0 { 0.0 } else { bearing })
    }))
}

/// Run every neighbourhood pass in registry order
pub fn derive_all(grid: &mut Grid, index: &dyn SpatialIndex) -> HexRouteResult<()> {
    derive_slope(grid, index)?;
    derive_coefficient_of_variation(grid);
    derive_relief(grid);
    derive_roughness(grid);
    derive_curvature(grid, index)?;
    derive_exposure(grid, index)?;
    Ok(())
}
