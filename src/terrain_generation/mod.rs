use crate::errors::HexRouteResult;
use crate::map::roads::{mark_connected_roads, mark_junctions};
use crate::map::{
    Attribute, AttributeKind, Cell, Grid, GridSnapshot, RoadAdjacencyGraph, SubAttribute,
};
use crate::spatial::{CellId, LatLon, SpatialIndex, Tessellation};
use crate::terrain::{self, constants::*};
use noise::{MultiFractal, NoiseFn, Perlin, RidgedMulti};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::info;

/// Elevation generation algorithms
#[derive(Debug, Clone)]
pub enum ElevationAlgorithm {
    Flat {
        height: f64,
    },
    Perlin {
        amplitude: f64,
        frequency: f64,
        octaves: u32,
    },
    Ridged {
        amplitude: f64,
        frequency: f64,
        octaves: u32,
    },
}

/// Land cover and road layout of a synthetic survey
#[derive(Debug, Clone)]
pub struct SurveyOptions {
    /// Rings of cells around the origin cell
    pub rings: u32,
    /// Share of the lowest cells turned into water
    pub water_fraction: f64,
    /// Vegetation noise above this becomes forest
    pub forest_threshold: f64,
    /// Chance of a building on each dry cell
    pub building_density: f64,
    /// Lay an isolated highway west to east and a connected road south to north
    pub roads: bool,
}

impl Default for SurveyOptions {
    fn default() -> Self {
        Self {
            rings: 12,
            water_fraction: 0.08,
            forest_threshold: 0.35,
            building_density: 0.03,
            roads: true,
        }
    }
}

/// Builds seeded synthetic grids for planning experiments
#[derive(Debug, Clone)]
pub struct SurveyGenerator {
    pub seed: u32,
    pub algorithm: ElevationAlgorithm,
    pub base_elevation: f64,
}

impl SurveyGenerator {
    /// Create a new survey generator
    pub fn new(seed: u32, algorithm: ElevationAlgorithm) -> Self {
        Self {
            seed,
            algorithm,
            base_elevation: 50.0,
        }
    }

    pub fn with_base_elevation(mut self, base_elevation: f64) -> Self {
        self.base_elevation = base_elevation;
        self
    }

    /// Elevation at a metric offset from the survey origin
    pub fn elevation_at(&self, x: f64, y: f64) -> f64 {
        let relief = match &self.algorithm {
            ElevationAlgorithm::Flat { height } => *height,
            ElevationAlgorithm::Perlin {
                amplitude,
                frequency,
                octaves,
            } => {
                let perlin = Perlin::new(self.seed);
                let mut value = 0.0;
                let mut current_amplitude = *amplitude;
                let mut current_frequency = *frequency;
                for _ in 0..*octaves {
                    value += perlin.get([x * current_frequency, y * current_frequency])
                        * current_amplitude;
                    current_amplitude *= 0.5; // Persistence
                    current_frequency *= 2.0; // Lacunarity
                }
                value
            }
            ElevationAlgorithm::Ridged {
                amplitude,
                frequency,
                octaves,
            } => {
                let ridged = RidgedMulti::<Perlin>::new(self.seed)
                    .set_octaves(*octaves as usize)
                    .set_frequency(*frequency);
                ridged.get([x, y]) * amplitude
            }
        };
        self.base_elevation + relief
    }

    /// Generate a grid and its road graph around `origin`
    pub fn generate(
        &self,
        name: &str,
        index: &dyn SpatialIndex,
        tessellation: Tessellation,
        origin: LatLon,
        resolution: u8,
        options: &SurveyOptions,
    ) -> HexRouteResult<GridSnapshot> {
        let mut grid = Grid::new(name, tessellation, resolution)?;
        let center = index.cell_at(origin, resolution)?;
        grid.fill_disk(index, center, options.rings)?;
        let ids = grid.sorted_ids();

        let offset = |position: LatLon| terrain::metric_offset(index, origin, position);

        for id in &ids {
            if let Some(cell) = grid.get_mut(*id) {
                let (x, y) = offset(cell.center);
                cell.elevation = Some(self.elevation_at(x, y));
            }
        }
        terrain::derive_all(&mut grid, index)?;

        self.lay_land_cover(&mut grid, &ids, options, &offset)?;

        let roads = if options.roads {
            lay_roads(&mut grid, index, resolution)?
        } else {
            RoadAdjacencyGraph::new()
        };

        info!(
            "Generated survey '{name}': {} cells, {} road edges (seed {})",
            grid.len(),
            roads.edge_count(),
            self.seed
        );
        Ok(GridSnapshot::new(grid, roads))
    }

    fn lay_land_cover(
        &self,
        grid: &mut Grid,
        ids: &[CellId],
        options: &SurveyOptions,
        offset: &dyn Fn(LatLon) -> (f64, f64),
    ) -> HexRouteResult<()> {
        let mut elevations: Vec<f64> = ids
            .iter()
            .filter_map(|id| grid.get(*id).and_then(|cell| cell.elevation))
            .collect();
        elevations.sort_by(f64::total_cmp);
        let water_line = elevations
            .get((elevations.len() as f64 * options.water_fraction) as usize)
            .copied()
            .unwrap_or(f64::MIN);

        let vegetation = Perlin::new(self.seed.wrapping_add(1));
        let mut rng = Pcg64::seed_from_u64(self.seed as u64);

        for id in ids {
            let Some(cell) = grid.get_mut(*id) else {
                continue;
            };
            let elevation = cell.elevation.unwrap_or(self.base_elevation);

            if elevation < water_line {
                let water = Attribute::marker(AttributeKind::Water)
                    .with_sub_attribute(SubAttribute::WaterDepth(water_line - elevation))?;
                cell.attributes.push(water);
                cell.record_terrain_class(TERRAIN_WATER);
                continue;
            }

            let (x, y) = offset(cell.center);
            let canopy = vegetation.get([x * 0.002, y * 0.002]);
            if canopy > options.forest_threshold {
                let closure = canopy.clamp(0.0, 1.0);
                cell.attributes.push(Attribute::marker(AttributeKind::Forest));
                cell.attributes.push(
                    Attribute::marker(AttributeKind::Vegetation)
                        .with_sub_attribute(SubAttribute::CanopyClosure(closure))?,
                );
                cell.record_terrain_class(TERRAIN_FOREST);
            } else {
                cell.attributes.push(Attribute::marker(AttributeKind::Grass));
                cell.record_terrain_class(TERRAIN_GRASS);
            }

            if rng.gen_bool(options.building_density.clamp(0.0, 1.0)) {
                add_building(cell, rng.gen_range(1.0..10.0))?;
            }
        }
        Ok(())
    }
}

fn add_building(cell: &mut Cell, hardness: f64) -> HexRouteResult<()> {
    cell.attributes.push(
        Attribute::marker(AttributeKind::Building)
            .with_sub_attribute(SubAttribute::BuildingHardness(hardness))?,
    );
    cell.record_terrain_class(TERRAIN_BUILDING);
    Ok(())
}

/// Extreme cells of the grid along one axis, smallest identifier on ties
fn extremes(grid: &Grid, key: impl Fn(&Cell) -> f64) -> Option<(CellId, CellId)> {
    let ids = grid.sorted_ids();
    let cells: Vec<&Cell> = ids.iter().filter_map(|id| grid.get(*id)).collect();
    let low = cells.iter().min_by(|a, b| key(*a).total_cmp(&key(*b)))?;
    let high = cells
        .iter()
        .max_by(|a, b| key(*a).total_cmp(&key(*b)).then(b.id.cmp(&a.id)))?;
    Some((low.id, high.id))
}

/// Isolated highway between the westmost and eastmost cells with junctions at
/// both ends, plus a connected road from the southmost to the northmost cell
fn lay_roads(
    grid: &mut Grid,
    index: &dyn SpatialIndex,
    resolution: u8,
) -> HexRouteResult<RoadAdjacencyGraph> {
    let Some((west, east)) = extremes(grid, |cell| cell.center.lon) else {
        return Ok(RoadAdjacencyGraph::new());
    };
    let west_center = grid.center_of(index, west)?;
    let east_center = grid.center_of(index, east)?;

    let highway = vec![west_center, east_center];
    let roads = RoadAdjacencyGraph::build(std::slice::from_ref(&highway), resolution, index)?;
    roads.mark_isolated_roads(grid, index)?;

    if let Some((south, north)) = extremes(grid, |cell| cell.center.lat) {
        let street = vec![grid.center_of(index, south)?, grid.center_of(index, north)?];
        mark_connected_roads(grid, index, &[street], resolution)?;
    }
    mark_junctions(grid, index, &highway, resolution)?;

    Ok(roads)
}

/// Get a predefined elevation preset
pub fn get_elevation_preset(name: &str, seed: Option<u32>) -> Option<SurveyGenerator> {
    let seed = seed.unwrap_or_else(rand::random);

    match name {
        "flat" => Some(SurveyGenerator::new(
            seed,
            ElevationAlgorithm::Flat { height: 0.0 },
        )),
        "hills" => Some(SurveyGenerator::new(
            seed,
            ElevationAlgorithm::Perlin {
                amplitude: 15.0,
                frequency: 0.002,
                octaves: 4,
            },
        )),
        "mountains" => Some(SurveyGenerator::new(
            seed,
            ElevationAlgorithm::Ridged {
                amplitude: 120.0,
                frequency: 0.001,
                octaves: 5,
            },
        )),
        "valleys" => Some(SurveyGenerator::new(
            seed,
            ElevationAlgorithm::Ridged {
                amplitude: -40.0, // Negative amplitude carves valleys
                frequency: 0.0015,
                octaves: 4,
            },
        )),
        _ => None,
    }
}
