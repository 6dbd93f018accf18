use crate::errors::{HexRouteError, HexRouteResult};
use crate::map::{Grid, RoadAdjacencyGraph};
use crate::spatial::{CellId, LatLon, SpatialIndex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub mod connectivity;
pub mod cost_model;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

pub use cost_model::{CostModel, CostSettings, Shortcut, TerrainCostModel};
pub use search::{PlanningRun, StepOutcome};

/// Bounds checked once per search iteration
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub max_expansions: Option<usize>,
    pub timeout: Option<Duration>,
    /// Set to `true` from another thread to stop the run
    pub cancel: Option<Arc<AtomicBool>>,
}

/// A planned route from start to goal
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub cells: Vec<CellId>,
    pub centers: Vec<LatLon>,
    pub cost: f64,
    /// Cells closed during the search
    pub expanded: usize,
}

impl Route {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A* route planner over an immutable grid
pub struct PathPlanner<'a> {
    grid: &'a Grid,
    index: &'a dyn SpatialIndex,
    cost_model: &'a dyn CostModel,
    roads: Option<&'a RoadAdjacencyGraph>,
    limits: SearchLimits,
}

impl<'a> PathPlanner<'a> {
    pub fn new(grid: &'a Grid, index: &'a dyn SpatialIndex, cost_model: &'a dyn CostModel) -> Self {
        Self {
            grid,
            index,
            cost_model,
            roads: None,
            limits: SearchLimits::default(),
        }
    }

    pub fn with_roads(mut self, roads: &'a RoadAdjacencyGraph) -> Self {
        self.roads = Some(roads);
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Map both endpoints to grid cells at the coarsest resolution holding both
    pub fn resolve(&self, start: LatLon, end: LatLon) -> HexRouteResult<(CellId, CellId)> {
        for position in [start, end] {
            if !position.is_finite() {
                return Err(HexRouteError::InvalidCoordinate {
                    lat: position.lat,
                    lon: position.lon,
                });
            }
        }

        let mut start_seen = false;
        for resolution in self.index.resolutions() {
            let Ok(start_id) = self.index.cell_at(start, resolution) else {
                continue;
            };
            let has_start = self.grid.contains(start_id);
            start_seen |= has_start;
            let Ok(end_id) = self.index.cell_at(end, resolution) else {
                continue;
            };
            if has_start && self.grid.contains(end_id) {
                debug!("Resolved endpoints at resolution {resolution}: {start_id} -> {end_id}");
                return Ok((start_id, end_id));
            }
        }

        Err(HexRouteError::EndpointNotFound {
            endpoint: if start_seen { "end" } else { "start" },
        })
    }

    /// Plan a route between two coordinates
    pub fn plan(&self, start: LatLon, end: LatLon) -> HexRouteResult<Route> {
        let (start_id, goal_id) = self.resolve(start, end)?;
        self.plan_cells(start_id, goal_id)
    }

    /// A fresh stepwise run between two grid cells
    pub fn run(&self, start: CellId, goal: CellId) -> HexRouteResult<PlanningRun<'a>> {
        PlanningRun::new(self.grid, self.index, self.cost_model, self.roads, start, goal)
    }

    /// Plan a route between two cells already known to be in the grid
    pub fn plan_cells(&self, start: CellId, goal: CellId) -> HexRouteResult<Route> {
        if !self.grid.contains(start) {
            return Err(HexRouteError::EndpointNotFound { endpoint: "start" });
        }
        if !self.grid.contains(goal) {
            return Err(HexRouteError::EndpointNotFound { endpoint: "end" });
        }
        if start == goal {
            return Ok(Route {
                cells: vec![start],
                centers: vec![self.grid.center_of(self.index, start)?],
                cost: 0.0,
                expanded: 0,
            });
        }

        if let Some(kind) = self.cost_model.required_attribute_kind()
            && !self.grid.is_attribute_kind_registered(&kind.name())
        {
            warn!(
                "Attribute kind '{kind}' has not been derived for grid '{}'; every cell it guards will be rejected",
                self.grid.name
            );
        }

        let started = Instant::now();
        let mut run = self.run(start, goal)?;
        loop {
            self.check_limits(&run, started)?;
            match run.step()? {
                StepOutcome::Expanded(_) => {}
                StepOutcome::GoalReached => break,
                StepOutcome::Exhausted => {
                    info!(
                        "Goal {goal} unreachable from {start} after {} expansions",
                        run.expanded()
                    );
                    return Err(HexRouteError::Unreachable {
                        expanded: run.expanded(),
                    });
                }
            }
        }

        let cells = run.reconstruct()?;
        let centers = cells
            .iter()
            .map(|id| self.grid.center_of(self.index, *id))
            .collect::<HexRouteResult<Vec<_>>>()?;
        let cost = run.goal_cost().unwrap_or_default();

        info!(
            "Planned route of {} cells (cost {cost:.2}) with {} expansions in {:.1?}",
            cells.len(),
            run.expanded(),
            started.elapsed()
        );

        Ok(Route {
            cells,
            centers,
            cost,
            expanded: run.expanded(),
        })
    }

    fn check_limits(&self, run: &PlanningRun<'_>, started: Instant) -> HexRouteResult<()> {
        let expanded = run.expanded();
        if let Some(cancel) = &self.limits.cancel
            && cancel.load(Ordering::Relaxed)
        {
            return Err(HexRouteError::Cancelled { expanded });
        }
        if let Some(timeout) = self.limits.timeout
            && started.elapsed() >= timeout
        {
            warn!("Planning timed out after {timeout:?}");
            return Err(HexRouteError::Cancelled { expanded });
        }
        if let Some(limit) = self.limits.max_expansions
            && expanded >= limit
        {
            return Err(HexRouteError::ExpansionLimitReached { limit });
        }
        Ok(())
    }
}
