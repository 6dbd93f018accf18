pub mod config;
pub mod errors;
pub mod map;
pub mod pathfinding;
pub mod spatial;
pub mod terrain;
pub mod terrain_generation;

// Selective re-exports for external consumers

// Errors - every fallible operation returns these
pub use errors::{HexRouteError, HexRouteResult};

// Map - grid, cells and attribute store
pub use map::{
    Attribute, AttributeKind, AttributeValue, Cell, Grid, GridSnapshot, RoadAdjacencyGraph,
    RoadTopology, SubAttribute, SubAttributeKind,
};

// Planning - planner, limits and cost policy
pub use pathfinding::{CostModel, CostSettings, PathPlanner, Route, SearchLimits, TerrainCostModel};

// Spatial - index abstraction and the bundled tessellations
pub use spatial::{CellId, H3Index, LatLon, PlanarHexIndex, SpatialIndex, Tessellation};
