use clap::{Args, Parser, Subcommand};
use hexroute::config::range_types::CvThreshold;
use hexroute::config::{self, PlannerSettings};
use hexroute::pathfinding::connectivity::reachable_cells;
use hexroute::terrain::constants::H3_EDGE_LENGTH_M;
use hexroute::terrain_generation::SurveyOptions;
use hexroute::{
    GridSnapshot, HexRouteError, HexRouteResult, PathPlanner, PlanarHexIndex, Route,
    TerrainCostModel, Tessellation,
};
use std::collections::BTreeMap;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod hexroute_cli {
    pub mod cli_utils;
    pub mod grid_builder;
}

use hexroute_cli::cli_utils::*;
use hexroute_cli::grid_builder::SurveyBuilder;

#[derive(Parser)]
#[command(name = "hexroute")]
#[command(about = "Generate hexagonal terrain grids and plan routes across them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a synthetic survey grid and save it under grids/
    Generate(GenerateArgs),
    /// Plan a route across a saved grid
    Plan(PlanArgs),
    /// Summarise a saved grid
    Info(InfoArgs),
    /// Show or initialise the planner config file
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct GenerateArgs {
    /// Grid name
    #[arg(long, default_value = "survey")]
    name: String,

    /// Output file path relative to grids/ (defaults to NAME.bin)
    #[arg(long)]
    output: Option<String>,

    /// Tessellation (h3, planar); defaults to the configured one
    #[arg(long)]
    tessellation: Option<String>,

    /// Resolution-0 edge length in metres for the planar tessellation
    #[arg(long, default_value = "1000000.0")]
    base_edge: f64,

    /// Resolution to build the grid at; defaults to the configured one
    #[arg(long)]
    resolution: Option<u8>,

    /// Survey origin (format: LAT,LON)
    #[arg(long, default_value = "32.0603,118.7969", allow_hyphen_values = true)]
    origin: String,

    /// Rings of cells around the origin cell
    #[arg(long, default_value = "12")]
    rings: u32,

    /// Elevation preset (flat, hills, mountains, valleys) or algorithm (perlin, ridged)
    #[arg(long, default_value = "hills")]
    terrain_type: String,

    /// Random seed for reproducible generation
    #[arg(long)]
    seed: Option<u32>,

    #[arg(long)]
    amplitude: Option<f64>,

    #[arg(long)]
    frequency: Option<f64>,

    #[arg(long)]
    octaves: Option<u32>,

    /// Elevation the relief is added to
    #[arg(long)]
    base_elevation: Option<f64>,

    /// Share of the lowest cells turned into water (0.0-1.0)
    #[arg(long, default_value = "0.08")]
    water: f64,

    /// Vegetation noise threshold for forest
    #[arg(long, default_value = "0.35")]
    forest: f64,

    /// Building chance per dry cell (0.0-1.0)
    #[arg(long, default_value = "0.03")]
    buildings: f64,

    /// Skip laying the highway and street
    #[arg(long)]
    no_roads: bool,
}

#[derive(Args, Clone)]
struct PlanArgs {
    /// Grid file relative to grids/
    #[arg(long)]
    grid: String,

    /// Start position (format: LAT,LON)
    #[arg(long, allow_hyphen_values = true)]
    from: String,

    /// Goal position (format: LAT,LON)
    #[arg(long, allow_hyphen_values = true)]
    to: String,

    /// Reject cells whose elevation coefficient of variation exceeds this
    #[arg(long)]
    cv_threshold: Option<f64>,

    /// Comma-separated attribute kinds that block movement
    #[arg(long)]
    blocking: Option<String>,

    #[arg(long)]
    max_expansions: Option<usize>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Ignore the road graph, disabling shortcuts along roads
    #[arg(long)]
    no_shortcuts: bool,
}

#[derive(Args, Clone)]
struct InfoArgs {
    /// Grid file relative to grids/
    #[arg(long)]
    grid: String,
}

#[derive(Args, Clone)]
struct ConfigArgs {
    /// Write the default settings to the config file
    #[arg(long)]
    init: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexroute=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> HexRouteResult<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = config::load_config();

    match cli.command {
        Command::Generate(args) => generate(args, &settings),
        Command::Plan(args) => plan(args, settings),
        Command::Info(args) => print_grid_summary(&GridSnapshot::load_from_file(&args.grid)?),
        Command::Config(args) => show_config(args, &settings),
    }
}

fn generate(args: GenerateArgs, settings: &PlannerSettings) -> HexRouteResult<()> {
    let origin = parse_latlon(&args.origin)?;
    let tessellation = match &args.tessellation {
        Some(name) => parse_tessellation(name, args.base_edge)?,
        None => settings.tessellation,
    };
    let resolution = args.resolution.unwrap_or(settings.resolution.get());
    let output_filename = args.output.clone().unwrap_or_else(|| format!("{}.bin", args.name));
    validate_output_path(&output_filename)?;

    let generator = SurveyBuilder::new(args.terrain_type.clone())
        .seed(args.seed)
        .amplitude(args.amplitude)
        .frequency(args.frequency)
        .octaves(args.octaves)
        .base_elevation(args.base_elevation)
        .build()?;

    let options = SurveyOptions {
        rings: args.rings,
        water_fraction: validate_fraction(args.water, "Water fraction"),
        forest_threshold: args.forest,
        building_density: validate_fraction(args.buildings, "Building density"),
        roads: !args.no_roads,
    };

    let index = tessellation.index();
    let snapshot = generator.generate(
        &args.name,
        index.as_ref(),
        tessellation,
        origin,
        resolution,
        &options,
    )?;
    let path = snapshot.save_to_file(&output_filename)?;

    println!("Grid saved successfully to: {}", path.display());
    print_grid_summary(&snapshot)
}

fn plan(args: PlanArgs, mut settings: PlannerSettings) -> HexRouteResult<()> {
    let start = parse_latlon(&args.from)?;
    let goal = parse_latlon(&args.to)?;
    if let Some(threshold) = args.cv_threshold {
        settings.cost.cv_threshold = Some(CvThreshold::new(threshold));
    }
    if let Some(blocking) = &args.blocking {
        settings.cost.blocking_kinds = parse_attribute_kinds(blocking)?;
    }
    if args.max_expansions.is_some() {
        settings.limits.max_expansions = args.max_expansions;
    }
    if args.timeout_ms.is_some() {
        settings.limits.timeout_ms = args.timeout_ms;
    }

    let snapshot = GridSnapshot::load_from_file(&args.grid)?;
    let index = snapshot.grid.tessellation.index();
    let cost_model = TerrainCostModel::new(settings.cost.clone());
    let mut planner = PathPlanner::new(&snapshot.grid, index.as_ref(), &cost_model)
        .with_limits(settings.limits.to_limits());
    if !args.no_shortcuts {
        planner = planner.with_roads(&snapshot.roads);
    }

    let (start_id, goal_id) = planner.resolve(start, goal)?;
    match planner.plan_cells(start_id, goal_id) {
        Ok(route) => {
            print_route(&route);
            Ok(())
        }
        Err(HexRouteError::Unreachable { expanded }) => {
            let roads = (!args.no_shortcuts).then_some(&snapshot.roads);
            let component = reachable_cells(&snapshot.grid, &cost_model, roads, start_id);
            warn!(
                "Start cell {start_id} reaches {} of {} cells under the current cost settings",
                component.len(),
                snapshot.grid.len()
            );
            Err(HexRouteError::Unreachable { expanded })
        }
        Err(e) => Err(e),
    }
}

fn print_route(route: &Route) {
    println!(
        "Route: {} cells, cost {:.2}, {} cells expanded",
        route.len(),
        route.cost,
        route.expanded
    );
    for (i, (cell, center)) in route.cells.iter().zip(&route.centers).enumerate() {
        println!("  {:>4}: {cell} at {center}", i + 1);
    }
}

fn edge_length_m(tessellation: Tessellation, resolution: u8) -> Option<f64> {
    match tessellation {
        Tessellation::H3 => H3_EDGE_LENGTH_M.get(usize::from(resolution)).copied(),
        Tessellation::Planar { base_edge_m } => {
            Some(PlanarHexIndex::new(base_edge_m).edge_length(resolution))
        }
    }
}

fn print_grid_summary(snapshot: &GridSnapshot) -> HexRouteResult<()> {
    let grid = &snapshot.grid;
    println!("\nGrid summary:");
    println!("  Name: {}", grid.name);
    println!("  Tessellation: {}", grid.tessellation);
    match edge_length_m(grid.tessellation, grid.resolution) {
        Some(edge) => println!("  Resolution: {} (edge ~{edge:.2} m)", grid.resolution),
        None => println!("  Resolution: {}", grid.resolution),
    }
    println!("  Cells: {}", grid.len());
    println!(
        "  Road graph: {} nodes, {} edges",
        snapshot.roads.len(),
        snapshot.roads.edge_count()
    );

    let mut topologies = BTreeMap::new();
    let mut attributes = BTreeMap::new();
    for cell in grid.cells() {
        *topologies.entry(cell.road.to_string()).or_insert(0usize) += 1;
        for attribute in &cell.attributes {
            *attributes.entry(attribute.kind.name()).or_insert(0usize) += 1;
        }
    }
    println!("  Road topology:");
    for (topology, count) in &topologies {
        println!("    {topology}: {count} cells");
    }

    let mut registered: Vec<(&String, &usize)> = grid.attribute_kinds().iter().collect();
    registered.sort_by_key(|(_, position)| **position);
    println!(
        "  Derived kinds: {}",
        registered
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Attributes:");
    for (kind, count) in &attributes {
        println!("    {kind}: {count} cells");
    }

    Ok(())
}

fn show_config(args: ConfigArgs, settings: &PlannerSettings) -> HexRouteResult<()> {
    if args.init {
        let path = config::save_config(&PlannerSettings::default())?;
        info!("Wrote default settings to {}", path.display());
        return Ok(());
    }

    println!("Config file: {}", config::get_config_path()?.display());
    println!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_plan() {
        let cli = Cli::try_parse_from([
            "hexroute",
            "plan",
            "--grid",
            "survey.bin",
            "--from",
            "-120.0,40.5",
            "--to",
            "300,-80",
            "--cv-threshold",
            "0.3",
        ])
        .unwrap();

        let Command::Plan(args) = cli.command else {
            panic!("Expected plan command");
        };
        assert_eq!(args.grid, "survey.bin");
        assert_eq!(parse_latlon(&args.from).unwrap().lat, -120.0);
        assert_eq!(parse_latlon(&args.to).unwrap().lon, -80.0);
        assert_eq!(args.cv_threshold, Some(0.3));
        assert!(!args.no_shortcuts);
    }

    #[test]
    fn test_cli_generate_defaults() {
        let cli = Cli::try_parse_from(["hexroute", "generate", "--seed", "42"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("Expected generate command");
        };
        assert_eq!(args.name, "survey");
        assert_eq!(args.rings, 12);
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.tessellation, None);
        assert!(!args.no_roads);
    }

    #[test]
    fn test_edge_length_lookup() {
        assert_eq!(edge_length_m(Tessellation::H3, 9), Some(174.38));
        assert_eq!(edge_length_m(Tessellation::H3, 16), None);
        let planar = edge_length_m(Tessellation::Planar { base_edge_m: 700.0 }, 0).unwrap();
        assert_eq!(planar, 700.0);
    }

    #[test]
    fn test_generated_survey_summary() {
        let generator = SurveyBuilder::new("flat").seed(Some(5)).build().unwrap();
        let index = PlanarHexIndex::new(100.0);
        let options = SurveyOptions {
            rings: 3,
            ..SurveyOptions::default()
        };
        let snapshot = generator
            .generate(
                "summary",
                &index,
                Tessellation::Planar { base_edge_m: 100.0 },
                hexroute::LatLon::new(0.0, 0.0),
                0,
                &options,
            )
            .unwrap();
        assert_eq!(snapshot.grid.len(), 37);
        assert!(print_grid_summary(&snapshot).is_ok());
    }
}
