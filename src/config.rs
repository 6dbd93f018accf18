use crate::errors::{HexRouteError, HexRouteResult};
use crate::pathfinding::{CostSettings, SearchLimits};
use crate::spatial::Tessellation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub mod range_types;

use range_types::Resolution;

/// Search bounds as stored in the config file
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LimitSettings {
    pub max_expansions: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl LimitSettings {
    pub fn to_limits(&self) -> SearchLimits {
        SearchLimits {
            max_expansions: self.max_expansions,
            timeout: self.timeout_ms.map(Duration::from_millis),
            cancel: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
// NOTE: When adding new fields, keep `Default` in sync so older config files still load
pub struct PlannerSettings {
    /// Resolution new grids are generated at
    pub resolution: Resolution,
    pub tessellation: Tessellation,
    pub cost: CostSettings,
    pub limits: LimitSettings,
}

pub fn get_config_path() -> HexRouteResult<PathBuf> {
    let mut path = dirs::config_dir().ok_or(HexRouteError::ConfigDirNotFound)?;
    path.push("hexroute");
    fs::create_dir_all(&path)?;
    path.push("config.toml");
    Ok(path)
}

/// Load settings from the user config directory, falling back to defaults
pub fn load_config() -> PlannerSettings {
    match get_config_path().and_then(|path| load_config_from(&path)) {
        Ok(settings) => settings,
        Err(e) => {
            debug!("Using default planner settings: {e}");
            PlannerSettings::default()
        }
    }
}

pub fn load_config_from(path: &Path) -> HexRouteResult<PlannerSettings> {
    let contents = fs::read_to_string(path)?;
    let settings = toml::from_str::<PlannerSettings>(&contents).inspect_err(|e| {
        warn!("Ignoring malformed config at {}: {e}", path.display());
    })?;
    Ok(settings)
}

pub fn save_config(settings: &PlannerSettings) -> HexRouteResult<PathBuf> {
    let path = get_config_path()?;
    save_config_to(settings, &path)?;
    Ok(path)
}

pub fn save_config_to(settings: &PlannerSettings, path: &Path) -> HexRouteResult<()> {
    let contents = toml::to_string_pretty(settings)?;
    fs::write(path, contents)?;
    Ok(())
}
