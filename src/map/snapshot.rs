use crate::errors::{HexRouteError, HexRouteResult};
use crate::map::{Grid, RoadAdjacencyGraph};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use validator::Validate;

/// A grid together with its road graph, as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub grid: Grid,
    pub roads: RoadAdjacencyGraph,
}

impl GridSnapshot {
    pub fn new(grid: Grid, roads: RoadAdjacencyGraph) -> Self {
        Self { grid, roads }
    }

    /// Get the grids directory path
    pub fn get_grids_dir() -> HexRouteResult<PathBuf> {
        Ok(std::env::current_dir()?.join("grids"))
    }

    /// Load a snapshot from the grids directory
    pub fn load_from_file<P: AsRef<Path>>(filename: P) -> HexRouteResult<Self> {
        Self::load_from_path(Self::get_grids_dir()?.join(filename))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> HexRouteResult<Self> {
        let file_path = path.as_ref();
        if !file_path.exists() {
            return Err(HexRouteError::SnapshotFileNotFound {
                path: file_path.to_path_buf(),
            });
        }

        let data = std::fs::read(file_path)?;
        let (snapshot, _): (GridSnapshot, usize) =
            bincode::serde::decode_from_slice(&data, bincode::config::standard()).map_err(|e| {
                HexRouteError::CorruptedSnapshot {
                    reason: format!("Failed to deserialize grid data: {e}"),
                }
            })?;

        snapshot.validate_grid()?;
        info!(
            "Loaded grid '{}' with {} cells from {}",
            snapshot.grid.name,
            snapshot.grid.len(),
            file_path.display()
        );
        Ok(snapshot)
    }

    /// Save the snapshot to the grids directory
    pub fn save_to_file<P: AsRef<Path>>(&self, filename: P) -> HexRouteResult<PathBuf> {
        let file_path = Self::get_grids_dir()?.join(filename);
        self.save_to_path(&file_path)?;
        Ok(file_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> HexRouteResult<()> {
        self.validate_grid()?;
        let file_path = path.as_ref();

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            HexRouteError::InvalidGridData {
                reason: format!("Failed to serialize grid: {e}"),
            }
        })?;

        std::fs::write(file_path, data)?;
        info!("Saved grid '{}' to {}", self.grid.name, file_path.display());
        Ok(())
    }

    fn validate_grid(&self) -> HexRouteResult<()> {
        self.grid.validate().map_err(|validation_errors| {
            let error_details = validation_errors
                .field_errors()
                .iter()
                .map(|(field, errors)| {
                    let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                    format!("{field}: {}", error_msgs.join(", "))
                })
                .collect::<Vec<String>>()
                .join("; ");

            HexRouteError::InvalidGridData {
                reason: format!("Grid validation failed: {error_details}"),
            }
        })
    }
}
