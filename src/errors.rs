use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HexRouteError {
    // Config-related errors
    #[error("Failed to get config directory")]
    ConfigDirNotFound,

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    SerializationFailed(#[from] toml::ser::Error),

    #[error("Failed to deserialize config: {0}")]
    DeserializationFailed(#[from] toml::de::Error),

    // Snapshot-related errors
    #[error("Grid snapshot not found at path: {path}")]
    SnapshotFileNotFound { path: PathBuf },

    #[error("Corrupted grid snapshot: {reason}")]
    CorruptedSnapshot { reason: String },

    #[error("Invalid grid data: {reason}")]
    InvalidGridData { reason: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // Geometry errors surfaced by the spatial index
    #[error("Invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid cell identifier: {id:#x}")]
    InvalidCell { id: u64 },

    #[error("Resolution {resolution} is not supported by this index")]
    InvalidResolution { resolution: u8 },

    #[error("Malformed geometry: {reason}")]
    MalformedGeometry { reason: String },

    // Attribute store errors
    #[error("Sub-attribute {sub} cannot be attached to a {attribute} attribute")]
    SubAttributeMismatch { attribute: String, sub: String },

    #[error("Attribute kind '{kind}' is already registered at position {position}")]
    DuplicateAttributeRegistration { kind: String, position: usize },

    // Planning errors
    #[error("No cell in the grid contains the {endpoint} coordinate at any resolution")]
    EndpointNotFound { endpoint: &'static str },

    #[error("Goal is unreachable under the active cost model ({expanded} cells expanded)")]
    Unreachable { expanded: usize },

    #[error("Planning cancelled after {expanded} expansions")]
    Cancelled { expanded: usize },

    #[error("Planning stopped after reaching the expansion limit of {limit}")]
    ExpansionLimitReached { limit: usize },
}

/// Result type alias for all operations
pub type HexRouteResult<T> = Result<T, HexRouteError>;
