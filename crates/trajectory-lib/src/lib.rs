//! Trajectory Library - Ingestion and Normalization of Photo Trajectories
//!
//! This library loads geo-referenced photo trajectory datasets (camera poses, optional
//! capture timestamps, optional detected-object annotations and images) from a local
//! directory, a ZIP archive or a set of remote URLs, and normalizes them into a single
//! in-memory model for map rendering and sequential image browsing.
//!
//! # Architecture
//!
//! - **[`utils`]**: Coordinate-order swapping and bounding boxes
//! - **[`loader`]**: Source loaders producing a common [`LoadedData`]
//! - **[`parse_trajectory`]**: Raw geometry + shot metadata into a [`ParsedTrajectory`]
//! - **[`to_point_features`]**: Camera sequence into a GeoJSON point collection
//!
//! # Coordinate order
//!
//! Trajectory files store camera positions as `[latitude, longitude, elevation]`.
//! Everything this crate hands out is in GeoJSON order: `geo::Coord { x: lon, y: lat }`.
//!
//! # Usage Example
//!
//! ```no_run
//! use trajectory_lib::{load_from_directory, to_point_features};
//!
//! # async fn run() -> trajectory_lib::Result<()> {
//! let mut data = load_from_directory("dataset/").await?;
//! let trajectory = data.parse();
//! let features = to_point_features(&trajectory.cameras, Some(0));
//! if let Some(first) = trajectory.cameras.first() {
//!     let _url = data.resolve_image(&first.id);
//! }
//! # let _ = features;
//! data.cleanup();
//! # Ok(())
//! # }
//! ```

mod camera;
mod features;
pub mod loader;
mod trajectory;
pub mod utils;

// Public API exports
pub use camera::CameraRecord;
pub use features::{CameraFeature, to_point_features};
pub use loader::{
    DatasetLayout, ImageResolver, LoadedData, RemoteSource, load_from_archive, load_from_directory,
    load_from_urls,
};
pub use trajectory::{ParsedTrajectory, is_camera_container, parse_trajectory};

use std::path::PathBuf;

/// Error types for loading datasets
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No trajectory geometry file found in {0}")]
    MissingTrajectory(String),

    #[error("Malformed JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Load cancelled")]
    Cancelled,
}

impl DataError {
    /// Whether the load was abandoned by the user rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DataError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
