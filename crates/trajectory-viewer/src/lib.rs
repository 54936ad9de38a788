//! Trajectory Viewer
//!
//! A headless front end over `trajectory-lib`: loads one dataset per run from a
//! directory, ZIP archive, remote URLs or a folder picked in a dialog, keeps it as
//! the session's live dataset, and exports the camera points, trajectory line and
//! object annotations as a single GeoJSON collection.

mod app;
pub mod entrypoints;

pub use app::settings::{Settings, Source};
pub use app::state::{AppState, Stats};
pub use app::{AppError, TrajectoryViewerApp, load_source};
