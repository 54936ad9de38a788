//! Application state management
//!
//! Holds the one live dataset of a session together with its parsed trajectory
//! and the camera selection. Replacing the dataset always releases the previous
//! one's image resources first.

use geojson::{FeatureCollection, GeoJson, JsonValue};
use trajectory_lib::{CameraRecord, LoadedData, ParsedTrajectory, Result, to_point_features};

/// Main application state
pub struct AppState {
    /// The live dataset, if any
    data: Option<LoadedData>,

    /// Parsed trajectory of the live dataset
    pub trajectory: ParsedTrajectory,

    /// Currently selected camera index
    pub selected: Option<usize>,

    /// Load errors, oldest first
    pub errors: Vec<String>,

    /// Statistics about loaded data
    pub stats: Stats,
}

/// Statistics about loaded data
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stats {
    /// Number of cameras in the trajectory
    pub camera_count: usize,

    /// Number of cameras with a capture time
    pub timed_count: usize,

    /// Number of object annotation features
    pub object_count: usize,

    /// Number of datasets loaded this session
    pub loads: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl AppState {
    pub fn new() -> Self {
        Self {
            data: None,
            trajectory: ParsedTrajectory::empty(),
            selected: None,
            errors: Vec::new(),
            stats: Stats::default(),
        }
    }

    /// Apply the outcome of a load.
    ///
    /// Returns `Ok(true)` when a new dataset replaced the current one and `Ok(false)`
    /// when the user cancelled. Failures are recorded and returned; the current
    /// dataset stays live in both of those cases.
    pub fn apply_load(&mut self, result: Result<LoadedData>) -> Result<bool> {
        match result {
            Ok(data) => {
                self.replace(data);
                Ok(true)
            }
            Err(e) if e.is_cancelled() => {
                tracing::info!("Load cancelled");
                Ok(false)
            }
            Err(e) => {
                tracing::error!("Failed to load dataset: {}", e);
                self.errors.push(e.to_string());
                Err(e)
            }
        }
    }

    /// Make `data` the live dataset, cleaning up the previous one
    pub fn replace(&mut self, data: LoadedData) {
        self.clear();

        self.trajectory = data.parse();
        self.selected = (!self.trajectory.is_empty()).then_some(0);
        self.stats = Stats {
            camera_count: self.trajectory.len(),
            timed_count: self
                .trajectory
                .cameras
                .iter()
                .filter(|c| c.capture_time.is_some())
                .count(),
            object_count: data.objects().map(|c| c.features.len()).unwrap_or(0),
            loads: self.stats.loads + 1,
        };
        self.data = Some(data);

        tracing::info!(
            "Dataset loaded: {} cameras ({} timed), {} objects",
            self.stats.camera_count,
            self.stats.timed_count,
            self.stats.object_count
        );
    }

    /// Release the live dataset
    pub fn clear(&mut self) {
        if let Some(mut data) = self.data.take() {
            data.cleanup();
        }
        self.trajectory = ParsedTrajectory::empty();
        self.selected = None;
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Select a camera by index. Out-of-range indices are rejected.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.trajectory.len() {
            self.selected = Some(index);
            true
        } else {
            tracing::warn!(
                "Camera index {} out of range (0..{})",
                index,
                self.trajectory.len()
            );
            false
        }
    }

    /// Move the selection forward, stopping at the last camera
    pub fn select_next(&mut self) -> Option<usize> {
        let next = match self.selected {
            Some(i) => (i + 1).min(self.trajectory.len().checked_sub(1)?),
            None if !self.trajectory.is_empty() => 0,
            None => return None,
        };
        self.selected = Some(next);
        self.selected
    }

    /// Move the selection back, stopping at the first camera
    pub fn select_previous(&mut self) -> Option<usize> {
        let previous = match self.selected {
            Some(i) => i.saturating_sub(1),
            None if !self.trajectory.is_empty() => 0,
            None => return None,
        };
        self.selected = Some(previous);
        self.selected
    }

    pub fn selected_camera(&self) -> Option<&CameraRecord> {
        self.trajectory.cameras.get(self.selected?)
    }

    /// Image URL of the camera at `index`
    pub fn image_url(&mut self, index: usize) -> Option<String> {
        let id = &self.trajectory.cameras.get(index)?.id;
        self.data.as_mut()?.resolve_image(id)
    }

    /// Image URL of the selected camera
    pub fn selected_image_url(&mut self) -> Option<String> {
        self.image_url(self.selected?)
    }

    /// Everything the map needs as one collection: camera points, the trajectory
    /// line and object annotations, with the trajectory bounds as `bbox`.
    pub fn export(&self) -> FeatureCollection {
        let mut collection = to_point_features(&self.trajectory.cameras, self.selected);
        collection.features.push(self.trajectory.line_feature());

        if let Some(objects) = self.data.as_ref().and_then(LoadedData::objects) {
            collection.features.extend(objects.features);
        }

        let [[min_x, min_y], [max_x, max_y]] = self.trajectory.bounds_array();
        collection.bbox = Some(vec![min_x, min_y, max_x, max_y]);
        collection
    }

    /// Export as a JSON value
    pub fn export_json(&self) -> JsonValue {
        GeoJson::from(self.export()).to_json_value()
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.clear();
    }
}
