//! Trajectory parsing
//!
//! Converts raw trajectory geometry (cameras in `[lat, lon, elevation]` order) plus
//! optional shot metadata into an ordered, GeoJSON-ordered camera sequence with its
//! connecting line and bounding box.

use crate::camera::{CameraRecord, RawCamera};
use crate::utils;
use geo::{Coord, LineString, Rect};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// The normalized result of parsing a trajectory.
///
/// `line` has exactly one vertex per camera, in camera order, and `bounds` encloses
/// every camera coordinate. An empty trajectory has a zero-vertex line and the
/// degenerate bounds `[[0, 0], [0, 0]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedTrajectory {
    /// Cameras ordered by capture time when known, otherwise in file order
    pub cameras: Vec<CameraRecord>,
    /// Path through the camera positions
    pub line: LineString<f64>,
    /// Bounding box of the camera positions (x = lon, y = lat)
    pub bounds: Rect<f64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ParsedTrajectory {
    /// The result used whenever no cameras can be found
    pub fn empty() -> Self {
        Self::from_cameras(Vec::new())
    }

    fn from_cameras(cameras: Vec<CameraRecord>) -> Self {
        let coords: Vec<Coord<f64>> = cameras.iter().map(|c| c.coordinates).collect();
        let bounds = utils::compute_bounds(&coords);
        Self {
            cameras,
            line: LineString::new(coords),
            bounds,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Bounds as `[[min_lon, min_lat], [max_lon, max_lat]]`
    #[inline]
    pub fn bounds_array(&self) -> [[f64; 2]; 2] {
        utils::bounds_to_array(&self.bounds)
    }

    /// The connecting path as a GeoJSON `LineString` feature
    pub fn line_feature(&self) -> geojson::Feature {
        let positions = self.line.coords().map(|c| vec![c.x, c.y]).collect();
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::LineString(
                positions,
            ))),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }
}

/// Whether a value looks like a trajectory group, i.e. it carries a `cameras` attribute.
pub fn is_camera_container(value: &Value) -> bool {
    value.get("cameras").is_some()
}

/// Find the first trajectory group.
///
/// `trajectories[0]` wins; otherwise the first top-level array whose first element
/// is a camera container. Producers disagree on the top-level key name.
fn first_trajectory_group(raw: &Value) -> Option<&Value> {
    if let Some(group) = raw
        .get("trajectories")
        .and_then(Value::as_array)
        .and_then(|groups| groups.first())
    {
        return Some(group);
    }

    raw.as_object()?
        .values()
        .filter_map(Value::as_array)
        .filter_map(|groups| groups.first())
        .find(|first| is_camera_container(first))
}

/// Camera id -> capture time, from the first metadata group's shot map only
fn capture_times(raw_metadata: Option<&Value>) -> HashMap<&str, f64> {
    let Some(shots) = raw_metadata
        .and_then(Value::as_array)
        .and_then(|groups| groups.first())
        .and_then(|group| group.get("shots"))
        .and_then(Value::as_object)
    else {
        return HashMap::new();
    };

    shots
        .iter()
        .filter_map(|(id, shot)| {
            shot.get("capture_time")
                .and_then(Value::as_f64)
                .map(|time| (id.as_str(), time))
        })
        .collect()
}

/// Stable ascending sort by capture time.
///
/// Cameras without a capture time keep their positions; the timed cameras are
/// sorted among the slots they occupy.
fn sort_by_capture_time(cameras: Vec<CameraRecord>) -> Vec<CameraRecord> {
    let is_timed: Vec<bool> = cameras.iter().map(|c| c.capture_time.is_some()).collect();

    let mut timed_order: Vec<usize> = (0..cameras.len()).filter(|&i| is_timed[i]).collect();
    timed_order.sort_by(|&a, &b| {
        let ta = cameras[a].capture_time.unwrap_or_default();
        let tb = cameras[b].capture_time.unwrap_or_default();
        ta.total_cmp(&tb)
    });

    let mut pool: Vec<Option<CameraRecord>> = cameras.into_iter().map(Some).collect();
    let mut next_timed = timed_order.into_iter();
    let mut sorted = Vec::with_capacity(pool.len());

    for (slot, timed) in is_timed.into_iter().enumerate() {
        let source = if timed { next_timed.next() } else { Some(slot) };
        if let Some(camera) = source.and_then(|index| pool[index].take()) {
            sorted.push(camera);
        }
    }

    sorted
}

/// Parse raw trajectory geometry and optional shot metadata.
///
/// Never fails: any structure that cannot be recognized yields
/// [`ParsedTrajectory::empty`]. Unreadable camera records are skipped.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_trajectory(raw_geometry: &Value, raw_metadata: Option<&Value>) -> ParsedTrajectory {
    let Some(raw_cameras) = first_trajectory_group(raw_geometry)
        .and_then(|group| group.get("cameras"))
        .and_then(Value::as_array)
    else {
        tracing::debug!("No trajectory group with a camera list found");
        return ParsedTrajectory::empty();
    };

    let times = capture_times(raw_metadata);

    let mut cameras = Vec::with_capacity(raw_cameras.len());
    for (index, value) in raw_cameras.iter().enumerate() {
        let raw = match RawCamera::deserialize(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping unreadable camera #{}: {}", index, e);
                continue;
            }
        };
        let capture_time = times.get(raw.id.as_str()).copied();
        match CameraRecord::from_raw(raw, capture_time) {
            Some(camera) => cameras.push(camera),
            None => tracing::warn!("Skipping camera #{} without a position", index),
        }
    }

    if !times.is_empty() {
        cameras = sort_by_capture_time(cameras);
    }

    tracing::debug!(
        "Parsed {} cameras ({} with capture time)",
        cameras.len(),
        cameras.iter().filter(|c| c.capture_time.is_some()).count()
    );

    ParsedTrajectory::from_cameras(cameras)
}
