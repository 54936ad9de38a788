//! Camera records, raw and normalized

use crate::utils;
use geo::Coord;
use serde::Deserialize;
use serde_json::Value;

/// Quaternion used when a producer omits the rotation or writes another shape
pub(crate) const IDENTITY_ROTATION: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// A camera pose as stored in the trajectory geometry file.
///
/// `coordinates` is `[lat, lon, elevation]`; elevation may be missing. The rotation
/// is kept untyped since producers disagree on its shape; only id and position are
/// required.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCamera {
    pub id: String,
    pub coordinates: Vec<f64>,
    #[serde(default)]
    pub rotation: Option<Value>,
}

/// A 4-component quaternion, or the identity for anything else
fn quaternion(id: &str, rotation: Option<&Value>) -> [f64; 4] {
    let Some(rotation) = rotation.filter(|r| !r.is_null()) else {
        return IDENTITY_ROTATION;
    };

    let components: Option<Vec<f64>> = rotation
        .as_array()
        .and_then(|values| values.iter().map(Value::as_f64).collect());

    match components.as_deref() {
        Some(&[x, y, z, w]) => [x, y, z, w],
        _ => {
            tracing::warn!(
                "Camera {} has a rotation that is not a quaternion ({}), using identity",
                id,
                rotation
            );
            IDENTITY_ROTATION
        }
    }
}

/// A normalized camera pose
#[derive(Clone, Debug, PartialEq)]
pub struct CameraRecord {
    /// Camera (and image) identifier
    pub id: String,
    /// Position in GeoJSON order: x = longitude, y = latitude
    pub coordinates: Coord<f64>,
    /// Elevation, the third raw coordinate component
    pub elevation: f64,
    /// Orientation quaternion, identity when the raw rotation is not one
    pub rotation: [f64; 4],
    /// Unix epoch seconds, when shot metadata provides it
    pub capture_time: Option<f64>,
}

impl CameraRecord {
    /// Build a normalized record from a raw camera, or `None` if it lacks a position.
    pub(crate) fn from_raw(raw: RawCamera, capture_time: Option<f64>) -> Option<Self> {
        let (lat, lon) = match raw.coordinates.as_slice() {
            [lat, lon, ..] => (*lat, *lon),
            _ => return None,
        };
        let elevation = raw.coordinates.get(2).copied().unwrap_or(0.0);
        let rotation = quaternion(&raw.id, raw.rotation.as_ref());

        Some(Self {
            coordinates: utils::swap_coordinate_order([lat, lon, elevation]),
            id: raw.id,
            elevation,
            rotation,
            capture_time,
        })
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.coordinates.x
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.coordinates.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawCamera {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_raw_swaps_and_keeps_elevation() {
        let camera = CameraRecord::from_raw(
            raw(json!({"id": "img1", "coordinates": [47.671, -122.274, 14.3], "rotation": [0.1, 0.2, 0.3, 0.9]})),
            Some(1746394518.0),
        )
        .unwrap();

        assert_eq!(camera.lon(), -122.274);
        assert_eq!(camera.lat(), 47.671);
        assert_eq!(camera.elevation, 14.3);
        assert_eq!(camera.rotation, [0.1, 0.2, 0.3, 0.9]);
        assert_eq!(camera.capture_time, Some(1746394518.0));
    }

    #[test]
    fn test_missing_elevation_and_rotation_default() {
        let camera =
            CameraRecord::from_raw(raw(json!({"id": "a", "coordinates": [1.0, 2.0]})), None).unwrap();
        assert_eq!(camera.elevation, 0.0);
        assert_eq!(camera.rotation, IDENTITY_ROTATION);
    }

    #[test]
    fn test_non_quaternion_rotation_falls_back_to_identity() {
        for rotation in [json!([0.1, 0.2, 0.3]), json!(null), json!("x"), json!([0, 0, "a", 1])] {
            let camera = CameraRecord::from_raw(
                raw(json!({"id": "a", "coordinates": [1.0, 2.0, 3.0], "rotation": rotation})),
                None,
            )
            .unwrap();
            assert_eq!(camera.rotation, IDENTITY_ROTATION);
            assert_eq!(camera.lon(), 2.0);
        }
    }

    #[test]
    fn test_short_coordinates_rejected() {
        assert!(CameraRecord::from_raw(raw(json!({"id": "a", "coordinates": [1.0]})), None).is_none());
    }
}
