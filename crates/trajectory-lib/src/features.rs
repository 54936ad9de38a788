//! Camera sequence to GeoJSON point features for map rendering

use crate::CameraRecord;
use geo::Coord;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, feature::Id};

/// Properties read back from a camera point feature
#[derive(Clone, Debug, PartialEq)]
pub struct CameraFeature {
    pub id: String,
    pub index: usize,
    pub coordinates: Coord<f64>,
    pub elevation: f64,
    pub capture_time: Option<f64>,
    pub selected: bool,
}

impl CameraFeature {
    /// Read a feature produced by [`to_point_features`]. Returns `None` if it is not one.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let coordinates = match &feature.geometry.as_ref()?.value {
            geojson::Value::Point(position) if position.len() >= 2 => Coord {
                x: position[0],
                y: position[1],
            },
            _ => return None,
        };

        Some(Self {
            id: feature.property("id")?.as_str()?.to_string(),
            index: usize::try_from(feature.property("index")?.as_u64()?).ok()?,
            coordinates,
            elevation: feature.property("elevation")?.as_f64()?,
            capture_time: feature.property("capture_time").and_then(JsonValue::as_f64),
            selected: feature
                .property("selected")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        })
    }
}

fn point_feature(camera: &CameraRecord, index: usize, selected: bool) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), JsonValue::from(camera.id.as_str()));
    properties.insert("index".to_string(), JsonValue::from(index));
    properties.insert("elevation".to_string(), JsonValue::from(camera.elevation));
    properties.insert(
        "capture_time".to_string(),
        camera.capture_time.map_or(JsonValue::Null, JsonValue::from),
    );
    properties.insert("selected".to_string(), JsonValue::from(selected));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![
            camera.coordinates.x,
            camera.coordinates.y,
        ]))),
        id: Some(Id::String(camera.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// One point feature per camera, in sequence order.
///
/// `selected` marks the camera at that index; `None` or an out-of-range index marks
/// nothing.
pub fn to_point_features(cameras: &[CameraRecord], selected: Option<usize>) -> FeatureCollection {
    let features = cameras
        .iter()
        .enumerate()
        .map(|(index, camera)| point_feature(camera, index, selected == Some(index)))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
