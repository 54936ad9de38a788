//! Utility functions for coordinate conversions and bounding boxes

use geo::{Coord, Rect};

/// Convert a raw trajectory position `[lat, lon, elevation]` into a GeoJSON-ordered
/// coordinate.
///
/// # Returns
/// A `Coord<f64>` with x = longitude and y = latitude. Elevation is dropped; callers
/// carry it separately.
#[inline(always)]
pub fn swap_coordinate_order(raw: [f64; 3]) -> Coord<f64> {
    let [lat, lon, _elevation] = raw;
    Coord { x: lon, y: lat }
}

/// Compute the bounding box enclosing every point.
///
/// An empty input yields the degenerate box `[[0, 0], [0, 0]]`.
pub fn compute_bounds(points: &[Coord<f64>]) -> Rect<f64> {
    if points.is_empty() {
        return Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 });
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
}

/// Bounding box as `[[min_lon, min_lat], [max_lon, max_lat]]`
#[inline]
pub fn bounds_to_array(bounds: &Rect<f64>) -> [[f64; 2]; 2] {
    let min = bounds.min();
    let max = bounds.max();
    [[min.x, min.y], [max.x, max.y]]
}
