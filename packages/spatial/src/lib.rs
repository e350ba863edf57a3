#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stateless geometry primitives used by the geofence.
//!
//! Distances are great-circle (haversine) on a sphere of radius
//! [`EARTH_RADIUS_METERS`]. Polygon containment is a planar even-odd ray
//! cast in degree space with `x = longitude, y = latitude`, which is fine at
//! campus scale but not across the antimeridian or near the poles.

use runner_geofence_models::{GeoError, GeoPoint, Polygon};

/// Mean Earth radius used by [`distance_meters`].
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (haversine).
///
/// Symmetric, non-negative, and zero for identical points.
#[must_use]
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lat = lat_b - lat_a;
    let d_lng = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `h` a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Whether `point` is within `radius_meters` of `center`, boundary
/// inclusive.
#[must_use]
pub fn point_in_radius(point: &GeoPoint, center: &GeoPoint, radius_meters: f64) -> bool {
    distance_meters(point, center) <= radius_meters
}

/// Even-odd ray-casting containment test.
///
/// Casts a ray from the point towards increasing longitude and counts edge
/// crossings. Degenerate rings (fewer than 3 vertices) contain nothing.
///
/// Points lying exactly on an edge or vertex may be reported either inside
/// or outside; callers that care about the boundary should apply a
/// tolerance instead of relying on this.
#[must_use]
pub fn point_in_polygon(point: &GeoPoint, polygon: &Polygon) -> bool {
    if polygon.is_degenerate() {
        return false;
    }

    let [x, y] = point.to_lng_lat();
    let vertices = polygon.vertices();
    let mut inside = false;
    let mut j = vertices.len() - 1;

    for (i, &[xi, yi]) in vertices.iter().enumerate() {
        let [xj, yj] = vertices[j];

        if (yi > y) != (yj > y) {
            let crossing_x = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < crossing_x {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

/// Arithmetic mean of the polygon's vertices.
///
/// This is a vertex average, not an area-weighted centroid. It is only
/// used as an anchor for tolerance math.
///
/// # Errors
///
/// Returns [`GeoError::EmptyPolygon`] if the polygon has no vertices, or a
/// coordinate error if the vertices themselves are out of range.
pub fn polygon_centroid(polygon: &Polygon) -> Result<GeoPoint, GeoError> {
    if polygon.is_empty() {
        return Err(GeoError::EmptyPolygon);
    }

    let (sum_lng, sum_lat) = polygon
        .vertices()
        .iter()
        .fold((0.0, 0.0), |(lng, lat), [v_lng, v_lat]| {
            (lng + v_lng, lat + v_lat)
        });

    #[allow(clippy::cast_precision_loss)]
    let count = polygon.len() as f64;

    GeoPoint::new(sum_lat / count, sum_lng / count)
}

/// Largest distance from `center` to any polygon vertex, in meters.
///
/// A coarse over-estimate of the polygon's "radius". Vertices that are not
/// valid coordinates are skipped; an empty polygon yields `0.0`.
#[must_use]
pub fn max_distance_from_center(center: &GeoPoint, polygon: &Polygon) -> f64 {
    polygon
        .vertices()
        .iter()
        .filter_map(|&[lng, lat]| GeoPoint::new(lat, lng).ok())
        .map(|vertex| distance_meters(center, &vertex))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    /// 2 degrees of longitude wide, 0.2 degrees of latitude tall. Swapping
    /// axes anywhere in the crossing test changes the answer for points in
    /// its east and west ends.
    fn wide_rectangle() -> Polygon {
        Polygon::new(vec![
            [10.0, 50.0],
            [12.0, 50.0],
            [12.0, 50.2],
            [10.0, 50.2],
            [10.0, 50.0],
        ])
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(7.09, 125.607);
        let b = point(-33.8688, 151.2093);
        assert!((distance_meters(&a, &b) - distance_meters(&b, &a)).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_to_self_is_zero() {
        for p in [point(0.0, 0.0), point(7.09, 125.607), point(-89.9, -179.9)] {
            assert!(distance_meters(&p, &p).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn distance_matches_known_value() {
        // One degree of latitude on a 6,371 km sphere.
        let d = distance_meters(&point(0.0, 0.0), &point(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 0.1, "got {d}");
    }

    #[test]
    fn distance_increases_with_separation() {
        let origin = point(7.09, 125.607);
        let mut previous = 0.0;
        for step in 1..=170 {
            let lat = f64::from(step).mul_add(0.5, 7.09);
            if lat > 90.0 {
                break;
            }
            let d = distance_meters(&origin, &point(lat, 125.607));
            assert!(d > previous, "distance did not grow at step {step}");
            previous = d;
        }
    }

    #[test]
    fn antipodal_distance_is_finite() {
        let d = distance_meters(&point(0.0, 0.0), &point(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn radius_is_boundary_inclusive() {
        let center = point(0.0, 0.0);
        let edge = point(1.0, 0.0);
        let d = distance_meters(&center, &edge);
        assert!(point_in_radius(&edge, &center, d));
        assert!(!point_in_radius(&edge, &center, d - 0.001));
    }

    #[test]
    fn polygon_contains_interior_point() {
        assert!(point_in_polygon(&point(50.1, 11.0), &wide_rectangle()));
    }

    #[test]
    fn polygon_axis_order_regression() {
        let polygon = wide_rectangle();
        // Far east and west ends are inside.
        assert!(point_in_polygon(&point(50.1, 10.1), &polygon));
        assert!(point_in_polygon(&point(50.1, 11.9), &polygon));
        // Swapped lat/lng of an interior point must not be inside.
        assert!(!point_in_polygon(&point(11.0, 50.1), &polygon));
        // Inside the longitude span but north of the latitude span.
        assert!(!point_in_polygon(&point(50.5, 11.0), &polygon));
        // Inside the latitude span but east of the longitude span.
        assert!(!point_in_polygon(&point(50.1, 12.5), &polygon));
    }

    #[test]
    fn polygon_concave_notch_is_outside() {
        // A "U" shape opening to the north.
        let polygon = Polygon::new(vec![
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0],
        ]);
        assert!(!point_in_polygon(&point(2.0, 1.5), &polygon));
        assert!(point_in_polygon(&point(2.0, 0.5), &polygon));
        assert!(point_in_polygon(&point(0.5, 0.5), &polygon));
    }

    #[test]
    fn polygon_agrees_with_geo_contains() {
        use geo::Contains as _;

        let polygon = Polygon::new(vec![
            [125.600, 7.080],
            [125.615, 7.083],
            [125.618, 7.095],
            [125.607, 7.102],
            [125.596, 7.094],
        ]);
        let reference = geo::Polygon::new(
            geo::LineString::from(
                polygon
                    .vertices()
                    .iter()
                    .map(|&[x, y]| (x, y))
                    .collect::<Vec<_>>(),
            ),
            vec![],
        );

        for i in 0..20 {
            for k in 0..20 {
                let lng = f64::from(i).mul_add(0.0013, 125.592);
                let lat = f64::from(k).mul_add(0.0013, 7.076);
                let ours = point_in_polygon(&point(lat, lng), &polygon);
                let theirs = reference.contains(&geo::Point::new(lng, lat));
                assert_eq!(ours, theirs, "disagreement at ({lat}, {lng})");
            }
        }
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let two = Polygon::new(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert!(!point_in_polygon(&point(0.5, 0.5), &two));
        assert!(!point_in_polygon(&point(0.0, 0.0), &Polygon::new(Vec::new())));
    }

    #[test]
    fn centroid_is_vertex_mean() {
        let centroid = polygon_centroid(&wide_rectangle()).unwrap();
        assert!((centroid.latitude() - 50.1).abs() < 1e-12);
        assert!((centroid.longitude() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_empty_polygon_fails() {
        assert_eq!(
            polygon_centroid(&Polygon::new(Vec::new())),
            Err(GeoError::EmptyPolygon)
        );
    }

    #[test]
    fn max_distance_picks_farthest_vertex() {
        let polygon = Polygon::new(vec![[0.0, 0.0], [0.0, 1.0], [0.0, 2.0]]);
        let center = point(0.0, 0.0);
        let expected = distance_meters(&center, &point(2.0, 0.0));
        assert!((max_distance_from_center(&center, &polygon) - expected).abs() < 1e-6);
        assert!(max_distance_from_center(&center, &Polygon::new(Vec::new())).abs() < f64::EPSILON);
    }
}
