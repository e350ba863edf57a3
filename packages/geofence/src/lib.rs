#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Campus geofence decisions for runners.
//!
//! A [`Geofence`] is built once from a [`BoundaryPolicy`]; construction
//! computes the boundary centroid and approximate radius, which every later
//! decision reuses. All decisions are pure and synchronous, so a single
//! instance can be shared freely across threads.
//!
//! Polygon validation accepts a point that is inside the exact ring, or
//! within `approx radius + buffer` of the centroid. The second clause
//! tolerates GPS noise near the edge but over-tolerates around concave
//! sections and far corners of irregular boundaries.

pub mod policy;

use std::sync::LazyLock;

use runner_geofence_models::{
    AvailabilityDecision, Candidate, GeoError, GeoPoint, ValidationMethod, ValidationResult,
};
use runner_geofence_spatial::{
    distance_meters, max_distance_from_center, point_in_polygon, point_in_radius,
    polygon_centroid,
};

pub use policy::BoundaryPolicy;

/// Errors raised while loading a policy or building a [`Geofence`].
#[derive(Debug, thiserror::Error)]
pub enum GeofenceError {
    /// The policy parsed but its values are unusable.
    #[error("Invalid geofence policy: {message}")]
    InvalidPolicy {
        /// What was wrong with the policy.
        message: String,
    },

    /// Policy TOML failed to parse.
    #[error("Policy TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Boundary `GeoJSON` failed to parse or convert.
    #[error("Boundary GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A policy or boundary file couldn't be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file that couldn't be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Derived geometry couldn't be computed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeoError),
}

impl GeofenceError {
    pub(crate) fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }
}

/// A validated policy plus the derived values decisions depend on.
#[derive(Debug, Clone)]
pub struct Geofence {
    policy: BoundaryPolicy,
    centroid: GeoPoint,
    approx_radius_meters: f64,
}

impl Geofence {
    /// Validates the policy and precomputes the boundary centroid and
    /// approximate radius.
    ///
    /// # Errors
    ///
    /// * If the policy fails [`BoundaryPolicy::validate`]
    /// * If the centroid can't be computed
    pub fn new(policy: BoundaryPolicy) -> Result<Self, GeofenceError> {
        policy.validate()?;

        let centroid = polygon_centroid(&policy.boundary)?;
        let approx_radius_meters = max_distance_from_center(&centroid, &policy.boundary);

        log::info!(
            "Geofence '{}' ready: {} vertices, centroid ({:.6}, {:.6}), approx radius {:.1}m, buffer {:.1}m",
            policy.name,
            policy.boundary.len(),
            centroid.latitude(),
            centroid.longitude(),
            approx_radius_meters,
            policy.polygon_buffer_meters,
        );

        Ok(Self {
            policy,
            centroid,
            approx_radius_meters,
        })
    }

    /// The policy this geofence was built from.
    #[must_use]
    pub const fn policy(&self) -> &BoundaryPolicy {
        &self.policy
    }

    /// Vertex-average centroid of the boundary.
    #[must_use]
    pub const fn centroid(&self) -> GeoPoint {
        self.centroid
    }

    /// Distance from the centroid to the farthest boundary vertex.
    #[must_use]
    pub const fn approx_radius_meters(&self) -> f64 {
        self.approx_radius_meters
    }

    /// Centroid distance within which polygon validation always passes.
    #[must_use]
    pub fn tolerance_meters(&self) -> f64 {
        self.approx_radius_meters + self.policy.polygon_buffer_meters
    }

    /// The method used when callers don't pick one.
    #[must_use]
    pub const fn default_method(&self) -> ValidationMethod {
        ValidationMethod::from_use_polygon(self.policy.use_polygon)
    }

    /// Distance from `point` to the boundary centroid.
    #[must_use]
    pub fn center_distance_meters(&self, point: &GeoPoint) -> f64 {
        distance_meters(point, &self.centroid)
    }

    /// Polygon containment with the GPS buffer applied.
    #[must_use]
    pub fn is_within_polygon(&self, point: &GeoPoint) -> bool {
        point_in_polygon(point, &self.policy.boundary)
            || self.center_distance_meters(point) <= self.tolerance_meters()
    }

    /// Cheap radius check around the centroid. Meant for client-side
    /// pre-filtering, not authoritative decisions.
    #[must_use]
    pub fn is_within_radius(&self, point: &GeoPoint) -> bool {
        point_in_radius(point, &self.centroid, self.policy.client_radius_meters)
    }

    /// Validates `point` with the given method, always reporting the
    /// centroid distance.
    #[must_use]
    pub fn validate_location(&self, point: &GeoPoint, method: ValidationMethod) -> ValidationResult {
        let is_valid = match method {
            ValidationMethod::Polygon => self.is_within_polygon(point),
            ValidationMethod::Radius => self.is_within_radius(point),
        };

        ValidationResult {
            is_valid,
            method,
            center_distance_meters: self.center_distance_meters(point),
        }
    }

    /// Whether a runner at `location` may mark themselves available.
    #[must_use]
    pub fn can_be_available(
        &self,
        location: Option<&GeoPoint>,
        method: ValidationMethod,
    ) -> AvailabilityDecision {
        let Some(point) = location else {
            log::debug!("Availability denied: no location");
            return AvailabilityDecision::location_unavailable();
        };

        let result = self.validate_location(point, method);
        log::debug!(
            "Availability check at ({}, {}) via {}: valid={} distance={:.1}m",
            point.latitude(),
            point.longitude(),
            result.method,
            result.is_valid,
            result.center_distance_meters,
        );

        if result.is_valid {
            AvailabilityDecision::allowed()
        } else {
            AvailabilityDecision::outside_geofence(result.center_distance_meters)
        }
    }

    /// Whether a runner at `location` may be assigned work. Same rule as
    /// [`Geofence::can_be_available`].
    #[must_use]
    pub fn is_eligible_for_assignment(
        &self,
        location: Option<&GeoPoint>,
        method: ValidationMethod,
    ) -> AvailabilityDecision {
        self.can_be_available(location, method)
    }

    /// Ids of the candidates allowed by [`Geofence::can_be_available`], in
    /// input order. Candidates without a usable location are dropped.
    pub fn filter_by_geofence<'a, Id>(
        &self,
        candidates: impl IntoIterator<Item = &'a Candidate<Id>>,
        method: ValidationMethod,
    ) -> Vec<Id>
    where
        Id: Clone + 'a,
    {
        candidates
            .into_iter()
            .filter(|candidate| {
                self.can_be_available(candidate.location.as_ref(), method)
                    .allowed
            })
            .map(|candidate| candidate.id.clone())
            .collect()
    }
}

static DEFAULT_GEOFENCE: LazyLock<Geofence> = LazyLock::new(|| {
    BoundaryPolicy::embedded()
        .and_then(Geofence::new)
        .unwrap_or_else(|e| panic!("Embedded geofence policy is invalid: {e}"))
});

/// Process-wide geofence built from the embedded campus policy on first
/// use.
///
/// # Panics
///
/// Panics if the embedded policy fails to parse or validate. It is a
/// compile-time constant, so this is caught by the crate's tests.
#[must_use]
pub fn default_geofence() -> &'static Geofence {
    &DEFAULT_GEOFENCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use runner_geofence_models::Polygon;
    use runner_geofence_spatial::EARTH_RADIUS_METERS;

    const CENTER_LAT: f64 = 7.0900;
    const CENTER_LNG: f64 = 125.6070;
    const BUFFER_METERS: f64 = 50.0;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    /// Point `meters` due north of `origin`.
    fn north_of(origin: &GeoPoint, meters: f64) -> GeoPoint {
        let d_lat = (meters / EARTH_RADIUS_METERS).to_degrees();
        point(origin.latitude() + d_lat, origin.longitude())
    }

    /// 500m x 500m square centred on (7.0900, 125.6070).
    fn square_geofence() -> Geofence {
        let half = 250.0 / EARTH_RADIUS_METERS;
        let d_lat = half.to_degrees();
        let d_lng = (half / CENTER_LAT.to_radians().cos()).to_degrees();

        Geofence::new(BoundaryPolicy {
            name: "test-square".to_string(),
            client_radius_meters: 300.0,
            polygon_buffer_meters: BUFFER_METERS,
            use_polygon: true,
            boundary: Polygon::new(vec![
                [CENTER_LNG - d_lng, CENTER_LAT - d_lat],
                [CENTER_LNG + d_lng, CENTER_LAT - d_lat],
                [CENTER_LNG + d_lng, CENTER_LAT + d_lat],
                [CENTER_LNG - d_lng, CENTER_LAT + d_lat],
                [CENTER_LNG - d_lng, CENTER_LAT - d_lat],
            ]),
        })
        .unwrap()
    }

    #[test]
    fn centroid_is_inside() {
        let geofence = square_geofence();
        let centroid = geofence.centroid();
        assert!((centroid.latitude() - CENTER_LAT).abs() < 1e-9);
        assert!((centroid.longitude() - CENTER_LNG).abs() < 1e-9);
        assert!(geofence.is_within_polygon(&centroid));
        assert!(default_geofence().is_within_polygon(&default_geofence().centroid()));
    }

    #[test]
    fn approx_radius_reaches_corners() {
        let geofence = square_geofence();
        // Half-diagonal of a 500m square.
        assert!((geofence.approx_radius_meters() - 353.55).abs() < 1.0);
        assert!(
            (geofence.tolerance_meters() - geofence.approx_radius_meters() - BUFFER_METERS).abs()
                < 1e-9
        );
    }

    #[test]
    fn buffer_tolerates_points_just_outside_ring() {
        let geofence = square_geofence();
        let centroid = geofence.centroid();
        let tolerance = geofence.tolerance_meters();

        let just_inside = north_of(&centroid, tolerance - 1.0);
        assert!(!point_in_polygon(&just_inside, &geofence.policy().boundary));
        assert!(geofence.is_within_polygon(&just_inside));

        let just_outside = north_of(&centroid, tolerance + 1.0);
        assert!(!geofence.is_within_polygon(&just_outside));
    }

    #[test]
    fn radius_method_uses_client_radius() {
        let geofence = square_geofence();
        let centroid = geofence.centroid();

        let inside = north_of(&centroid, 299.0);
        let outside = north_of(&centroid, 301.0);
        assert!(geofence.is_within_radius(&inside));
        assert!(!geofence.is_within_radius(&outside));

        // 301m north is still within the polygon tolerance.
        assert!(geofence.is_within_polygon(&outside));
    }

    #[test]
    fn validate_location_reports_distance_for_both_methods() {
        let geofence = square_geofence();
        let target = north_of(&geofence.centroid(), 320.0);

        let by_polygon = geofence.validate_location(&target, ValidationMethod::Polygon);
        let by_radius = geofence.validate_location(&target, ValidationMethod::Radius);

        assert!(by_polygon.is_valid);
        assert_eq!(by_polygon.method, ValidationMethod::Polygon);
        assert!(!by_radius.is_valid);
        assert_eq!(by_radius.method, ValidationMethod::Radius);
        assert!((by_polygon.center_distance_meters - 320.0).abs() < 0.01);
        assert!(
            (by_polygon.center_distance_meters - by_radius.center_distance_meters).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn missing_location_is_not_available() {
        let decision = square_geofence().can_be_available(None, ValidationMethod::Polygon);
        assert_eq!(decision, AvailabilityDecision::location_unavailable());
        assert_eq!(decision.reason.as_deref(), Some("Location not available"));
    }

    #[test]
    fn center_is_available() {
        let geofence = square_geofence();
        let center = point(CENTER_LAT, CENTER_LNG);
        assert_eq!(
            geofence.can_be_available(Some(&center), ValidationMethod::Polygon),
            AvailabilityDecision::allowed()
        );
        assert_eq!(
            geofence.can_be_available(Some(&center), ValidationMethod::Radius),
            AvailabilityDecision::allowed()
        );
    }

    #[test]
    fn far_point_reports_rounded_distance() {
        let geofence = square_geofence();
        let far = north_of(&point(CENTER_LAT, CENTER_LNG), 10_000.0);
        let distance = geofence.center_distance_meters(&far);

        let decision = geofence.can_be_available(Some(&far), ValidationMethod::Polygon);
        assert!(!decision.allowed);
        let reason = decision.reason.unwrap();
        assert!(reason.contains(&format!("{}m", distance.round())), "{reason}");
        assert!(reason.contains("10000m"), "{reason}");
    }

    #[test]
    fn assignment_matches_availability() {
        let geofence = square_geofence();
        for meters in [0.0, 200.0, 350.0, 450.0, 5_000.0] {
            let target = north_of(&geofence.centroid(), meters);
            for method in [ValidationMethod::Polygon, ValidationMethod::Radius] {
                assert_eq!(
                    geofence.is_eligible_for_assignment(Some(&target), method),
                    geofence.can_be_available(Some(&target), method),
                );
            }
        }
    }

    #[test]
    fn filter_preserves_order_and_drops_rejects() {
        let geofence = square_geofence();
        let centroid = geofence.centroid();
        let candidates = vec![
            Candidate::new("a", Some(north_of(&centroid, 10.0))),
            Candidate::new("b", Some(north_of(&centroid, 5_000.0))),
            Candidate::from_raw("bad", Some(f64::NAN), Some(CENTER_LNG)),
            Candidate::new("missing", None),
            Candidate::new("c", Some(centroid)),
        ];

        assert_eq!(
            geofence.filter_by_geofence(&candidates, ValidationMethod::Polygon),
            vec!["a", "c"]
        );
    }

    #[test]
    fn new_rejects_invalid_policy() {
        let mut policy = square_geofence().policy().clone();
        policy.boundary = Polygon::new(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert!(matches!(
            Geofence::new(policy),
            Err(GeofenceError::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn default_geofence_uses_embedded_policy() {
        let geofence = default_geofence();
        assert_eq!(geofence.policy().name, "campus");
        assert_eq!(geofence.default_method(), ValidationMethod::Polygon);
        assert!(geofence.approx_radius_meters() > 0.0);
    }
}
