#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate, polygon, and decision types for the runner geofence.
//!
//! Points are always `(latitude, longitude)`. Polygon rings are always
//! stored as `[longitude, latitude]` pairs, matching `GeoJSON`, so that
//! anything polygon-related reads as `x = longitude, y = latitude`.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors raised when constructing geometry values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// A coordinate was `NaN` or infinite.
    #[error("{axis} must be a finite number, got {value}")]
    NonFinite {
        /// Which axis was invalid (`latitude` or `longitude`).
        axis: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A coordinate was finite but outside its valid range.
    #[error("{axis} {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Which axis was invalid (`latitude` or `longitude`).
        axis: &'static str,
        /// The rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// An operation that needs at least one vertex got an empty polygon.
    #[error("polygon has no vertices")]
    EmptyPolygon,
}

fn check_axis(axis: &'static str, value: f64, limit: f64) -> Result<f64, GeoError> {
    if !value.is_finite() {
        return Err(GeoError::NonFinite { axis, value });
    }
    if !(-limit..=limit).contains(&value) {
        return Err(GeoError::OutOfRange {
            axis,
            value,
            min: -limit,
            max: limit,
        });
    }
    Ok(value)
}

/// A validated WGS84 coordinate in degrees.
///
/// Both values are guaranteed finite and in range, so geometry code never
/// has to re-check them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint", rename_all = "camelCase")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::NonFinite`] for `NaN`/infinite values and
    /// [`GeoError::OutOfRange`] when latitude is outside `[-90, 90]` or
    /// longitude is outside `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        Ok(Self {
            latitude: check_axis("latitude", latitude, 90.0)?,
            longitude: check_axis("longitude", longitude, 180.0)?,
        })
    }

    /// Builds a point from optional raw coordinates. Missing or invalid
    /// values yield `None`, which callers treat as "location not available".
    #[must_use]
    pub fn from_optional(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Self::new(latitude?, longitude?).ok()
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns this point as a `[longitude, latitude]` pair, the order used
    /// by polygon rings.
    #[must_use]
    pub const fn to_lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

/// A closed ring of `[longitude, latitude]` vertices.
///
/// A duplicated closing vertex is dropped on construction, so
/// [`Polygon::vertices`] always holds each corner once. Construction never
/// fails; a ring with fewer than 3 vertices is simply degenerate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct Polygon {
    vertices: Vec<[f64; 2]>,
}

impl Polygon {
    /// Creates a polygon from a `[longitude, latitude]` ring, stripping a
    /// duplicate closing vertex if present.
    #[must_use]
    pub fn new(mut ring: Vec<[f64; 2]>) -> Self {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        Self { vertices: ring }
    }

    /// The ring's vertices as `[longitude, latitude]` pairs, without the
    /// closing duplicate.
    #[must_use]
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    /// Number of distinct ring vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the ring has no vertices at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether the ring has fewer than 3 vertices and therefore encloses
    /// no area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }
}

impl From<Vec<[f64; 2]>> for Polygon {
    fn from(ring: Vec<[f64; 2]>) -> Self {
        Self::new(ring)
    }
}

impl From<Polygon> for Vec<[f64; 2]> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

/// Which containment strategy decided a [`ValidationResult`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValidationMethod {
    /// Exact polygon containment with a centroid-distance buffer.
    #[default]
    Polygon,
    /// Plain radius around the polygon centroid.
    Radius,
}

impl ValidationMethod {
    /// Maps the legacy `use_polygon` flag onto a method.
    #[must_use]
    pub const fn from_use_polygon(use_polygon: bool) -> Self {
        if use_polygon {
            Self::Polygon
        } else {
            Self::Radius
        }
    }
}

/// Outcome of a single location validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the point satisfied the chosen method.
    pub is_valid: bool,
    /// The method that decided validity.
    pub method: ValidationMethod,
    /// Great-circle distance from the boundary centroid, reported for
    /// diagnostics regardless of method.
    pub center_distance_meters: f64,
}

/// Whether a runner at some location may go available or take work.
///
/// A negative decision is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDecision {
    /// Whether the action is allowed.
    pub allowed: bool,
    /// Human-readable reason when not allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AvailabilityDecision {
    /// Reason reported when no usable location was supplied.
    pub const LOCATION_UNAVAILABLE: &'static str = "Location not available";

    /// An affirmative decision.
    #[must_use]
    pub const fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// Rejection because the location is missing or unusable.
    #[must_use]
    pub fn location_unavailable() -> Self {
        Self {
            allowed: false,
            reason: Some(Self::LOCATION_UNAVAILABLE.to_string()),
        }
    }

    /// Rejection because the point lies outside the geofence. The distance
    /// is rounded to whole meters in the reason text.
    #[must_use]
    pub fn outside_geofence(center_distance_meters: f64) -> Self {
        Self {
            allowed: false,
            reason: Some(format!(
                "Location is outside geofence ({}m from center)",
                center_distance_meters.round()
            )),
        }
    }
}

/// An item to be filtered by location, e.g. a runner in an assignment pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate<Id> {
    /// Caller-defined identifier, returned for allowed candidates.
    pub id: Id,
    /// Last known location, if any.
    pub location: Option<GeoPoint>,
}

impl<Id> Candidate<Id> {
    /// Creates a candidate with a known location.
    #[must_use]
    pub const fn new(id: Id, location: Option<GeoPoint>) -> Self {
        Self { id, location }
    }

    /// Creates a candidate from raw coordinates. Missing or invalid values
    /// leave the candidate without a location.
    #[must_use]
    pub fn from_raw(id: Id, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            id,
            location: GeoPoint::from_optional(latitude, longitude),
        }
    }
}
