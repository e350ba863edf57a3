#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the runner geofence server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the core geofence types so the wire contract can evolve on its own.
//! The availability request uses `snake_case` field names
//! because existing mobile clients send them that way.

use runner_geofence_models::{GeoPoint, ValidationMethod};
use serde::{Deserialize, Serialize};

/// A coordinate as sent by clients: either a JSON number or a numeric
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    /// A JSON number.
    Number(f64),
    /// A string such as `"7.0901"`.
    Text(String),
}

impl CoordinateValue {
    /// Returns the value if it is (or parses to) a finite number.
    #[must_use]
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for CoordinateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Body of `POST /api/runner-availability`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiAvailabilityRequest {
    /// Runner requesting to go available.
    #[serde(default)]
    pub runner_id: Option<String>,
    /// Current latitude.
    #[serde(default)]
    pub latitude: Option<CoordinateValue>,
    /// Current longitude.
    #[serde(default)]
    pub longitude: Option<CoordinateValue>,
}

/// Body of `POST /api/geofence/validate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiValidateRequest {
    /// Latitude to check.
    #[serde(default)]
    pub latitude: Option<CoordinateValue>,
    /// Longitude to check.
    #[serde(default)]
    pub longitude: Option<CoordinateValue>,
    /// Method override; the policy default is used when absent.
    #[serde(default)]
    pub method: Option<ValidationMethod>,
}

/// A single entry in a filter request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCandidate {
    /// Caller-defined identifier.
    pub id: String,
    /// Last known latitude, if any.
    #[serde(default)]
    pub latitude: Option<CoordinateValue>,
    /// Last known longitude, if any.
    #[serde(default)]
    pub longitude: Option<CoordinateValue>,
}

/// Body of `POST /api/geofence/filter`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFilterRequest {
    /// Candidates to filter, in the order results should come back.
    pub candidates: Vec<ApiCandidate>,
    /// Method override; the policy default is used when absent.
    #[serde(default)]
    pub method: Option<ValidationMethod>,
}

/// Response of `POST /api/geofence/filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFilterResponse {
    /// Ids of allowed candidates, in input order.
    pub ids: Vec<String>,
}

/// Summary of the active geofence, returned by `GET /api/geofence/policy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPolicySummary {
    /// Policy name.
    pub name: String,
    /// Vertex-average centroid of the boundary.
    pub centroid: GeoPoint,
    /// Distance from the centroid to the farthest vertex.
    pub approx_radius_meters: f64,
    /// GPS buffer added to the approximate radius.
    pub polygon_buffer_meters: f64,
    /// Radius used by the radius-only method.
    pub client_radius_meters: f64,
    /// Number of boundary vertices.
    pub vertex_count: usize,
    /// Method used when requests don't specify one.
    pub default_method: ValidationMethod,
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Short error summary.
    pub error: String,
    /// Longer explanation, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}
