//! Boundary policy loading.
//!
//! The default campus policy is embedded at compile time. Deployments can
//! point `GEOFENCE_POLICY` at another TOML file and `GEOFENCE_BOUNDARY` at a
//! `GeoJSON` polygon to replace just the ring.

use std::path::Path;

use geojson::GeoJson;
use runner_geofence_models::{GeoPoint, Polygon};
use serde::{Deserialize, Serialize};

use crate::GeofenceError;

/// Env var naming a policy TOML file that replaces the embedded one.
pub const POLICY_PATH_ENV: &str = "GEOFENCE_POLICY";

/// Env var naming a `GeoJSON` file whose polygon replaces the boundary.
pub const BOUNDARY_PATH_ENV: &str = "GEOFENCE_BOUNDARY";

const EMBEDDED_POLICY: &str = include_str!("../policies/campus.toml");

const fn default_use_polygon() -> bool {
    true
}

/// Immutable geofence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPolicy {
    /// Short label used in logs and the policy endpoint.
    pub name: String,
    /// Radius around the centroid used by the fast radius-only check.
    pub client_radius_meters: f64,
    /// Slack added to the polygon's approximate radius to absorb GPS noise.
    pub polygon_buffer_meters: f64,
    /// Whether callers that don't choose a method get polygon validation.
    #[serde(default = "default_use_polygon")]
    pub use_polygon: bool,
    /// Campus ring as `[longitude, latitude]` pairs.
    pub boundary: Polygon,
}

impl BoundaryPolicy {
    /// Parses and validates the policy compiled into the binary.
    ///
    /// # Errors
    ///
    /// * If the embedded TOML fails to parse or validate
    pub fn embedded() -> Result<Self, GeofenceError> {
        Self::from_toml_str(EMBEDDED_POLICY)
    }

    /// Parses and validates a policy from TOML text.
    ///
    /// # Errors
    ///
    /// * If the TOML is malformed or missing fields
    /// * If the policy fails [`BoundaryPolicy::validate`]
    pub fn from_toml_str(s: &str) -> Result<Self, GeofenceError> {
        let policy: Self = toml::de::from_str(s)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reads a policy TOML file.
    ///
    /// # Errors
    ///
    /// * If the file can't be read
    /// * If its contents fail [`BoundaryPolicy::from_toml_str`]
    pub fn from_path(path: &Path) -> Result<Self, GeofenceError> {
        let contents = read_file(path)?;
        Self::from_toml_str(&contents)
    }

    /// Replaces the boundary with the exterior ring of a `GeoJSON` polygon.
    ///
    /// Accepts a bare `Polygon` geometry, a `Feature` wrapping one, a
    /// single-member `MultiPolygon`, or a `FeatureCollection` whose first
    /// feature is one of those.
    ///
    /// # Errors
    ///
    /// * If the text isn't valid `GeoJSON`
    /// * If it doesn't contain exactly one polygon
    /// * If the resulting policy fails validation
    pub fn with_geojson_boundary(mut self, geojson_str: &str) -> Result<Self, GeofenceError> {
        self.boundary = parse_geojson_ring(geojson_str)?;
        self.validate()?;
        Ok(self)
    }

    /// Resolves the active policy: an explicit policy file or the embedded
    /// default, optionally with its boundary replaced from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// * If either file can't be read or parsed
    /// * If the resulting policy fails validation
    pub fn load(
        policy_path: Option<&Path>,
        boundary_path: Option<&Path>,
    ) -> Result<Self, GeofenceError> {
        let policy = match policy_path {
            Some(path) => {
                log::info!("Loading geofence policy from {}", path.display());
                Self::from_path(path)?
            }
            None => Self::embedded()?,
        };

        match boundary_path {
            Some(path) => {
                log::info!("Loading geofence boundary from {}", path.display());
                policy.with_geojson_boundary(&read_file(path)?)
            }
            None => Ok(policy),
        }
    }

    /// [`BoundaryPolicy::load`] with paths taken from the
    /// `GEOFENCE_POLICY` and `GEOFENCE_BOUNDARY` environment variables.
    ///
    /// # Errors
    ///
    /// * See [`BoundaryPolicy::load`]
    pub fn from_env() -> Result<Self, GeofenceError> {
        let policy_path = std::env::var(POLICY_PATH_ENV).ok();
        let boundary_path = std::env::var(BOUNDARY_PATH_ENV).ok();
        Self::load(
            policy_path.as_deref().map(Path::new),
            boundary_path.as_deref().map(Path::new),
        )
    }

    /// Checks that the policy can back a [`crate::Geofence`].
    ///
    /// # Errors
    ///
    /// * If either distance is negative or not finite
    /// * If any vertex is not a valid coordinate
    /// * If the ring has fewer than 3 vertices
    pub fn validate(&self) -> Result<(), GeofenceError> {
        for (field, value) in [
            ("client_radius_meters", self.client_radius_meters),
            ("polygon_buffer_meters", self.polygon_buffer_meters),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GeofenceError::invalid_policy(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
        }

        for (index, &[lng, lat]) in self.boundary.vertices().iter().enumerate() {
            GeoPoint::new(lat, lng).map_err(|e| {
                GeofenceError::invalid_policy(format!("boundary vertex {index}: {e}"))
            })?;
        }

        if self.boundary.is_degenerate() {
            return Err(GeofenceError::invalid_policy(format!(
                "boundary needs at least 3 distinct vertices, got {}",
                self.boundary.len()
            )));
        }

        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String, GeofenceError> {
    std::fs::read_to_string(path).map_err(|source| GeofenceError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_geojson_ring(geojson_str: &str) -> Result<Polygon, GeofenceError> {
    let geometry = match geojson_str.parse::<GeoJson>()? {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .next()
            .and_then(|feature| feature.geometry),
    }
    .ok_or_else(|| GeofenceError::invalid_policy("GeoJSON boundary has no geometry"))?;

    let polygon = match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::Polygon(polygon) => polygon,
        geo::Geometry::MultiPolygon(multi) if multi.0.len() == 1 => multi
            .0
            .into_iter()
            .next()
            .ok_or_else(|| GeofenceError::invalid_policy("GeoJSON MultiPolygon is empty"))?,
        _ => {
            return Err(GeofenceError::invalid_policy(
                "GeoJSON boundary must be a single polygon",
            ));
        }
    };

    if !polygon.interiors().is_empty() {
        log::warn!("Ignoring {} interior ring(s) in GeoJSON boundary", polygon.interiors().len());
    }

    Ok(Polygon::new(
        polygon
            .exterior()
            .coords()
            .map(|coord| [coord.x, coord.y])
            .collect(),
    ))
}
