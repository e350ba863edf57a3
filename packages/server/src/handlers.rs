//! HTTP handler functions for the runner geofence API.

use actix_web::{HttpResponse, web};
use runner_geofence_models::{Candidate, GeoPoint, ValidationMethod};
use runner_geofence_server_models::{
    ApiAvailabilityRequest, ApiError, ApiFilterRequest, ApiFilterResponse, ApiHealth,
    ApiPolicySummary, ApiValidateRequest, CoordinateValue,
};

use crate::{AppState, HandlerError};

/// JSON extractor config that turns body parse failures into the same
/// `400` shape the handlers use.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        HandlerError::validation("Invalid request body", err.to_string()).into()
    })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fallback for non-`POST` requests to `POST`-only resources.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ApiError {
        error: "Method not allowed".to_string(),
        details: None,
    })
}

/// `POST /api/runner-availability`
///
/// Decides whether a runner may go available at the reported location
/// using polygon validation. Both outcomes are `200`.
pub async fn runner_availability(
    state: web::Data<AppState>,
    body: web::Json<ApiAvailabilityRequest>,
) -> Result<HttpResponse, HandlerError> {
    let request = body.into_inner();

    let runner_id = request
        .runner_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| HandlerError::validation("Missing runner_id", "runner_id is required"))?;
    let point = parse_point(request.latitude.as_ref(), request.longitude.as_ref())?;

    let decision = state
        .geofence()?
        .can_be_available(Some(&point), ValidationMethod::Polygon);

    if decision.allowed {
        log::info!("Runner {runner_id} may go available");
    } else {
        log::info!(
            "Runner {runner_id} denied availability: {}",
            decision.reason.as_deref().unwrap_or_default()
        );
    }

    Ok(HttpResponse::Ok().json(decision))
}

/// `POST /api/geofence/validate`
///
/// Returns the raw validation result, including the centroid distance.
pub async fn validate(
    state: web::Data<AppState>,
    body: web::Json<ApiValidateRequest>,
) -> Result<HttpResponse, HandlerError> {
    let request = body.into_inner();
    let point = parse_point(request.latitude.as_ref(), request.longitude.as_ref())?;

    let geofence = state.geofence()?;
    let method = request
        .method
        .unwrap_or_else(|| geofence.default_method());

    Ok(HttpResponse::Ok().json(geofence.validate_location(&point, method)))
}

/// `POST /api/geofence/filter`
///
/// Returns the ids of candidates allowed by the geofence, in input order.
/// Candidates with missing or invalid coordinates are left out.
pub async fn filter(
    state: web::Data<AppState>,
    body: web::Json<ApiFilterRequest>,
) -> Result<HttpResponse, HandlerError> {
    let request = body.into_inner();

    let geofence = state.geofence()?;
    let method = request
        .method
        .unwrap_or_else(|| geofence.default_method());

    let candidates: Vec<Candidate<String>> = request
        .candidates
        .into_iter()
        .map(|c| {
            Candidate::from_raw(
                c.id,
                c.latitude.as_ref().and_then(CoordinateValue::as_finite),
                c.longitude.as_ref().and_then(CoordinateValue::as_finite),
            )
        })
        .collect();

    let ids = geofence.filter_by_geofence(&candidates, method);
    log::debug!("Geofence filter kept {} of {} candidates", ids.len(), candidates.len());

    Ok(HttpResponse::Ok().json(ApiFilterResponse { ids }))
}

/// `GET /api/geofence/policy`
pub async fn policy(state: web::Data<AppState>) -> Result<HttpResponse, HandlerError> {
    let geofence = state.geofence()?;
    let policy = geofence.policy();

    Ok(HttpResponse::Ok().json(ApiPolicySummary {
        name: policy.name.clone(),
        centroid: geofence.centroid(),
        approx_radius_meters: geofence.approx_radius_meters(),
        polygon_buffer_meters: policy.polygon_buffer_meters,
        client_radius_meters: policy.client_radius_meters,
        vertex_count: policy.boundary.len(),
        default_method: geofence.default_method(),
    }))
}

/// Parses request coordinates into a [`GeoPoint`], rejecting anything
/// missing, non-numeric, non-finite, or out of range.
fn parse_point(
    latitude: Option<&CoordinateValue>,
    longitude: Option<&CoordinateValue>,
) -> Result<GeoPoint, HandlerError> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(HandlerError::validation(
            "Missing coordinates",
            "latitude and longitude are required",
        ));
    };

    let (Some(lat), Some(lng)) = (latitude.as_finite(), longitude.as_finite()) else {
        return Err(HandlerError::validation(
            "Invalid coordinates",
            "latitude and longitude must be finite numbers",
        ));
    };

    GeoPoint::new(lat, lng).map_err(|e| HandlerError::validation("Invalid coordinates", e.to_string()))
}
