#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for runner geofence checks.
//!
//! The main endpoint, `POST /api/runner-availability`, decides whether a
//! runner may go available at a reported location. A negative decision is
//! still a `200`; only malformed input (`400`) and policy failures (`500`)
//! produce error statuses. The geofence is built lazily once per process
//! and reused by every request.

mod error;
mod handlers;

use std::sync::OnceLock;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use runner_geofence::{BoundaryPolicy, Geofence, GeofenceError};

pub use error::HandlerError;

type GeofenceLoader = Box<dyn Fn() -> Result<Geofence, GeofenceError> + Send + Sync>;

/// Shared application state.
pub struct AppState {
    geofence: OnceLock<Result<Geofence, String>>,
    loader: Option<GeofenceLoader>,
}

impl AppState {
    /// State whose geofence is loaded on first use from the
    /// `GEOFENCE_POLICY` / `GEOFENCE_BOUNDARY` environment variables, or
    /// the embedded campus policy.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_loader(|| BoundaryPolicy::from_env().and_then(Geofence::new))
    }

    /// State with a custom geofence loader. The loader runs at most once.
    #[must_use]
    pub fn with_loader(
        loader: impl Fn() -> Result<Geofence, GeofenceError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            geofence: OnceLock::new(),
            loader: Some(Box::new(loader)),
        }
    }

    /// State with an already-built geofence.
    #[must_use]
    pub fn with_geofence(geofence: Geofence) -> Self {
        Self {
            geofence: OnceLock::from(Ok(geofence)),
            loader: None,
        }
    }

    /// Returns the geofence, loading it on first call. A load failure is
    /// cached and reported as an internal error on every call.
    ///
    /// # Errors
    ///
    /// * If the policy failed to load or validate
    pub fn geofence(&self) -> Result<&Geofence, HandlerError> {
        self.geofence
            .get_or_init(|| {
                let Some(load) = &self.loader else {
                    return Err("no geofence loader configured".to_string());
                };
                load().map_err(|e| {
                    log::error!("Failed to load geofence: {e}");
                    e.to_string()
                })
            })
            .as_ref()
            .map_err(|details| HandlerError::internal(details.clone()))
    }
}

/// Registers the API routes and the JSON extractor config on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::resource("/runner-availability")
                    .route(web::post().to(handlers::runner_availability))
                    .default_service(web::to(handlers::method_not_allowed)),
            )
            .service(
                web::scope("/geofence")
                    .route("/policy", web::get().to(handlers::policy))
                    .route("/validate", web::post().to(handlers::validate))
                    .route("/filter", web::post().to(handlers::filter)),
            ),
    );
}

/// Starts the runner geofence API server.
///
/// Binds to `BIND_ADDR`:`PORT` (default `127.0.0.1:8080`). The geofence
/// policy is loaded up front so problems show in the startup log, but a
/// bad policy doesn't stop the server; requests get a `500` instead.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let state = web::Data::new(AppState::from_env());
    match state.geofence() {
        Ok(geofence) => log::info!("Using geofence policy '{}'", geofence.policy().name),
        Err(e) => log::error!("Geofence unavailable, requests will fail: {e}"),
    }

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
