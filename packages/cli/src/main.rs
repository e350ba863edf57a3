#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for runner geofence checks.
//!
//! Runs the same decisions as the API server against the embedded campus
//! policy, or against a policy/boundary given with `--policy` and
//! `--boundary` (or the `GEOFENCE_POLICY` / `GEOFENCE_BOUNDARY` env vars).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use runner_geofence::policy::{BOUNDARY_PATH_ENV, POLICY_PATH_ENV};
use runner_geofence::{BoundaryPolicy, Geofence};
use runner_geofence_models::{Candidate, GeoPoint, ValidationMethod};
use runner_geofence_server_models::{ApiCandidate, CoordinateValue};

#[derive(Parser)]
#[command(name = "runner_geofence", about = "Campus geofence checks for runners")]
struct Cli {
    /// Policy TOML file (defaults to the embedded campus policy)
    #[arg(long, global = true, env = POLICY_PATH_ENV)]
    policy: Option<PathBuf>,
    /// `GeoJSON` file whose polygon replaces the policy boundary
    #[arg(long, global = true, env = BOUNDARY_PATH_ENV)]
    boundary: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Location {
    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,
    /// Use the radius-only check instead of the polygon
    #[arg(long)]
    radius: bool,
}

impl Location {
    fn point(&self) -> Result<GeoPoint, Box<dyn std::error::Error>> {
        Ok(GeoPoint::new(self.lat, self.lng)?)
    }

    const fn method(&self) -> ValidationMethod {
        ValidationMethod::from_use_polygon(!self.radius)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a runner at a location may go available
    Check {
        #[command(flatten)]
        location: Location,
    },
    /// Show the raw validation result for a location
    Validate {
        #[command(flatten)]
        location: Location,
    },
    /// Print the ids of allowed candidates from a JSON file of
    /// `{ "id", "latitude", "longitude" }` objects
    Filter {
        /// Path to the candidates JSON array
        #[arg(long)]
        input: PathBuf,
        /// Use the radius-only check instead of the polygon
        #[arg(long)]
        radius: bool,
    },
    /// Print the active policy and its derived values
    Policy,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let policy = BoundaryPolicy::load(cli.policy.as_deref(), cli.boundary.as_deref())?;
    let geofence = Geofence::new(policy)?;

    match cli.command {
        Commands::Check { location } => {
            let point = location.point()?;
            let decision = geofence.can_be_available(Some(&point), location.method());
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Commands::Validate { location } => {
            let point = location.point()?;
            let result = geofence.validate_location(&point, location.method());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Filter { input, radius } => {
            let contents = std::fs::read_to_string(&input)?;
            let raw: Vec<ApiCandidate> = serde_json::from_str(&contents)?;
            log::info!("Filtering {} candidates from {}", raw.len(), input.display());

            let candidates: Vec<Candidate<String>> = raw
                .into_iter()
                .map(|c| {
                    Candidate::from_raw(
                        c.id,
                        c.latitude.as_ref().and_then(CoordinateValue::as_finite),
                        c.longitude.as_ref().and_then(CoordinateValue::as_finite),
                    )
                })
                .collect();

            let method = ValidationMethod::from_use_polygon(!radius);
            for id in geofence.filter_by_geofence(&candidates, method) {
                println!("{id}");
            }
        }
        Commands::Policy => {
            let policy = geofence.policy();
            let centroid = geofence.centroid();
            println!("Name:            {}", policy.name);
            println!("Vertices:        {}", policy.boundary.len());
            println!(
                "Centroid:        {:.6}, {:.6}",
                centroid.latitude(),
                centroid.longitude()
            );
            println!("Approx radius:   {:.1}m", geofence.approx_radius_meters());
            println!("Buffer:          {:.1}m", policy.polygon_buffer_meters);
            println!("Tolerance:       {:.1}m", geofence.tolerance_meters());
            println!("Client radius:   {:.1}m", policy.client_radius_meters);
            println!("Default method:  {}", geofence.default_method());
        }
    }

    Ok(())
}
