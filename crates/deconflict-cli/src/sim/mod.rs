//! Scenario generation for flight schedules.
//!
//! Produces engine input documents: geometric scenarios around a center
//! point with their own synthetic stations, or random schedules over the
//! built-in airports.

mod scenarios;

use deconflict_core::{FlightRecord, Station};
use serde::Serialize;

pub use scenarios::{
    create_converging_scenario, create_crossing_scenario, create_random_scenario,
    create_triangle_scenario,
};

/// A named flight schedule plus the stations it needs beyond the built-in
/// table.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    #[serde(skip)]
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stations: Vec<Station>,
    pub flights: Vec<FlightRecord>,
}

impl Scenario {
    /// The scenario as an `analyze` input document.
    pub fn to_document(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
