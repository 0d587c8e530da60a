//! Analysis report: `summary`, `charts` and `tables`.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::EngineConfig;
use crate::conflict::{Conflict, Severity};
use crate::hotspot::Hotspot;
use crate::models::Flight;
use crate::resolution::{ResolutionAction, ResolutionOutcome, Termination};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub charts: Charts,
    pub tables: Tables,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_flights: usize,
    /// Conflict episodes recorded over the whole run
    pub total_conflicts: usize,
    pub total_passengers: u64,
    pub total_hotspots: usize,
    pub rejected_records: usize,
    pub remaining_conflicts: usize,
    pub unresolved_conflicts: usize,
    pub iterations: usize,
    pub actions: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charts {
    pub conflicts_by_hour: Vec<HourCount>,
    pub severity_distribution: Vec<SeverityCount>,
    pub top_aircraft: Vec<AircraftCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourCount {
    /// UTC hour of day of closest approach
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftCount {
    pub acid: String,
    pub conflicts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub hotspots: Vec<Hotspot>,
    pub flights: Vec<FlightRow>,
    pub actions: Vec<ResolutionAction>,
    pub conflicts: Vec<ConflictRow>,
    pub rejected: Vec<Rejection>,
}

/// Final state of one flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRow {
    pub acid: String,
    pub departure: String,
    pub arrival: String,
    pub altitude: i32,
    pub speed: f64,
    pub passengers: u32,
    pub is_cargo: bool,
    /// Effective departure, delay included
    pub departure_time: DateTime<Utc>,
    pub delay_min: f64,
}

impl From<&Flight> for FlightRow {
    fn from(flight: &Flight) -> Self {
        Self {
            acid: flight.acid.clone(),
            departure: flight.departure.clone(),
            arrival: flight.arrival.clone(),
            altitude: flight.altitude_ft,
            speed: flight.speed_kts,
            passengers: flight.passengers,
            is_cargo: flight.is_cargo,
            departure_time: flight.effective_departure(),
            delay_min: flight.delay_min,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Open,
    Unresolvable,
}

/// A conflict still open at termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRow {
    #[serde(flatten)]
    pub conflict: Conflict,
    pub status: ConflictStatus,
}

/// An input record that was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Position in the input sequence
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acid: Option<String>,
    pub reason: String,
}

impl AnalysisReport {
    /// Aggregate a finished run. Performs no decisions of its own.
    pub fn assemble(
        config: &EngineConfig,
        outcome: &ResolutionOutcome,
        hotspots: Vec<Hotspot>,
        rejected: Vec<Rejection>,
    ) -> Self {
        let flights: Vec<FlightRow> = outcome.final_snapshot.flights().map(FlightRow::from).collect();
        let conflicts: Vec<ConflictRow> = outcome
            .remaining
            .iter()
            .map(|c| ConflictRow {
                status: if outcome.unresolvable.contains(&c.pair()) {
                    ConflictStatus::Unresolvable
                } else {
                    ConflictStatus::Open
                },
                conflict: c.clone(),
            })
            .collect();

        let summary = Summary {
            total_flights: flights.len(),
            total_conflicts: outcome.history.len(),
            total_passengers: flights.iter().map(|f| u64::from(f.passengers)).sum(),
            total_hotspots: hotspots.len(),
            rejected_records: rejected.len(),
            remaining_conflicts: conflicts.len(),
            unresolved_conflicts: conflicts
                .iter()
                .filter(|c| c.status == ConflictStatus::Unresolvable)
                .count(),
            iterations: outcome.iterations,
            actions: outcome.actions.len(),
            termination: outcome.termination,
        };

        let charts = Charts {
            conflicts_by_hour: conflicts_by_hour(&outcome.history),
            severity_distribution: severity_distribution(&outcome.history, config),
            top_aircraft: top_aircraft(&outcome.history, config.report.top_aircraft_limit),
        };

        Self {
            summary,
            charts,
            tables: Tables {
                hotspots,
                flights,
                actions: outcome.actions.clone(),
                conflicts,
                rejected,
            },
        }
    }
}

fn conflicts_by_hour(conflicts: &[Conflict]) -> Vec<HourCount> {
    let mut hours: BTreeMap<u32, usize> = BTreeMap::new();
    for conflict in conflicts {
        *hours.entry(conflict.closest_at.hour()).or_default() += 1;
    }
    hours
        .into_iter()
        .map(|(hour, count)| HourCount { hour, count })
        .collect()
}

fn severity_distribution(conflicts: &[Conflict], config: &EngineConfig) -> Vec<SeverityCount> {
    Severity::ALL
        .iter()
        .map(|severity| SeverityCount {
            name: severity.label(config),
            value: conflicts.iter().filter(|c| c.severity == *severity).count(),
        })
        .collect()
}

fn top_aircraft(conflicts: &[Conflict], limit: usize) -> Vec<AircraftCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for conflict in conflicts {
        *counts.entry(conflict.flight_a.as_str()).or_default() += 1;
        *counts.entry(conflict.flight_b.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<AircraftCount> = counts
        .into_iter()
        .map(|(acid, conflicts)| AircraftCount {
            acid: acid.to_string(),
            conflicts,
        })
        .collect();
    ranked.sort_by(|a, b| b.conflicts.cmp(&a.conflicts).then_with(|| a.acid.cmp(&b.acid)));
    ranked.truncate(limit);
    ranked
}
