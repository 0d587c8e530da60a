//! Analysis entry point: ingestion, resolution, hotspots and the report.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::{ConflictBasis, EngineConfig};
use crate::error::{Result, ValidationError};
use crate::hotspot::HotspotAggregator;
use crate::models::{Flight, FlightRecord};
use crate::navdata::{NavDatabase, Station};
use crate::report::{AnalysisReport, Rejection};
use crate::resolution::{ResolutionOutcome, ResolutionScheduler, Snapshot};

/// Accepted input layouts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Records(Vec<Value>),
    Document {
        flights: Vec<Value>,
        #[serde(default)]
        stations: Vec<Station>,
    },
}

enum Entry {
    Record(FlightRecord),
    Malformed {
        acid: Option<String>,
        error: ValidationError,
    },
}

/// Result of validating an input record sequence.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Valid flights in input order
    pub flights: Vec<Flight>,
    pub rejected: Vec<Rejection>,
}

/// One configured engine. Each call to `analyze*` is an independent run.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    navdata: NavDatabase,
}

impl Engine {
    /// Fails if the configuration does not validate.
    pub fn new(config: EngineConfig, navdata: NavDatabase) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, navdata })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn navdata(&self) -> &NavDatabase {
        &self.navdata
    }

    /// Validate records against this engine's navigation data.
    pub fn ingest(&self, records: &[FlightRecord]) -> Ingested {
        ingest(
            records.iter().cloned().map(Entry::Record),
            &self.navdata,
        )
    }

    pub fn analyze(&self, records: &[FlightRecord]) -> AnalysisReport {
        let ingested = self.ingest(records);
        self.run(ingested, &self.navdata)
    }

    /// Analyze a JSON input document.
    ///
    /// Either a bare array of flight records or an object with `flights`
    /// and optional `stations`, which extend the navigation data for this
    /// run only. A record of the wrong shape is rejected on its own.
    pub fn analyze_json(&self, input: &str) -> Result<AnalysisReport> {
        let (values, stations) = match serde_json::from_str::<InputDocument>(input)? {
            InputDocument::Records(values) => (values, Vec::new()),
            InputDocument::Document { flights, stations } => (flights, stations),
        };

        let mut navdata = self.navdata.clone();
        if !stations.is_empty() {
            navdata.extend(stations)?;
        }

        let entries = values.into_iter().map(|value| {
            let acid = value
                .get("acid")
                .and_then(Value::as_str)
                .map(str::to_string);
            match serde_json::from_value::<FlightRecord>(value) {
                Ok(record) => Entry::Record(record),
                Err(e) => Entry::Malformed {
                    acid,
                    error: ValidationError::Malformed {
                        message: e.to_string(),
                    },
                },
            }
        });
        let ingested = ingest(entries, &navdata);
        Ok(self.run(ingested, &navdata))
    }

    /// Run the resolution loop on already validated flights.
    pub fn resolve(&self, flights: Vec<Flight>) -> ResolutionOutcome {
        ResolutionScheduler::new(&self.config).run(Snapshot::new(flights))
    }

    fn run(&self, ingested: Ingested, navdata: &NavDatabase) -> AnalysisReport {
        info!(
            "Analyzing {} flight(s), {} record(s) rejected",
            ingested.flights.len(),
            ingested.rejected.len()
        );
        let outcome = self.resolve(ingested.flights);

        let trajectories = outcome
            .final_snapshot
            .trajectories(self.config.route_geometry);
        let basis = match self.config.hotspot.conflict_basis {
            ConflictBasis::Remaining => &outcome.remaining,
            ConflictBasis::Cumulative => &outcome.history,
        };
        let hotspots =
            HotspotAggregator::new(&self.config.hotspot).aggregate(navdata, &trajectories, basis);

        AnalysisReport::assemble(&self.config, &outcome, hotspots, ingested.rejected)
    }
}

fn ingest(entries: impl IntoIterator<Item = Entry>, navdata: &NavDatabase) -> Ingested {
    let mut ingested = Ingested::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let result = match entry {
            Entry::Record(record) => record
                .validate(navdata)
                .and_then(|flight| {
                    if seen.insert(flight.acid.clone()) {
                        Ok(flight)
                    } else {
                        Err(ValidationError::DuplicateAcid {
                            acid: flight.acid,
                        })
                    }
                })
                .map_err(|error| (record.acid.clone(), error)),
            Entry::Malformed { acid, error } => Err((acid, error)),
        };

        match result {
            Ok(flight) => ingested.flights.push(flight),
            Err((acid, error)) => {
                warn!(
                    "Rejected record {} ({}): {}",
                    index,
                    acid.as_deref().unwrap_or("-"),
                    error
                );
                ingested.rejected.push(Rejection {
                    index,
                    acid,
                    reason: error.to_string(),
                });
            }
        }
    }
    ingested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default(), NavDatabase::builtin()).unwrap()
    }

    fn record(acid: &str, speed: f64) -> serde_json::Value {
        json!({
            "acid": acid,
            "departure": "CYYZ",
            "arrival": "CYUL",
            "altitude": 35000,
            "speed": speed,
            "passengers": 120,
            "departure_time": "2024-03-01T08:00:00Z"
        })
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.separation.horizontal_nm = -1.0;
        let err = Engine::new(config, NavDatabase::builtin()).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_duplicate_acid_rejects_later_record() {
        let records: Vec<FlightRecord> = [record("ACA1", 450.0), record("ACA1", 460.0)]
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        let ingested = engine().ingest(&records);
        assert_eq!(ingested.flights.len(), 1);
        assert_eq!(ingested.flights[0].speed_kts, 450.0);
        assert_eq!(ingested.rejected[0].index, 1);
        assert!(ingested.rejected[0].reason.contains("duplicate"));
    }

    #[test]
    fn test_wrong_type_rejects_only_that_record() {
        let input = json!([
            record("ACA1", 450.0),
            {"acid": "BAD1", "departure": "CYYZ", "arrival": "CYUL", "altitude": "high"},
            42
        ])
        .to_string();
        let report = engine().analyze_json(&input).unwrap();
        assert_eq!(report.summary.total_flights, 1);
        assert_eq!(report.summary.rejected_records, 2);
        assert_eq!(report.tables.rejected[0].acid.as_deref(), Some("BAD1"));
        assert_eq!(report.tables.rejected[1].index, 2);
        assert_eq!(report.tables.rejected[1].acid, None);
    }

    #[test]
    fn test_document_with_stations() {
        let input = json!({
            "stations": [
                {"code": "WEST", "lat": 0.0, "lon": -1.0},
                {"code": "EAST", "lat": 0.0, "lon": 1.0},
                {"code": "MID", "kind": "fix", "lat": 0.0, "lon": 0.0}
            ],
            "flights": [{
                "acid": "TST1",
                "departure": "WEST",
                "arrival": "EAST",
                "altitude": 30000,
                "speed": 480,
                "departure_time": 1_704_067_200
            }]
        })
        .to_string();
        let engine = engine();
        let report = engine.analyze_json(&input).unwrap();
        assert_eq!(report.summary.total_flights, 1);
        assert!(report.tables.hotspots.iter().any(|h| h.entity_id == "MID"));
        // Stations are scoped to the run
        assert!(engine.navdata().lookup("MID").is_none());
    }

    #[test]
    fn test_unparseable_document_is_input_error() {
        let err = engine().analyze_json("{\"flights\": 7}").unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert!(matches!(engine().analyze_json("not json"), Err(Error::Input(_))));
    }

    #[test]
    fn test_empty_input_produces_empty_report() {
        let report = engine().analyze(&[]);
        assert_eq!(report.summary.total_flights, 0);
        assert_eq!(report.summary.total_conflicts, 0);
        assert_eq!(report.summary.total_hotspots, 0);
        assert_eq!(report.charts.severity_distribution.len(), 3);
    }
}
