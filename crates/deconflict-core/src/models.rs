//! Core data models: raw flight records and validated flights.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::navdata::NavDatabase;
use crate::spatial::GeoPoint;

/// A flight record as received from the ingestion layer.
///
/// Every field is optional here; [`FlightRecord::validate`] decides what is
/// required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(default)]
    pub acid: Option<String>,
    #[serde(default)]
    pub departure: Option<String>,
    #[serde(default)]
    pub arrival: Option<String>,
    /// Cruise altitude in feet
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Ground speed in knots
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub passengers: Option<i64>,
    #[serde(default, alias = "cargo")]
    pub is_cargo: Option<bool>,
    #[serde(default, alias = "dep_time", alias = "departure_timestamp")]
    pub departure_time: Option<Timestamp>,
}

/// Departure timestamp as it appears in input documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Unix seconds
    Seconds(f64),
    /// RFC 3339, or `YYYY-MM-DD HH:MM[:SS]` in UTC
    Text(String),
}

impl Timestamp {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Seconds(secs) => {
                if !secs.is_finite() {
                    return None;
                }
                DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
            }
            Timestamp::Text(text) => {
                let text = text.trim();
                if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                    return Some(parsed.with_timezone(&Utc));
                }
                ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                    .map(|naive| naive.and_utc())
            }
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Seconds(secs) => write!(f, "{secs}"),
            Timestamp::Text(text) => f.write_str(text),
        }
    }
}

impl FlightRecord {
    /// Validate the record against the navigation database.
    ///
    /// Uniqueness of `acid` across records is checked by the caller.
    pub fn validate(&self, navdata: &NavDatabase) -> Result<Flight, ValidationError> {
        let acid = required_text(&self.acid, "acid")?;
        let departure = required_text(&self.departure, "departure")?;
        let arrival = required_text(&self.arrival, "arrival")?;

        let altitude = self.altitude.ok_or(ValidationError::MissingField { field: "altitude" })?;
        if !altitude.is_finite() || altitude <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "altitude",
                value: altitude,
            });
        }
        let speed = self.speed.ok_or(ValidationError::MissingField { field: "speed" })?;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ValidationError::NonPositive {
                field: "speed",
                value: speed,
            });
        }

        let passengers = self.passengers.unwrap_or(0);
        if passengers < 0 {
            return Err(ValidationError::Negative {
                field: "passengers",
                value: passengers,
            });
        }

        let raw_time = self
            .departure_time
            .as_ref()
            .ok_or(ValidationError::MissingField {
                field: "departure_time",
            })?;
        let scheduled_departure =
            raw_time
                .to_datetime()
                .ok_or_else(|| ValidationError::InvalidTimestamp {
                    value: raw_time.to_string(),
                })?;

        let origin = navdata
            .lookup(&departure)
            .ok_or_else(|| ValidationError::UnknownStation {
                field: "departure",
                code: departure.clone(),
            })?;
        let destination =
            navdata
                .lookup(&arrival)
                .ok_or_else(|| ValidationError::UnknownStation {
                    field: "arrival",
                    code: arrival.clone(),
                })?;
        if origin.code == destination.code {
            return Err(ValidationError::SameStation {
                code: origin.code.clone(),
            });
        }

        let altitude_ft = altitude.round() as i32;
        Ok(Flight {
            acid,
            departure: origin.code.clone(),
            arrival: destination.code.clone(),
            origin: origin.position(),
            destination: destination.position(),
            filed_altitude_ft: altitude_ft,
            altitude_ft,
            speed_kts: speed,
            passengers: u32::try_from(passengers).unwrap_or(u32::MAX),
            is_cargo: self.is_cargo.unwrap_or(false),
            scheduled_departure,
            delay_min: 0.0,
        })
    }
}

fn required_text(value: &Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ValidationError::MissingField { field }),
    }
}

/// A validated flight, owned by exactly one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flight {
    pub acid: String,
    pub departure: String,
    pub arrival: String,
    #[serde(skip)]
    pub origin: GeoPoint,
    #[serde(skip)]
    pub destination: GeoPoint,
    /// Altitude as filed, before any resolution
    pub filed_altitude_ft: i32,
    /// Effective altitude
    pub altitude_ft: i32,
    pub speed_kts: f64,
    pub passengers: u32,
    pub is_cargo: bool,
    pub scheduled_departure: DateTime<Utc>,
    /// Accumulated delay in minutes
    pub delay_min: f64,
}

impl Flight {
    pub fn effective_departure(&self) -> DateTime<Utc> {
        self.scheduled_departure + Duration::milliseconds((self.delay_min * 60_000.0).round() as i64)
    }

    /// Copy of this flight with a new accumulated delay.
    pub fn with_delay(&self, delay_min: f64) -> Flight {
        Flight {
            delay_min,
            ..self.clone()
        }
    }

    /// Copy of this flight at a new altitude.
    pub fn with_altitude(&self, altitude_ft: i32) -> Flight {
        Flight {
            altitude_ft,
            ..self.clone()
        }
    }

    /// Sort key for choosing which flight of a pair gives way: cargo before
    /// passenger flights, then fewer passengers, then callsign.
    pub fn mitigation_priority(&self) -> (bool, u32, &str) {
        (!self.is_cargo, self.passengers, self.acid.as_str())
    }
}
