//! Pre-defined flight schedule scenarios for exercising the engine.

use chrono::{DateTime, Duration, Utc};
use deconflict_core::navdata::{NavDatabase, Station, StationKind};
use deconflict_core::spatial::offset_by_bearing;
use deconflict_core::{FlightRecord, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

use super::Scenario;

/// Distance from the scenario center to each synthetic station.
const LEG_NM: f64 = 60.0;
const CRUISE_ALT_FT: f64 = 35_000.0;
const CRUISE_SPEED_KTS: f64 = 480.0;

/// Synthetic station `LEG_NM` from the center along `bearing_deg`.
fn station_at(code: &str, center_lat: f64, center_lon: f64, bearing_deg: f64) -> Station {
    let (lat, lon) = offset_by_bearing(center_lat, center_lon, LEG_NM, bearing_deg.to_radians());
    Station::airport(code, lat, lon)
}

fn record(
    acid: &str,
    departure: &str,
    arrival: &str,
    passengers: i64,
    departure_time: DateTime<Utc>,
) -> FlightRecord {
    FlightRecord {
        acid: Some(acid.to_string()),
        departure: Some(departure.to_string()),
        arrival: Some(arrival.to_string()),
        altitude: Some(CRUISE_ALT_FT),
        speed: Some(CRUISE_SPEED_KTS),
        passengers: Some(passengers),
        is_cargo: Some(false),
        departure_time: Some(Timestamp::Text(departure_time.to_rfc3339())),
    }
}

/// Two flights crossing at the center at the same time.
///
/// - `XNG001`: west to east
/// - `XNG002`: south to north
pub fn create_crossing_scenario(
    center_lat: f64,
    center_lon: f64,
    start: DateTime<Utc>,
) -> Scenario {
    let stations = vec![
        station_at("XWST", center_lat, center_lon, 270.0),
        station_at("XEST", center_lat, center_lon, 90.0),
        station_at("XSTH", center_lat, center_lon, 180.0),
        station_at("XNTH", center_lat, center_lon, 0.0),
        Station::fix("XCTR", center_lat, center_lon),
    ];
    Scenario {
        name: "crossing".to_string(),
        stations,
        flights: vec![
            record("XNG001", "XWST", "XEST", 180, start),
            record("XNG002", "XSTH", "XNTH", 90, start),
        ],
    }
}

/// Three flights meeting at the center, every pair in conflict.
pub fn create_triangle_scenario(
    center_lat: f64,
    center_lon: f64,
    start: DateTime<Utc>,
) -> Scenario {
    let legs = [("A", 270.0), ("B", 180.0), ("C", 225.0)];
    let mut stations = vec![Station::fix("TCTR", center_lat, center_lon)];
    let mut flights = Vec::new();
    for (i, (leg, bearing)) in legs.iter().enumerate() {
        let from = format!("T{leg}1");
        let to = format!("T{leg}2");
        stations.push(station_at(&from, center_lat, center_lon, *bearing));
        stations.push(station_at(&to, center_lat, center_lon, bearing - 180.0));
        flights.push(record(
            &format!("TRI{:03}", i + 1),
            &from,
            &to,
            100 * (i as i64 + 1),
            start,
        ));
    }
    Scenario {
        name: "triangle".to_string(),
        stations,
        flights,
    }
}

/// `count` flights from evenly spaced bearings, all arriving at the
/// center station.
pub fn create_converging_scenario(
    center_lat: f64,
    center_lon: f64,
    count: usize,
    start: DateTime<Utc>,
) -> Scenario {
    let count = count.max(2);
    let mut stations = vec![Station::airport("CHUB", center_lat, center_lon)];
    let flights = (0..count)
        .map(|i| {
            let bearing = 360.0 * i as f64 / count as f64;
            let code = format!("CV{:02}", i + 1);
            stations.push(station_at(&code, center_lat, center_lon, bearing));
            record(&format!("CNV{:03}", i + 1), &code, "CHUB", 150, start)
        })
        .collect();
    Scenario {
        name: "converging".to_string(),
        stations,
        flights,
    }
}

/// `count` flights between random pairs of `navdata` airports.
///
/// Departures fall within `window_hours` of `start`. The same seed always
/// produces the same schedule. Airports the flights use that are not in
/// the built-in table are carried in the scenario's stations.
pub fn create_random_scenario(
    navdata: &NavDatabase,
    count: usize,
    seed: u64,
    start: DateTime<Utc>,
    window_hours: u32,
) -> Scenario {
    let airports: Vec<&Station> = navdata
        .stations()
        .filter(|s| s.kind == StationKind::Airport)
        .collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flights = Vec::with_capacity(count);
    let mut used = BTreeSet::new();

    if airports.len() >= 2 {
        let window_min = i64::from(window_hours.max(1)) * 60;
        for i in 0..count {
            let from = rng.random_range(0..airports.len());
            let mut to = rng.random_range(0..airports.len() - 1);
            if to >= from {
                to += 1;
            }
            let is_cargo = rng.random_bool(0.15);
            let passengers = if is_cargo { 0 } else { rng.random_range(20..=320) };
            let level = rng.random_range(24..=41) * 1000;
            let departure_time = start + Duration::minutes(rng.random_range(0..window_min));
            used.insert(from);
            used.insert(to);

            flights.push(FlightRecord {
                altitude: Some(f64::from(level)),
                speed: Some(f64::from(rng.random_range(380..=520))),
                is_cargo: Some(is_cargo),
                ..record(
                    &format!("RND{:04}", i + 1),
                    &airports[from].code,
                    &airports[to].code,
                    passengers,
                    departure_time,
                )
            });
        }
    }

    let builtin = NavDatabase::builtin();
    let stations = used
        .into_iter()
        .map(|i| airports[i])
        .filter(|s| builtin.lookup(&s.code).is_none())
        .cloned()
        .collect();

    Scenario {
        name: "random".to_string(),
        stations,
        flights,
    }
}
