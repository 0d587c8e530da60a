//! Station lookup: airports and fixes keyed by code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::spatial::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Airport,
    Fix,
}

impl StationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationKind::Airport => "airport",
            StationKind::Fix => "fix",
        }
    }
}

/// A named point that flights depart from, arrive at or pass near.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    #[serde(default = "default_kind")]
    pub kind: StationKind,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_kind() -> StationKind {
    StationKind::Airport
}

impl Station {
    pub fn airport(code: &str, lat: f64, lon: f64) -> Self {
        Self {
            code: code.to_string(),
            kind: StationKind::Airport,
            lat,
            lon,
            name: None,
        }
    }

    pub fn fix(code: &str, lat: f64, lon: f64) -> Self {
        Self {
            kind: StationKind::Fix,
            ..Self::airport(code, lat, lon)
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Major Canadian airports plus a few US hubs that commonly appear in
/// transborder schedules.
const BUILTIN_AIRPORTS: &[(&str, &str, f64, f64)] = &[
    ("CYYZ", "Toronto Pearson", 43.6777, -79.6248),
    ("CYTZ", "Toronto Billy Bishop", 43.6275, -79.3962),
    ("CYVR", "Vancouver", 49.1947, -123.1792),
    ("CYUL", "Montreal Trudeau", 45.4706, -73.7408),
    ("CYYC", "Calgary", 51.1139, -114.0203),
    ("CYOW", "Ottawa", 45.3225, -75.6692),
    ("CYEG", "Edmonton", 53.3097, -113.5797),
    ("CYWG", "Winnipeg", 49.9100, -97.2399),
    ("CYHZ", "Halifax", 44.8808, -63.5086),
    ("CYQB", "Quebec City", 46.7911, -71.3933),
    ("CYYJ", "Victoria", 48.6469, -123.4258),
    ("CYXE", "Saskatoon", 52.1708, -106.6997),
    ("CYQR", "Regina", 50.4319, -104.6658),
    ("CYYT", "St. John's", 47.6186, -52.7519),
    ("CYXU", "London", 43.0356, -81.1539),
    ("CYHM", "Hamilton", 43.1736, -79.9350),
    ("CYQM", "Moncton", 46.1122, -64.6786),
    ("CYXY", "Whitehorse", 60.7096, -135.0670),
    ("CYZF", "Yellowknife", 62.4628, -114.4403),
    ("CYFB", "Iqaluit", 63.7564, -68.5558),
    ("KJFK", "New York JFK", 40.6413, -73.7781),
    ("KBOS", "Boston Logan", 42.3656, -71.0096),
    ("KORD", "Chicago O'Hare", 41.9742, -87.9073),
    ("KSEA", "Seattle-Tacoma", 47.4502, -122.3088),
    ("KLAX", "Los Angeles", 33.9416, -118.4085),
];

/// Station table keyed by upper-cased code.
#[derive(Debug, Clone, Default)]
pub struct NavDatabase {
    stations: BTreeMap<String, Station>,
}

impl NavDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in airport table.
    pub fn builtin() -> Self {
        let mut db = Self::new();
        for &(code, name, lat, lon) in BUILTIN_AIRPORTS {
            db.stations.insert(
                code.to_string(),
                Station {
                    name: Some(name.to_string()),
                    ..Station::airport(code, lat, lon)
                },
            );
        }
        db
    }

    /// Parse a JSON array of stations.
    pub fn from_json(input: &str) -> Result<Self> {
        let stations: Vec<Station> = serde_json::from_str(input)?;
        let mut db = Self::new();
        db.extend(stations)?;
        Ok(db)
    }

    /// Add or replace stations. Later entries win on duplicate codes.
    pub fn extend(&mut self, stations: impl IntoIterator<Item = Station>) -> Result<()> {
        for mut station in stations {
            let code = station.code.trim().to_ascii_uppercase();
            if code.is_empty() {
                return Err(Error::navdata("station code must not be empty"));
            }
            if !station.position().is_valid() {
                return Err(Error::navdata(format!(
                    "coordinates out of range for '{}': ({}, {})",
                    code, station.lat, station.lon
                )));
            }
            station.code = code.clone();
            self.stations.insert(code, station);
        }
        Ok(())
    }

    pub fn insert(&mut self, station: Station) -> Result<()> {
        self.extend(std::iter::once(station))
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, code: &str) -> Option<&Station> {
        let code = code.trim();
        self.stations
            .get(code)
            .or_else(|| self.stations.get(&code.to_ascii_uppercase()))
    }

    /// All stations ordered by code.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_major_airports() {
        let db = NavDatabase::builtin();
        let yyz = db.lookup("CYYZ").unwrap();
        assert_eq!(yyz.kind, StationKind::Airport);
        assert!(db.lookup("cyvr").is_some());
        assert!(db.lookup("XXXX").is_none());
    }

    #[test]
    fn test_from_json_with_fixes() {
        let db = NavDatabase::from_json(
            r#"[
                {"code": "alpha", "kind": "fix", "lat": 45.0, "lon": -75.0},
                {"code": "HOME", "lat": 44.0, "lon": -76.0, "name": "Home field"}
            ]"#,
        )
        .unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.lookup("ALPHA").unwrap().kind, StationKind::Fix);
        assert_eq!(db.lookup("home").unwrap().kind, StationKind::Airport);
    }

    #[test]
    fn test_extend_replaces_duplicates() {
        let mut db = NavDatabase::builtin();
        let before = db.len();
        db.insert(Station::airport("cyyz", 10.0, 10.0)).unwrap();
        assert_eq!(db.len(), before);
        assert_eq!(db.lookup("CYYZ").unwrap().lat, 10.0);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let mut db = NavDatabase::new();
        assert!(db.insert(Station::fix("BAD", 91.0, 0.0)).is_err());
        assert!(db.insert(Station::fix("NAN", f64::NAN, 0.0)).is_err());
        assert!(db.is_empty());
    }
}
