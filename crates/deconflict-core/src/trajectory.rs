//! Time-parameterized flight trajectories.
//!
//! A trajectory is a read-only projection of a [`Flight`]: constant cruise
//! altitude, uniform progress from departure to arrival station. Times are
//! carried as Unix seconds (`f64`) for the numeric work.

use chrono::{DateTime, Utc};

use crate::config::RouteGeometry;
use crate::models::Flight;
use crate::spatial::{great_circle_fraction, straight_fraction, GeoPoint};

/// Segments used to measure and bound straight lat/lon routes.
const STRAIGHT_ROUTE_SEGMENTS: usize = 32;
/// Upper bound on samples when scanning a trajectory against a point.
const MAX_POINT_SAMPLES: usize = 4096;
const REFINE_ITERATIONS: usize = 60;

/// Position of a flight at an instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub point: GeoPoint,
    pub altitude_ft: i32,
}

#[derive(Debug, Clone)]
pub struct Trajectory {
    pub acid: String,
    pub altitude_ft: i32,
    /// Effective departure (Unix seconds)
    pub start_s: f64,
    /// Arrival (Unix seconds)
    pub end_s: f64,
    pub length_nm: f64,
    origin: GeoPoint,
    destination: GeoPoint,
    geometry: RouteGeometry,
    center: GeoPoint,
    /// Every point of the route lies within this distance of `center`.
    reach_nm: f64,
}

impl Trajectory {
    pub fn from_flight(flight: &Flight, geometry: RouteGeometry) -> Self {
        let origin = flight.origin;
        let destination = flight.destination;

        let (length_nm, center, reach_nm) = match geometry {
            RouteGeometry::GreatCircle => {
                let length = origin.distance_nm(&destination);
                let center = great_circle_fraction(&origin, &destination, 0.5);
                (length, center, length / 2.0)
            }
            RouteGeometry::Straight => {
                let points: Vec<GeoPoint> = (0..=STRAIGHT_ROUTE_SEGMENTS)
                    .map(|i| {
                        straight_fraction(
                            &origin,
                            &destination,
                            i as f64 / STRAIGHT_ROUTE_SEGMENTS as f64,
                        )
                    })
                    .collect();
                let length: f64 = points.windows(2).map(|w| w[0].distance_nm(&w[1])).sum();
                let center = straight_fraction(&origin, &destination, 0.5);
                // Sampled reach plus half a segment of slack
                let reach = points
                    .iter()
                    .map(|p| p.distance_nm(&center))
                    .fold(0.0, f64::max)
                    + length / STRAIGHT_ROUTE_SEGMENTS as f64 / 2.0;
                (length, center, reach)
            }
        };

        let start_s = timestamp_s(flight.effective_departure());
        let duration_s = length_nm / flight.speed_kts * 3600.0;

        Self {
            acid: flight.acid.clone(),
            altitude_ft: flight.altitude_ft,
            start_s,
            end_s: start_s + duration_s,
            length_nm,
            origin,
            destination,
            geometry,
            center,
            reach_nm,
        }
    }

    /// Position at `t_s`, or `None` outside the flight's time window.
    pub fn position_at(&self, t_s: f64) -> Option<Position> {
        if t_s < self.start_s || t_s > self.end_s {
            return None;
        }
        let span = self.end_s - self.start_s;
        let fraction = if span > 0.0 {
            ((t_s - self.start_s) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(Position {
            point: self.point_at_fraction(fraction),
            altitude_ft: self.altitude_ft,
        })
    }

    fn point_at_fraction(&self, fraction: f64) -> GeoPoint {
        match self.geometry {
            RouteGeometry::GreatCircle => {
                great_circle_fraction(&self.origin, &self.destination, fraction)
            }
            RouteGeometry::Straight => straight_fraction(&self.origin, &self.destination, fraction),
        }
    }

    /// Intersection of both time windows, if any.
    pub fn overlap(&self, other: &Trajectory) -> Option<(f64, f64)> {
        let start = self.start_s.max(other.start_s);
        let end = self.end_s.min(other.end_s);
        (start <= end).then_some((start, end))
    }

    /// Lower bound on the horizontal distance between any two points of the
    /// two routes, regardless of timing.
    pub fn min_possible_distance_nm(&self, other: &Trajectory) -> f64 {
        (self.center.distance_nm(&other.center) - self.reach_nm - other.reach_nm).max(0.0)
    }

    /// Lower bound on the distance from any point of the route to `point`.
    pub fn min_possible_distance_to(&self, point: &GeoPoint) -> f64 {
        (self.center.distance_nm(point) - self.reach_nm).max(0.0)
    }

    /// Closest horizontal distance between this trajectory and `point`
    /// while airborne inside `[window_start_s, window_end_s]`.
    ///
    /// `resolution_nm` controls the coarse sampling density along the route.
    pub fn min_distance_to(
        &self,
        point: &GeoPoint,
        window_start_s: f64,
        window_end_s: f64,
        resolution_nm: f64,
    ) -> Option<f64> {
        let start = self.start_s.max(window_start_s);
        let end = self.end_s.min(window_end_s);
        if start > end {
            return None;
        }
        let span = self.end_s - self.start_s;
        let (f0, f1) = if span > 0.0 {
            ((start - self.start_s) / span, (end - self.start_s) / span)
        } else {
            (0.0, 0.0)
        };

        let covered_nm = self.length_nm * (f1 - f0);
        let samples = ((covered_nm / resolution_nm.max(1e-3)).ceil() as usize)
            .clamp(1, MAX_POINT_SAMPLES);
        let step = (f1 - f0) / samples as f64;
        let distance_at = |f: f64| self.point_at_fraction(f).distance_nm(point);

        let mut best_f = f0;
        let mut best_d = distance_at(f0);
        for i in 1..=samples {
            let f = if i == samples { f1 } else { f0 + step * i as f64 };
            let d = distance_at(f);
            if d < best_d {
                best_d = d;
                best_f = f;
            }
        }

        let (lo, hi) = ((best_f - step).max(f0), (best_f + step).min(f1));
        let (_, refined) = ternary_min(lo, hi, distance_at);
        Some(best_d.min(refined))
    }
}

/// Ternary search for the minimum of a unimodal function on `[lo, hi]`.
pub(crate) fn ternary_min(mut lo: f64, mut hi: f64, f: impl Fn(f64) -> f64) -> (f64, f64) {
    for _ in 0..REFINE_ITERATIONS {
        if hi - lo <= 1e-9 {
            break;
        }
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if f(m1) <= f(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    let x = (lo + hi) / 2.0;
    (x, f(x))
}

pub fn timestamp_s(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

pub fn datetime_from_s(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::{NavDatabase, Station};
    use crate::models::FlightRecord;
    use serde_json::json;

    fn equator_nav() -> NavDatabase {
        let mut nav = NavDatabase::new();
        nav.extend([
            Station::airport("WEST", 0.0, -1.0),
            Station::airport("EAST", 0.0, 1.0),
        ])
        .unwrap();
        nav
    }

    fn flight(speed: f64) -> Flight {
        let record: FlightRecord = serde_json::from_value(json!({
            "acid": "T1",
            "departure": "WEST",
            "arrival": "EAST",
            "altitude": 30000,
            "speed": speed,
            "departure_time": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        record.validate(&equator_nav()).unwrap()
    }

    #[test]
    fn test_duration_matches_speed() {
        let traj = Trajectory::from_flight(&flight(480.0), RouteGeometry::GreatCircle);
        // ~120 NM at 480 kt is ~15 minutes
        let minutes = (traj.end_s - traj.start_s) / 60.0;
        assert!((minutes - traj.length_nm / 8.0).abs() < 1e-9);
        assert!((traj.length_nm - 120.08).abs() < 0.1);
    }

    #[test]
    fn test_position_progresses_linearly() {
        let traj = Trajectory::from_flight(&flight(480.0), RouteGeometry::GreatCircle);
        let mid_t = (traj.start_s + traj.end_s) / 2.0;
        let mid = traj.position_at(mid_t).unwrap();
        assert!(mid.point.lon.abs() < 1e-6);
        assert_eq!(mid.altitude_ft, 30000);

        let quarter = traj.position_at(traj.start_s + (traj.end_s - traj.start_s) / 4.0).unwrap();
        assert!((quarter.point.lon + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_position_undefined_outside_window() {
        let traj = Trajectory::from_flight(&flight(480.0), RouteGeometry::Straight);
        assert!(traj.position_at(traj.start_s - 1.0).is_none());
        assert!(traj.position_at(traj.end_s + 1.0).is_none());
        assert!(traj.position_at(traj.start_s).is_some());
    }

    #[test]
    fn test_delay_shifts_window() {
        let base = flight(480.0);
        let a = Trajectory::from_flight(&base, RouteGeometry::GreatCircle);
        let b = Trajectory::from_flight(&base.with_delay(10.0), RouteGeometry::GreatCircle);
        assert!((b.start_s - a.start_s - 600.0).abs() < 1e-6);
        assert!((b.end_s - a.end_s - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_distance_to_point() {
        let traj = Trajectory::from_flight(&flight(480.0), RouteGeometry::GreatCircle);
        let on_route = GeoPoint::new(0.0, 0.25);
        let d = traj
            .min_distance_to(&on_route, traj.start_s, traj.end_s, 5.0)
            .unwrap();
        assert!(d < 0.01);

        let north = GeoPoint::new(0.5, 0.0);
        let d = traj.min_distance_to(&north, traj.start_s, traj.end_s, 5.0).unwrap();
        assert!((d - 30.02).abs() < 0.1);

        assert!(traj.min_distance_to(&north, 0.0, 1.0, 5.0).is_none());
    }

    #[test]
    fn test_min_possible_distance_is_a_lower_bound() {
        let traj = Trajectory::from_flight(&flight(480.0), RouteGeometry::GreatCircle);
        assert_eq!(traj.min_possible_distance_nm(&traj), 0.0);
    }
}
