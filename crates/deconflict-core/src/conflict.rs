//! Conflict detection over scheduled trajectories.
//!
//! Every unordered pair of flights whose time windows overlap and whose
//! altitudes are closer than the vertical minimum is searched for its time
//! of closest horizontal approach. Pairs closing inside the horizontal
//! minimum are reported as conflicts, banded by severity.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::config::{EngineConfig, SeparationRules, SeverityThresholds};
use crate::spatial::GeoPoint;
use crate::trajectory::{datetime_from_s, ternary_min, Trajectory};

/// Severity bands, ordered so that `Critical` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Between the moderate threshold and the horizontal minimum
    Advisory,
    /// Between the critical and moderate thresholds
    Moderate,
    /// Below the critical threshold
    Critical,
}

impl Severity {
    /// Bands in reporting order.
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Moderate, Severity::Advisory];

    /// Band for a closest-approach distance, inclusive below and exclusive
    /// above. `None` at or beyond the horizontal minimum.
    pub fn classify(
        distance_nm: f64,
        thresholds: &SeverityThresholds,
        horizontal_nm: f64,
    ) -> Option<Severity> {
        if distance_nm < thresholds.critical_nm {
            Some(Severity::Critical)
        } else if distance_nm < thresholds.moderate_nm {
            Some(Severity::Moderate)
        } else if distance_nm < horizontal_nm {
            Some(Severity::Advisory)
        } else {
            None
        }
    }

    /// Display label such as `<1NM`, `1-3NM` or `3-5NM`.
    pub fn label(&self, config: &EngineConfig) -> String {
        let critical = format_nm(config.severity.critical_nm);
        let moderate = format_nm(config.severity.moderate_nm);
        match self {
            Severity::Critical => format!("<{critical}NM"),
            Severity::Moderate => format!("{critical}-{moderate}NM"),
            Severity::Advisory => format!(
                "{moderate}-{}NM",
                format_nm(config.separation.horizontal_nm)
            ),
        }
    }
}

fn format_nm(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Unordered flight pair, stored with the smaller callsign first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub first: String,
    pub second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// The member of the pair that is not `acid`.
    pub fn other(&self, acid: &str) -> &str {
        if self.first == acid {
            &self.second
        } else {
            &self.first
        }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.first, self.second)
    }
}

/// Detected separation violation between two flights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Lexicographically smaller callsign
    pub flight_a: String,
    pub flight_b: String,
    pub closest_at: DateTime<Utc>,
    /// `closest_at` in Unix seconds, full precision
    #[serde(skip)]
    pub closest_s: f64,
    /// Horizontal separation at closest approach
    pub horizontal_nm: f64,
    pub vertical_ft: i32,
    pub severity: Severity,
    /// Midpoint between the two flights at closest approach
    pub location: GeoPoint,
}

impl Conflict {
    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.flight_a, &self.flight_b)
    }

    pub fn involves(&self, acid: &str) -> bool {
        self.flight_a == acid || self.flight_b == acid
    }

    /// Detection order: time of closest approach, then callsign pair.
    pub fn detection_order(&self, other: &Conflict) -> Ordering {
        self.closest_s
            .total_cmp(&other.closest_s)
            .then_with(|| self.flight_a.cmp(&other.flight_a))
            .then_with(|| self.flight_b.cmp(&other.flight_b))
    }

    /// Resolution order: most severe first, then detection order.
    pub fn resolution_order(&self, other: &Conflict) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.detection_order(other))
    }
}

/// Pairwise conflict detector.
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    separation: SeparationRules,
    severity: SeverityThresholds,
}

impl ConflictDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            separation: config.separation.clone(),
            severity: config.severity.clone(),
        }
    }

    /// Check every unordered pair. Pair checks run in parallel; the result
    /// is sorted into detection order.
    pub fn detect_conflicts(&self, trajectories: &[Trajectory]) -> Vec<Conflict> {
        let n = trajectories.len();
        let mut conflicts: Vec<Conflict> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let a = &trajectories[i];
                trajectories[i + 1..]
                    .iter()
                    .filter_map(move |b| self.check_pair(a, b))
            })
            .collect();
        conflicts.sort_by(Conflict::detection_order);
        conflicts
    }

    /// Conflict between two trajectories, if any.
    pub fn check_pair(&self, a: &Trajectory, b: &Trajectory) -> Option<Conflict> {
        let vertical_ft = (a.altitude_ft - b.altitude_ft).abs();
        if vertical_ft >= self.separation.vertical_ft {
            return None;
        }
        let (start, end) = a.overlap(b)?;
        if a.min_possible_distance_nm(b) >= self.separation.horizontal_nm {
            return None;
        }

        let (closest_s, horizontal_nm, location) = self.closest_approach(a, b, start, end)?;
        let severity =
            Severity::classify(horizontal_nm, &self.severity, self.separation.horizontal_nm)?;

        let (flight_a, flight_b) = if a.acid <= b.acid {
            (a.acid.clone(), b.acid.clone())
        } else {
            (b.acid.clone(), a.acid.clone())
        };

        Some(Conflict {
            flight_a,
            flight_b,
            closest_at: datetime_from_s(closest_s),
            closest_s,
            horizontal_nm,
            vertical_ft,
            severity,
            location,
        })
    }

    /// Find time and distance of closest horizontal approach in
    /// `[start, end]`: coarse sampling, then a ternary search around the
    /// best sample.
    fn closest_approach(
        &self,
        a: &Trajectory,
        b: &Trajectory,
        start: f64,
        end: f64,
    ) -> Option<(f64, f64, GeoPoint)> {
        let distance_at = |t: f64| match (a.position_at(t), b.position_at(t)) {
            (Some(p), Some(q)) => p.point.distance_nm(&q.point),
            _ => f64::INFINITY,
        };

        let step = self.separation.sample_step_s;
        let samples = (((end - start) / step).ceil() as usize).max(1);

        let mut best_t = start;
        let mut best_d = distance_at(start);
        for i in 1..=samples {
            let t = if i == samples {
                end
            } else {
                start + step * i as f64
            };
            let d = distance_at(t);
            if d < best_d {
                best_d = d;
                best_t = t;
            }
        }

        let lo = (best_t - step).max(start);
        let hi = (best_t + step).min(end);
        let (refined_t, refined_d) = ternary_min(lo, hi, distance_at);
        if refined_d < best_d {
            best_t = refined_t;
            best_d = refined_d;
        }
        if !best_d.is_finite() {
            return None;
        }

        let p = a.position_at(best_t)?;
        let q = b.position_at(best_t)?;
        Some((best_t, best_d, p.point.midpoint(&q.point)))
    }
}
