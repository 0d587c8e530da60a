//! Hotspot aggregation over navigation entities.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::cmp::Ordering;
use tracing::debug;

use crate::config::HotspotConfig;
use crate::conflict::Conflict;
use crate::navdata::{NavDatabase, Station, StationKind};
use crate::trajectory::{timestamp_s, Trajectory};

/// Coarse sampling density relative to the hotspot radius.
const SAMPLES_PER_RADIUS: f64 = 4.0;

/// Congestion score for one airport or fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub entity_type: StationKind,
    pub entity_id: String,
    /// Flights passing within the hotspot radius during the window
    pub traffic_density: usize,
    /// Normalized to `[0, 1]`
    pub pressure: f64,
}

#[derive(Debug, Clone)]
pub struct HotspotAggregator {
    config: HotspotConfig,
}

impl HotspotAggregator {
    pub fn new(config: &HotspotConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Analysis window in Unix seconds. Defaults to the span of the flight
    /// set on whichever side is not configured.
    pub fn window(&self, trajectories: &[Trajectory]) -> Option<(f64, f64)> {
        let start = match self.config.window_start {
            Some(t) => timestamp_s(t),
            None => trajectories.iter().map(|t| t.start_s).reduce(f64::min)?,
        };
        let end = match self.config.window_end {
            Some(t) => timestamp_s(t),
            None => trajectories.iter().map(|t| t.end_s).reduce(f64::max)?,
        };
        (start <= end).then_some((start, end))
    }

    /// Score every station in `navdata` against the flight set.
    ///
    /// `conflicts` decides which flights count as involved.
    pub fn aggregate(
        &self,
        navdata: &NavDatabase,
        trajectories: &[Trajectory],
        conflicts: &[Conflict],
    ) -> Vec<Hotspot> {
        let Some((window_start, window_end)) = self.window(trajectories) else {
            return Vec::new();
        };
        let involved: HashSet<&str> = conflicts
            .iter()
            .flat_map(|c| [c.flight_a.as_str(), c.flight_b.as_str()])
            .collect();

        let stations: Vec<&Station> = navdata.stations().collect();
        let counts: Vec<(&Station, usize, usize)> = stations
            .par_iter()
            .filter_map(|station| {
                let (density, in_conflict) =
                    self.nearby_traffic(station, trajectories, &involved, window_start, window_end);
                (density > 0).then_some((*station, density, in_conflict))
            })
            .collect();

        let max_density = counts.iter().map(|&(_, d, _)| d).max().unwrap_or(0);
        let mut hotspots: Vec<Hotspot> = counts
            .into_iter()
            .map(|(station, density, in_conflict)| Hotspot {
                entity_type: station.kind,
                entity_id: station.code.clone(),
                traffic_density: density,
                pressure: self.pressure(density, max_density, in_conflict),
            })
            .collect();

        hotspots.sort_by(|a, b| {
            b.pressure
                .partial_cmp(&a.pressure)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.traffic_density.cmp(&a.traffic_density))
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        debug!(
            "Aggregated {} hotspot(s) from {} station(s)",
            hotspots.len(),
            stations.len()
        );
        hotspots
    }

    /// Count flights near `station`, and how many of them are involved.
    fn nearby_traffic(
        &self,
        station: &Station,
        trajectories: &[Trajectory],
        involved: &HashSet<&str>,
        window_start: f64,
        window_end: f64,
    ) -> (usize, usize) {
        let point = station.position();
        let radius = self.config.radius_nm;
        let resolution = radius / SAMPLES_PER_RADIUS;

        trajectories
            .iter()
            .filter(|t| t.min_possible_distance_to(&point) <= radius)
            .filter(|t| {
                t.min_distance_to(&point, window_start, window_end, resolution)
                    .is_some_and(|d| d <= radius)
            })
            .fold((0, 0), |(density, in_conflict), t| {
                let hit = usize::from(involved.contains(t.acid.as_str()));
                (density + 1, in_conflict + hit)
            })
    }

    fn pressure(&self, density: usize, max_density: usize, involved: usize) -> f64 {
        if density == 0 || max_density == 0 {
            return 0.0;
        }
        let w_d = self.config.density_weight;
        let w_c = self.config.conflict_weight;
        let traffic = density as f64 / max_density as f64;
        let conflict = involved as f64 / density as f64;
        ((w_d * traffic + w_c * conflict) / (w_d + w_c)).clamp(0.0, 1.0)
    }
}
