//! Engine configuration: separation minima, severity thresholds, resolution
//! budgets and hotspot scoring weights.
//!
//! Every threshold the engine uses lives here with a documented default so
//! that callers (and tests) can exercise boundary behaviour precisely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub separation: SeparationRules,
    pub severity: SeverityThresholds,
    pub resolution: ResolutionLimits,
    pub hotspot: HotspotConfig,
    /// How a flight travels between its departure and arrival stations.
    pub route_geometry: RouteGeometry,
    pub report: ReportConfig,
}

/// Minimum separation between two flights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationRules {
    /// Horizontal separation in nautical miles. Closer is a conflict.
    pub horizontal_nm: f64,
    /// Vertical separation in feet. Pairs at or above this never conflict.
    pub vertical_ft: i32,
    /// Coarse sampling interval for closest-approach search (seconds)
    pub sample_step_s: f64,
}

impl Default for SeparationRules {
    fn default() -> Self {
        Self {
            horizontal_nm: 5.0,
            vertical_ft: 1000,
            sample_step_s: 30.0,
        }
    }
}

/// Lower bounds of the moderate and advisory severity bands.
///
/// Bands are inclusive below and exclusive above:
/// `[0, critical_nm)`, `[critical_nm, moderate_nm)`,
/// `[moderate_nm, separation.horizontal_nm)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub critical_nm: f64,
    pub moderate_nm: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            critical_nm: 1.0,
            moderate_nm: 3.0,
        }
    }
}

/// Budgets bounding the resolution loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionLimits {
    /// Hard cap on applied mitigations per run
    pub max_iterations: usize,
    /// Delay granularity in minutes
    pub delay_step_min: f64,
    /// Maximum accumulated delay per flight in minutes
    pub max_delay_min: f64,
    /// Altitude change granularity in feet
    pub altitude_step_ft: i32,
    /// How many steps above or below the current altitude may be tried
    pub max_altitude_steps: u32,
    pub min_altitude_ft: i32,
    pub max_altitude_ft: i32,
}

impl Default for ResolutionLimits {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            delay_step_min: 5.0,
            max_delay_min: 60.0,
            altitude_step_ft: 1000,
            max_altitude_steps: 4,
            min_altitude_ft: 1000,
            max_altitude_ft: 45_000,
        }
    }
}

/// Upper bound on `max_delay_min / delay_step_min`
pub const MAX_DELAY_STEPS: f64 = 10_000.0;

impl ResolutionLimits {
    /// Number of delay increments that fit in the delay budget.
    pub fn delay_steps(&self) -> u32 {
        ((self.max_delay_min / self.delay_step_min) + 1e-9)
            .floor()
            .clamp(0.0, MAX_DELAY_STEPS) as u32
    }

    /// Altitude steps worth trying: no more than it takes to cross the
    /// whole altitude band.
    pub fn altitude_steps(&self) -> i64 {
        let span = i64::from(self.max_altitude_ft) - i64::from(self.min_altitude_ft);
        let band = span / i64::from(self.altitude_step_ft.max(1));
        i64::from(self.max_altitude_steps).min(band.max(0))
    }
}

/// Hotspot density radius and pressure weights.
///
/// `pressure = (density_weight * density / max_density
///              + conflict_weight * involved / density)
///             / (density_weight + conflict_weight)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotConfig {
    /// A flight passing within this distance of an entity counts toward it
    pub radius_nm: f64,
    pub density_weight: f64,
    pub conflict_weight: f64,
    /// Which conflicts count toward an entity's conflict involvement
    pub conflict_basis: ConflictBasis,
    /// Optional analysis window. Defaults to the span of the flight set.
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            radius_nm: 10.0,
            density_weight: 0.6,
            conflict_weight: 0.4,
            conflict_basis: ConflictBasis::Remaining,
            window_start: None,
            window_end: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictBasis {
    /// Conflicts still open when the run terminates
    #[default]
    Remaining,
    /// Every conflict recorded over the run
    Cumulative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteGeometry {
    /// Great-circle arc between stations
    #[default]
    GreatCircle,
    /// Linear interpolation in latitude/longitude
    Straight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Length of the top-aircraft ranking
    pub top_aircraft_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_aircraft_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Check every threshold. A failing configuration must not start a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sep = &self.separation;
        positive("separation.horizontal_nm", sep.horizontal_nm)?;
        positive("separation.sample_step_s", sep.sample_step_s)?;
        if sep.vertical_ft <= 0 {
            return Err(ConfigError::new(
                "separation.vertical_ft",
                format!("must be positive, got {}", sep.vertical_ft),
            ));
        }

        let sev = &self.severity;
        positive("severity.critical_nm", sev.critical_nm)?;
        positive("severity.moderate_nm", sev.moderate_nm)?;
        if sev.critical_nm >= sev.moderate_nm {
            return Err(ConfigError::new(
                "severity.critical_nm",
                format!(
                    "must be below severity.moderate_nm ({} >= {})",
                    sev.critical_nm, sev.moderate_nm
                ),
            ));
        }
        if sev.moderate_nm >= sep.horizontal_nm {
            return Err(ConfigError::new(
                "severity.moderate_nm",
                format!(
                    "must be below separation.horizontal_nm ({} >= {})",
                    sev.moderate_nm, sep.horizontal_nm
                ),
            ));
        }

        let res = &self.resolution;
        positive("resolution.delay_step_min", res.delay_step_min)?;
        non_negative("resolution.max_delay_min", res.max_delay_min)?;
        if res.max_delay_min / res.delay_step_min > MAX_DELAY_STEPS {
            return Err(ConfigError::new(
                "resolution.delay_step_min",
                format!(
                    "too small for resolution.max_delay_min ({} / {} exceeds {} steps)",
                    res.max_delay_min, res.delay_step_min, MAX_DELAY_STEPS
                ),
            ));
        }
        if res.altitude_step_ft <= 0 {
            return Err(ConfigError::new(
                "resolution.altitude_step_ft",
                format!("must be positive, got {}", res.altitude_step_ft),
            ));
        }
        if res.min_altitude_ft <= 0 || res.min_altitude_ft >= res.max_altitude_ft {
            return Err(ConfigError::new(
                "resolution.min_altitude_ft",
                format!(
                    "must be positive and below resolution.max_altitude_ft ({} / {})",
                    res.min_altitude_ft, res.max_altitude_ft
                ),
            ));
        }

        let hot = &self.hotspot;
        positive("hotspot.radius_nm", hot.radius_nm)?;
        non_negative("hotspot.density_weight", hot.density_weight)?;
        non_negative("hotspot.conflict_weight", hot.conflict_weight)?;
        if hot.density_weight + hot.conflict_weight <= 0.0 {
            return Err(ConfigError::new(
                "hotspot.density_weight",
                "weights must not both be zero",
            ));
        }
        if let (Some(start), Some(end)) = (hot.window_start, hot.window_end) {
            if start >= end {
                return Err(ConfigError::new(
                    "hotspot.window_start",
                    "must be before hotspot.window_end",
                ));
            }
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::new(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::new(
            field,
            format!("must be zero or positive, got {value}"),
        ))
    }
}
