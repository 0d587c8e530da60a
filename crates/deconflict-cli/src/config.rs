//! Layered configuration for the CLI.
//!
//! Defaults, then an optional JSON file, then `DECONFLICT_*` environment
//! overrides. Unparseable environment values are ignored.

use anyhow::{Context, Result};
use deconflict_core::{EngineConfig, NavDatabase};
use std::env;
use std::path::Path;

/// Load the engine configuration.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    apply_overrides(&mut config, |key| env::var(key).ok());
    Ok(config)
}

/// Apply environment-style overrides through `lookup`.
pub fn apply_overrides(config: &mut EngineConfig, lookup: impl Fn(&str) -> Option<String>) {
    let parse = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());

    if let Some(v) = lookup("DECONFLICT_MAX_ITERATIONS").and_then(|s| s.trim().parse().ok()) {
        config.resolution.max_iterations = v;
    }
    if let Some(v) = parse("DECONFLICT_HORIZONTAL_NM") {
        config.separation.horizontal_nm = v;
    }
    if let Some(v) = lookup("DECONFLICT_VERTICAL_FT").and_then(|s| s.trim().parse().ok()) {
        config.separation.vertical_ft = v;
    }
    if let Some(v) = parse("DECONFLICT_MAX_DELAY_MIN") {
        config.resolution.max_delay_min = v;
    }
    if let Some(v) = lookup("DECONFLICT_ALTITUDE_STEP_FT").and_then(|s| s.trim().parse().ok()) {
        config.resolution.altitude_step_ft = v;
    }
    if let Some(v) = parse("DECONFLICT_HOTSPOT_RADIUS_NM") {
        config.hotspot.radius_nm = v;
    }
}

/// Built-in airports, extended by a JSON station file if given.
pub fn load_navdata(path: Option<&Path>) -> Result<NavDatabase> {
    let mut navdata = NavDatabase::builtin();
    if let Some(path) = path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading navdata {}", path.display()))?;
        let extra = NavDatabase::from_json(&text)
            .with_context(|| format!("loading navdata {}", path.display()))?;
        navdata.extend(extra.stations().cloned())?;
    }
    Ok(navdata)
}
