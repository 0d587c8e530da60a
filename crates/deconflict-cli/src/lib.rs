//! Deconflict CLI - command line tools for the flight deconfliction engine.
//!
//! This crate provides the CLI binaries:
//! - deconflict: analyze flight schedules and print reports
//! - generate_scenario: write synthetic input documents

pub mod config;
pub mod output;
pub mod sim;

pub use config::{apply_overrides, load_config, load_navdata};
pub use output::plan_reports;
