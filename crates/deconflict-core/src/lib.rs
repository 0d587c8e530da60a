pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod hotspot;
pub mod models;
pub mod navdata;
pub mod report;
pub mod resolution;
pub mod spatial;
pub mod trajectory;

pub use config::{
    ConflictBasis, EngineConfig, HotspotConfig, ReportConfig, ResolutionLimits, RouteGeometry,
    SeparationRules, SeverityThresholds,
};
pub use conflict::{Conflict, ConflictDetector, PairKey, Severity};
pub use engine::{Engine, Ingested};
pub use error::{ConfigError, Error, Result, ValidationError};
pub use hotspot::{Hotspot, HotspotAggregator};
pub use models::{Flight, FlightRecord, Timestamp};
pub use navdata::{NavDatabase, Station, StationKind};
pub use report::{
    AircraftCount, AnalysisReport, Charts, ConflictRow, ConflictStatus, FlightRow, HourCount,
    Rejection, SeverityCount, Summary, Tables,
};
pub use resolution::{
    ActionKind, AttemptSet, ConflictLedger, FlightState, MitigationValue, ResolutionAction,
    ResolutionOutcome, ResolutionScheduler, Snapshot, Termination,
};
pub use spatial::{haversine_distance_nm, GeoPoint};
pub use trajectory::{Position, Trajectory};
