//! Iterative conflict resolution.
//!
//! Each pass detects conflicts on the current snapshot, selects the single
//! most urgent resolvable conflict and applies one mitigation (a delay or
//! an altitude change) to one of its flights. The mitigated flight set
//! becomes the next snapshot. The loop ends when no conflict remains, when
//! only unresolvable conflicts remain, or at the iteration cap.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, RouteGeometry};
use crate::conflict::{Conflict, ConflictDetector, PairKey};
use crate::models::Flight;
use crate::trajectory::Trajectory;

/// Immutable, versioned view of the flight set.
///
/// Version `k` is the state after the `k`-th applied action. Untouched
/// flights are shared with the previous version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: usize,
    flights: Vec<Arc<Flight>>,
    index: Arc<HashMap<String, usize>>,
}

impl Snapshot {
    pub fn new(flights: Vec<Flight>) -> Self {
        let index = flights
            .iter()
            .enumerate()
            .map(|(i, f)| (f.acid.clone(), i))
            .collect();
        Self {
            version: 0,
            flights: flights.into_iter().map(Arc::new).collect(),
            index: Arc::new(index),
        }
    }

    pub fn flights(&self) -> impl Iterator<Item = &Flight> {
        self.flights.iter().map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn flight(&self, acid: &str) -> Option<&Flight> {
        self.index.get(acid).map(|&i| self.flights[i].as_ref())
    }

    /// Next version with `updated` replacing the flight of the same acid.
    pub fn with_flight(&self, updated: Flight) -> Snapshot {
        let mut flights = self.flights.clone();
        if let Some(&i) = self.index.get(&updated.acid) {
            flights[i] = Arc::new(updated);
        }
        Snapshot {
            version: self.version + 1,
            flights,
            index: Arc::clone(&self.index),
        }
    }

    /// True when both versions hold the same `Arc` for `acid`.
    pub fn shares_flight(&self, other: &Snapshot, acid: &str) -> bool {
        match (self.index.get(acid), other.index.get(acid)) {
            (Some(&i), Some(&j)) => Arc::ptr_eq(&self.flights[i], &other.flights[j]),
            _ => false,
        }
    }

    pub fn trajectories(&self, geometry: RouteGeometry) -> Vec<Trajectory> {
        self.flights
            .iter()
            .map(|f| Trajectory::from_flight(f, geometry))
            .collect()
    }
}

/// A mutation applied to one flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    /// Additional delay applied in this action
    Delay { delay_min: f64 },
    AltitudeChange { from_alt: i32, to_alt: i32 },
}

/// Append-only log entry for one applied mitigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionAction {
    pub iter: usize,
    pub acid: String,
    #[serde(flatten)]
    pub kind: ActionKind,
    /// The other flight of the conflict this action resolved
    pub conflict_with: String,
}

/// A flight state value, hashable for the attempt set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MitigationValue {
    /// Accumulated delay, whole seconds
    Delay(i64),
    Altitude(i32),
}

impl MitigationValue {
    pub fn delay(delay_min: f64) -> Self {
        MitigationValue::Delay(delay_seconds(delay_min))
    }
}

fn delay_seconds(delay_min: f64) -> i64 {
    (delay_min * 60.0).round() as i64
}

/// Delay and altitude of a flight, as compared by the attempt set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlightState {
    /// Accumulated delay, whole seconds
    pub delay_s: i64,
    pub altitude_ft: i32,
}

impl FlightState {
    pub fn of(flight: &Flight) -> Self {
        Self {
            delay_s: delay_seconds(flight.delay_min),
            altitude_ft: flight.altitude_ft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Attempt {
    acid: String,
    value: MitigationValue,
    /// State of the pair's other flight when the value was recorded
    other: FlightState,
}

/// Per-pair record of flight states already seen in conflict.
///
/// Each time a pair is selected, both flights' current delay and altitude
/// are recorded against it together with the other flight's state. A
/// recorded value is blocked for its flight while resolving the same pair,
/// and while resolving any other pair as long as the recorded counterpart
/// has not moved. A flight therefore cannot be pushed back into a conflict
/// it already left.
#[derive(Debug, Clone, Default)]
pub struct AttemptSet {
    tried: HashMap<PairKey, HashSet<Attempt>>,
}

impl AttemptSet {
    pub fn record(
        &mut self,
        pair: &PairKey,
        acid: &str,
        value: MitigationValue,
        other: FlightState,
    ) -> bool {
        self.tried.entry(pair.clone()).or_default().insert(Attempt {
            acid: acid.to_string(),
            value,
            other,
        })
    }

    /// Record both flights' current delay and altitude against their pair.
    pub fn record_selection(&mut self, a: &Flight, b: &Flight) {
        let pair = PairKey::new(&a.acid, &b.acid);
        for (flight, other) in [(a, b), (b, a)] {
            let other = FlightState::of(other);
            self.record(&pair, &flight.acid, MitigationValue::delay(flight.delay_min), other);
            self.record(&pair, &flight.acid, MitigationValue::Altitude(flight.altitude_ft), other);
        }
    }

    /// True when moving `acid` to `value` would revert it to a state
    /// recorded in conflict: for `current` unconditionally, for any other
    /// pair only while that pair's other flight is unchanged in `snapshot`.
    pub fn blocks(
        &self,
        current: &PairKey,
        acid: &str,
        value: MitigationValue,
        snapshot: &Snapshot,
    ) -> bool {
        self.tried
            .iter()
            .filter(|(pair, _)| pair.first == acid || pair.second == acid)
            .any(|(pair, attempts)| {
                let other_now = snapshot.flight(pair.other(acid)).map(FlightState::of);
                attempts.iter().any(|a| {
                    a.acid == acid
                        && a.value == value
                        && (pair == current || other_now == Some(a.other))
                })
            })
    }
}

/// Every conflict episode observed during a run.
///
/// A pair opens an episode when it appears in a detection pass after being
/// absent from the previous one.
#[derive(Debug, Clone, Default)]
pub struct ConflictLedger {
    open: HashSet<PairKey>,
    records: Vec<Conflict>,
}

impl ConflictLedger {
    /// Feed one detection pass; returns how many new episodes it opened.
    pub fn observe(&mut self, conflicts: &[Conflict]) -> usize {
        let current: HashSet<PairKey> = conflicts.iter().map(Conflict::pair).collect();
        let mut opened = 0;
        for conflict in conflicts {
            if !self.open.contains(&conflict.pair()) {
                self.records.push(conflict.clone());
                opened += 1;
            }
        }
        self.open = current;
        opened
    }

    pub fn records(&self) -> &[Conflict] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Conflict> {
        self.records
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No conflicts remain
    Resolved,
    /// Only conflicts marked unresolvable remain
    Exhausted,
    /// The iteration cap was reached with conflicts remaining
    IterationCap,
}

/// Everything the report needs from a finished run.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub final_snapshot: Snapshot,
    /// All versions, `snapshots[k]` being the state after action `k`
    pub snapshots: Vec<Snapshot>,
    pub actions: Vec<ResolutionAction>,
    /// Conflict episodes recorded across the run
    pub history: Vec<Conflict>,
    /// Conflicts open at termination
    pub remaining: Vec<Conflict>,
    pub unresolvable: BTreeSet<PairKey>,
    pub iterations: usize,
    pub termination: Termination,
}

struct Mitigation {
    flight: Flight,
    kind: ActionKind,
    conflict_with: String,
}

/// Drives the detect, select, mitigate loop.
#[derive(Debug, Clone)]
pub struct ResolutionScheduler {
    config: EngineConfig,
    detector: ConflictDetector,
}

impl ResolutionScheduler {
    /// The configuration is expected to be validated already.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            detector: ConflictDetector::new(config),
        }
    }

    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    pub fn run(&self, initial: Snapshot) -> ResolutionOutcome {
        let geometry = self.config.route_geometry;
        let max_iterations = self.config.resolution.max_iterations;

        let mut current = initial;
        let mut snapshots = vec![current.clone()];
        let mut actions: Vec<ResolutionAction> = Vec::new();
        let mut attempts = AttemptSet::default();
        let mut ledger = ConflictLedger::default();
        let mut unresolvable: BTreeSet<PairKey> = BTreeSet::new();
        let mut iterations = 0usize;

        let (termination, remaining) = loop {
            let conflicts = self
                .detector
                .detect_conflicts(&current.trajectories(geometry));
            let opened = ledger.observe(&conflicts);
            debug!(
                "Pass {}: {} conflict(s), {} new",
                iterations,
                conflicts.len(),
                opened
            );

            if conflicts.is_empty() {
                break (Termination::Resolved, conflicts);
            }
            if iterations >= max_iterations {
                warn!(
                    "Iteration cap {} reached with {} conflict(s) remaining",
                    max_iterations,
                    conflicts.len()
                );
                break (Termination::IterationCap, conflicts);
            }

            let mut candidates: Vec<&Conflict> = conflicts
                .iter()
                .filter(|c| !unresolvable.contains(&c.pair()))
                .collect();
            candidates.sort_by(|a, b| a.resolution_order(b));

            let mut applied = None;
            for conflict in candidates {
                match self.mitigate(&current, conflict, &mut attempts) {
                    Some(mitigation) => {
                        applied = Some(mitigation);
                        break;
                    }
                    None => {
                        warn!(
                            "No mitigation left for {} ({:?}, {:.2} NM); marking unresolvable",
                            conflict.pair(),
                            conflict.severity,
                            conflict.horizontal_nm
                        );
                        unresolvable.insert(conflict.pair());
                    }
                }
            }

            let Some(mitigation) = applied else {
                break (Termination::Exhausted, conflicts);
            };

            iterations += 1;
            let action = ResolutionAction {
                iter: iterations,
                acid: mitigation.flight.acid.clone(),
                kind: mitigation.kind,
                conflict_with: mitigation.conflict_with,
            };
            info!(
                "Iteration {}: {} {:?} (conflict with {})",
                action.iter, action.acid, action.kind, action.conflict_with
            );
            actions.push(action);
            current = current.with_flight(mitigation.flight);
            snapshots.push(current.clone());
        };

        info!(
            "Resolution finished: {:?} after {} iteration(s), {} action(s), {} conflict(s) remaining",
            termination,
            iterations,
            actions.len(),
            remaining.len()
        );

        ResolutionOutcome {
            final_snapshot: current,
            snapshots,
            actions,
            history: ledger.into_records(),
            remaining,
            unresolvable,
            iterations,
            termination,
        }
    }

    /// Pick a flight of the pair and a new value that clears the pair.
    ///
    /// Order: delay the give-way flight, delay the other, then altitude
    /// change in the same flight order.
    fn mitigate(
        &self,
        snapshot: &Snapshot,
        conflict: &Conflict,
        attempts: &mut AttemptSet,
    ) -> Option<Mitigation> {
        let pair = conflict.pair();
        let a = snapshot.flight(&pair.first)?;
        let b = snapshot.flight(&pair.second)?;

        attempts.record_selection(a, b);

        let (first, second) = if a.mitigation_priority() <= b.mitigation_priority() {
            (a, b)
        } else {
            (b, a)
        };
        let order = [(first, second), (second, first)];

        order
            .iter()
            .find_map(|(mover, other)| self.try_delay(snapshot, &pair, mover, other, attempts))
            .or_else(|| {
                order.iter().find_map(|(mover, other)| {
                    self.try_altitude(snapshot, &pair, mover, other, attempts)
                })
            })
    }

    fn try_delay(
        &self,
        snapshot: &Snapshot,
        pair: &PairKey,
        mover: &Flight,
        other: &Flight,
        attempts: &AttemptSet,
    ) -> Option<Mitigation> {
        let limits = &self.config.resolution;
        let other_traj = Trajectory::from_flight(other, self.config.route_geometry);

        (1..=limits.delay_steps())
            .map(|k| mover.delay_min + limits.delay_step_min * f64::from(k))
            .take_while(|&total| total <= limits.max_delay_min + 1e-9)
            .find_map(|total| {
                if attempts.blocks(pair, &mover.acid, MitigationValue::delay(total), snapshot) {
                    return None;
                }
                let candidate = mover.with_delay(total);
                if !self.clears(&candidate, &other_traj) {
                    return None;
                }
                debug!("{}: delay to {:.1} min clears {}", mover.acid, total, pair);
                Some(Mitigation {
                    kind: ActionKind::Delay {
                        delay_min: total - mover.delay_min,
                    },
                    flight: candidate,
                    conflict_with: other.acid.clone(),
                })
            })
    }

    fn try_altitude(
        &self,
        snapshot: &Snapshot,
        pair: &PairKey,
        mover: &Flight,
        other: &Flight,
        attempts: &AttemptSet,
    ) -> Option<Mitigation> {
        let limits = &self.config.resolution;
        let other_traj = Trajectory::from_flight(other, self.config.route_geometry);
        // Move away from the other flight first
        let directions: [i64; 2] = if other.altitude_ft > mover.altitude_ft {
            [-1, 1]
        } else {
            [1, -1]
        };
        let min_alt = i64::from(limits.min_altitude_ft);
        let max_alt = i64::from(limits.max_altitude_ft);

        for k in 1..=limits.altitude_steps() {
            for dir in directions {
                let to_alt =
                    i64::from(mover.altitude_ft) + dir * k * i64::from(limits.altitude_step_ft);
                if to_alt < min_alt || to_alt > max_alt {
                    continue;
                }
                // Within the i32 altitude band checked above
                let to_alt = to_alt as i32;
                if attempts.blocks(pair, &mover.acid, MitigationValue::Altitude(to_alt), snapshot) {
                    continue;
                }
                let candidate = mover.with_altitude(to_alt);
                if self.clears(&candidate, &other_traj) {
                    debug!("{}: altitude {} ft clears {}", mover.acid, to_alt, pair);
                    return Some(Mitigation {
                        kind: ActionKind::AltitudeChange {
                            from_alt: mover.altitude_ft,
                            to_alt,
                        },
                        flight: candidate,
                        conflict_with: other.acid.clone(),
                    });
                }
            }
        }
        None
    }

    fn clears(&self, candidate: &Flight, other: &Trajectory) -> bool {
        let traj = Trajectory::from_flight(candidate, self.config.route_geometry);
        self.detector.check_pair(&traj, other).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::Severity;
    use crate::models::FlightRecord;
    use crate::navdata::{NavDatabase, Station};
    use serde_json::json;

    fn nav() -> NavDatabase {
        let mut nav = NavDatabase::new();
        nav.extend([
            Station::airport("WEST", 0.0, -1.0),
            Station::airport("EAST", 0.0, 1.0),
            Station::airport("SOUTH", -1.0, 0.0),
            Station::airport("NORTH", 1.0, 0.0),
            Station::airport("SW", -0.7071, -0.7071),
            Station::airport("NE", 0.7071, 0.7071),
        ])
        .unwrap();
        nav
    }

    fn flight(acid: &str, from: &str, to: &str, passengers: i64, cargo: bool) -> Flight {
        flight_at(acid, from, to, passengers, cargo, 35000)
    }

    fn flight_at(
        acid: &str,
        from: &str,
        to: &str,
        passengers: i64,
        cargo: bool,
        altitude: i32,
    ) -> Flight {
        let record: FlightRecord = serde_json::from_value(json!({
            "acid": acid,
            "departure": from,
            "arrival": to,
            "altitude": altitude,
            "speed": 480,
            "passengers": passengers,
            "is_cargo": cargo,
            "departure_time": "2024-01-01T12:00:00Z"
        }))
        .unwrap();
        record.validate(&nav()).unwrap()
    }

    fn crossing() -> Vec<Flight> {
        vec![
            flight("AAA1", "WEST", "EAST", 180, false),
            flight("BBB2", "SOUTH", "NORTH", 90, false),
        ]
    }

    #[test]
    fn test_fewer_passengers_delayed_first() {
        let scheduler = ResolutionScheduler::new(&EngineConfig::default());
        let outcome = scheduler.run(Snapshot::new(crossing()));

        assert_eq!(outcome.termination, Termination::Resolved);
        assert_eq!(outcome.actions.len(), 1);
        let action = &outcome.actions[0];
        assert_eq!(action.iter, 1);
        assert_eq!(action.acid, "BBB2");
        assert_eq!(action.conflict_with, "AAA1");
        assert_eq!(action.kind, ActionKind::Delay { delay_min: 5.0 });
        assert_eq!(outcome.history.len(), 1);
        assert!(outcome.remaining.is_empty());
    }

    #[test]
    fn test_cargo_delayed_before_passenger_flight() {
        let flights = vec![
            flight("AAA1", "WEST", "EAST", 20, false),
            flight("BBB2", "SOUTH", "NORTH", 0, true),
        ];
        let outcome = ResolutionScheduler::new(&EngineConfig::default()).run(Snapshot::new(flights));
        assert_eq!(outcome.actions[0].acid, "BBB2");
    }

    #[test]
    fn test_altitude_fallback_when_delay_disabled() {
        let mut config = EngineConfig::default();
        config.resolution.max_delay_min = 0.0;
        let outcome = ResolutionScheduler::new(&config).run(Snapshot::new(crossing()));

        assert_eq!(outcome.termination, Termination::Resolved);
        assert_eq!(
            outcome.actions[0].kind,
            ActionKind::AltitudeChange {
                from_alt: 35000,
                to_alt: 36000
            }
        );
        let moved = outcome.final_snapshot.flight("BBB2").unwrap();
        assert_eq!(moved.altitude_ft, 36000);
        assert_eq!(moved.filed_altitude_ft, 35000);
    }

    #[test]
    fn test_unresolvable_when_budgets_exhausted() {
        let mut config = EngineConfig::default();
        config.resolution.max_delay_min = 0.0;
        config.resolution.max_altitude_steps = 0;
        let outcome = ResolutionScheduler::new(&config).run(Snapshot::new(crossing()));

        assert_eq!(outcome.termination, Termination::Exhausted);
        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.remaining.len(), 1);
        assert!(outcome.unresolvable.contains(&PairKey::new("AAA1", "BBB2")));
    }

    #[test]
    fn test_iteration_cap_is_hard_bound() {
        let mut config = EngineConfig::default();
        config.resolution.max_iterations = 0;
        let outcome = ResolutionScheduler::new(&config).run(Snapshot::new(crossing()));
        assert_eq!(outcome.termination, Termination::IterationCap);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.remaining[0].severity, Severity::Critical);
    }

    #[test]
    fn test_snapshots_change_only_acting_flight() {
        let scheduler = ResolutionScheduler::new(&EngineConfig::default());
        let outcome = scheduler.run(Snapshot::new(crossing()));

        assert_eq!(outcome.snapshots.len(), outcome.actions.len() + 1);
        for (k, action) in outcome.actions.iter().enumerate() {
            let before = &outcome.snapshots[k];
            let after = &outcome.snapshots[k + 1];
            assert_eq!(after.version, action.iter);
            for f in before.flights() {
                let shared = before.shares_flight(after, &f.acid);
                assert_eq!(shared, f.acid != action.acid, "flight {}", f.acid);
            }
        }
    }

    #[test]
    fn test_attempt_set_blocks_repeats() {
        let mut attempts = AttemptSet::default();
        let pair = PairKey::new("A", "B");
        let other = FlightState {
            delay_s: 0,
            altitude_ft: 35000,
        };
        let level = MitigationValue::Altitude(35000);
        let empty = Snapshot::new(Vec::new());
        assert!(attempts.record(&pair, "A", level, other));
        assert!(!attempts.record(&pair, "A", level, other));
        assert!(attempts.blocks(&pair, "A", level, &empty));
        assert!(!attempts.blocks(&pair, "B", level, &empty));
        assert!(!attempts.blocks(&PairKey::new("A", "C"), "A", level, &empty));
        assert_eq!(MitigationValue::delay(5.0), MitigationValue::Delay(300));
    }

    #[test]
    fn test_attempt_blocks_other_pair_while_partner_unchanged() {
        let a = flight("AAA1", "WEST", "EAST", 0, true);
        let b = flight("BBB2", "SOUTH", "NORTH", 90, false);
        let c = flight_at("CCC3", "SW", "NE", 120, false, 36500);
        let snapshot = Snapshot::new(vec![a.clone(), b.clone(), c]);

        let mut attempts = AttemptSet::default();
        attempts.record_selection(&a, &b);

        let ab = PairKey::new("AAA1", "BBB2");
        let ac = PairKey::new("AAA1", "CCC3");
        let back = MitigationValue::Altitude(35000);
        assert!(attempts.blocks(&ab, "AAA1", back, &snapshot));
        assert!(attempts.blocks(&ac, "AAA1", back, &snapshot));
        assert!(!attempts.blocks(&ac, "AAA1", MitigationValue::Altitude(34000), &snapshot));
        assert!(!attempts.blocks(&ac, "CCC3", back, &snapshot));

        // Once BBB2 has moved, the old AAA1/BBB2 geometry no longer applies
        let moved = snapshot.with_flight(b.with_altitude(37000));
        assert!(!attempts.blocks(&ac, "AAA1", back, &moved));
        assert!(attempts.blocks(&ab, "AAA1", back, &moved));
    }

    #[test]
    fn test_no_flip_back_into_cleared_conflict() {
        let mut config = EngineConfig::default();
        config.resolution.max_delay_min = 0.0;
        config.resolution.max_iterations = 20;
        let flights = vec![
            flight("AAA1", "WEST", "EAST", 0, true),
            flight("BBB2", "SOUTH", "NORTH", 90, false),
            flight_at("CCC3", "SW", "NE", 120, false, 36500),
        ];
        let outcome = ResolutionScheduler::new(&config).run(Snapshot::new(flights));

        assert_eq!(outcome.termination, Termination::Resolved);
        let kinds: Vec<_> = outcome
            .actions
            .iter()
            .map(|a| (a.acid.as_str(), a.kind.clone()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (
                    "AAA1",
                    ActionKind::AltitudeChange {
                        from_alt: 35000,
                        to_alt: 36000
                    }
                ),
                (
                    "AAA1",
                    ActionKind::AltitudeChange {
                        from_alt: 36000,
                        to_alt: 34000
                    }
                ),
            ]
        );
        assert_eq!(outcome.actions[1].conflict_with, "CCC3");
        assert!(outcome.remaining.is_empty());
    }

    #[test]
    fn test_oversized_altitude_budget_stays_in_band() {
        let mut config = EngineConfig::default();
        config.resolution.max_delay_min = 0.0;
        config.resolution.max_altitude_steps = u32::MAX;
        config.resolution.altitude_step_ft = i32::MAX;
        config.resolution.min_altitude_ft = 1;
        config.resolution.max_altitude_ft = i32::MAX;
        let outcome = ResolutionScheduler::new(&config).run(Snapshot::new(crossing()));

        // One step either way leaves the band, so nothing is applied
        assert_eq!(outcome.termination, Termination::Exhausted);
        assert!(outcome.actions.is_empty());

        let mut config = EngineConfig::default();
        config.resolution.max_delay_min = 0.0;
        config.resolution.max_altitude_steps = u32::MAX;
        let outcome = ResolutionScheduler::new(&config).run(Snapshot::new(crossing()));
        assert_eq!(outcome.termination, Termination::Resolved);
        assert_eq!(
            outcome.actions[0].kind,
            ActionKind::AltitudeChange {
                from_alt: 35000,
                to_alt: 36000
            }
        );
    }

    #[test]
    fn test_tried_altitude_is_skipped() {
        let mut config = EngineConfig::default();
        config.resolution.max_delay_min = 0.0;
        let scheduler = ResolutionScheduler::new(&config);
        let snapshot = Snapshot::new(crossing());
        let detector = scheduler.detector();
        let conflict = detector
            .detect_conflicts(&snapshot.trajectories(RouteGeometry::GreatCircle))
            .remove(0);

        let mut attempts = AttemptSet::default();
        let pair = conflict.pair();
        let other = FlightState::of(snapshot.flight("AAA1").unwrap());
        attempts.record(&pair, "BBB2", MitigationValue::Altitude(36000), other);
        let mitigation = scheduler.mitigate(&snapshot, &conflict, &mut attempts).unwrap();
        assert_eq!(
            mitigation.kind,
            ActionKind::AltitudeChange {
                from_alt: 35000,
                to_alt: 34000
            }
        );
        assert!(attempts.blocks(&pair, "AAA1", MitigationValue::Altitude(35000), &snapshot));
    }

    #[test]
    fn test_ledger_counts_episodes() {
        let scheduler = ResolutionScheduler::new(&EngineConfig::default());
        let snapshot = Snapshot::new(crossing());
        let conflicts = scheduler
            .detector()
            .detect_conflicts(&snapshot.trajectories(RouteGeometry::GreatCircle));

        let mut ledger = ConflictLedger::default();
        assert_eq!(ledger.observe(&conflicts), 1);
        assert_eq!(ledger.observe(&conflicts), 0);
        assert_eq!(ledger.observe(&[]), 0);
        assert_eq!(ledger.observe(&conflicts), 1);
        assert_eq!(ledger.records().len(), 2);
    }

    #[test]
    fn test_action_serialization() {
        let action = ResolutionAction {
            iter: 3,
            acid: "ACA1".into(),
            kind: ActionKind::AltitudeChange {
                from_alt: 35000,
                to_alt: 36000,
            },
            conflict_with: "WJA2".into(),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({
                "iter": 3,
                "acid": "ACA1",
                "action": "altitude_change",
                "from_alt": 35000,
                "to_alt": 36000,
                "conflict_with": "WJA2"
            })
        );

        let delay = ResolutionAction {
            kind: ActionKind::Delay { delay_min: 5.0 },
            ..action
        };
        let value = serde_json::to_value(&delay).unwrap();
        assert_eq!(value["action"], "delay");
        assert_eq!(value["delay_min"], 5.0);
        assert!(value.get("from_alt").is_none());
    }
}
