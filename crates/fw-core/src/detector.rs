//! Identity-based change detection.
//!
//! A flight is "new" for a kind (departure/arrival) the first successful cycle
//! it is observed with a watched location for that kind. The window remembers
//! `(callsign, kind)` pairs together with the last cycle they were observed in.
//!
//! Eviction: an entry survives up to `grace_cycles` consecutive successful
//! cycles without being observed; the next miss evicts it, and a later
//! reappearance of the same callsign is reported again. Only successful cycles
//! count, so a provider outage never evicts anything.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{EventKind, FlightEvent, FlightId, FlightObservation, WatchSet};

#[derive(Debug)]
pub struct ObservationWindow {
    seen: HashMap<(FlightId, EventKind), u64>,
    cycle: u64,
    last_checked: Option<DateTime<Utc>>,
    grace_cycles: u64,
    baseline_pending: bool,
}

impl ObservationWindow {
    pub fn new(grace_cycles: u64) -> Self {
        Self {
            seen: HashMap::new(),
            cycle: 0,
            last_checked: None,
            grace_cycles,
            baseline_pending: false,
        }
    }

    /// Record the first successful cycle silently (flights already in progress
    /// at startup are treated as known).
    pub fn with_baseline(mut self, baseline: bool) -> Self {
        self.baseline_pending = baseline;
        self
    }

    /// Run one detection cycle over a successfully fetched, filtered snapshot.
    ///
    /// Must not be called when the fetch failed: the cycle counter and the
    /// `last_checked` boundary only move here.
    pub fn detect(
        &mut self,
        observations: &[FlightObservation],
        watch: &WatchSet,
        now: DateTime<Utc>,
    ) -> Vec<FlightEvent> {
        let cycle = self.cycle + 1;
        let silent = self.baseline_pending;
        let mut events = Vec::new();

        for obs in observations {
            for (kind, location) in [
                (EventKind::Departure, &obs.departure),
                (EventKind::Arrival, &obs.arrival),
            ] {
                if !watch.contains(location) {
                    continue;
                }
                let previous = self.seen.insert((obs.id.clone(), kind), cycle);
                if previous.is_none() && !silent {
                    events.push(FlightEvent {
                        kind,
                        observation: obs.clone(),
                    });
                }
            }
        }

        let evicted = self.prune(cycle);
        self.cycle = cycle;
        self.last_checked = Some(now);
        self.baseline_pending = false;

        debug!(
            cycle,
            events = events.len(),
            tracked = self.seen.len(),
            evicted,
            baseline = silent,
            "detection cycle complete"
        );
        events
    }

    fn prune(&mut self, cycle: u64) -> usize {
        let grace = self.grace_cycles;
        let before = self.seen.len();
        self.seen
            .retain(|_, last_seen| cycle.saturating_sub(*last_seen) <= grace);
        before - self.seen.len()
    }

    /// Number of tracked `(flight, kind)` pairs.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn contains(&self, id: &FlightId, kind: EventKind) -> bool {
        self.seen.contains_key(&(id.clone(), kind))
    }

    /// Successful cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }
}
