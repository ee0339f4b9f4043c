//! Snapshot → watched flights.
//!
//! The tracker body is walked as untyped JSON: a snapshot without the
//! `clients.pilots` list degrades to "no flights" instead of failing the cycle.

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    domain::{FlightId, FlightObservation, Location, WatchSet},
    fetcher::RawSnapshot,
};

const UNKNOWN_AIRCRAFT: &str = "Unknown";

/// Every pilot record in the snapshot, normalized, in provider order.
pub fn parse_observations(snapshot: &RawSnapshot) -> Vec<FlightObservation> {
    let Some(pilots) = snapshot
        .get("clients")
        .and_then(|c| c.get("pilots"))
        .and_then(Value::as_array)
    else {
        warn!("snapshot has no clients.pilots list; treating as zero flights");
        return Vec::new();
    };

    let observations: Vec<_> = pilots.iter().filter_map(parse_pilot).collect();
    debug!(
        pilots = pilots.len(),
        parsed = observations.len(),
        "parsed snapshot"
    );
    observations
}

/// Flights whose departure or arrival is on the watch-list, in provider order.
pub fn filter_flights(snapshot: &RawSnapshot, watch: &WatchSet) -> Vec<FlightObservation> {
    parse_observations(snapshot)
        .into_iter()
        .filter(|f| watch.contains(&f.departure) || watch.contains(&f.arrival))
        .collect()
}

fn parse_pilot(pilot: &Value) -> Option<FlightObservation> {
    let callsign = pilot
        .get("callsign")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let plan = pilot.get("flightPlan");
    let plan_str = |key: &str| plan.and_then(|p| p.get(key)).and_then(Value::as_str);

    Some(FlightObservation {
        id: FlightId(callsign.to_string()),
        aircraft: aircraft_type(pilot, plan).unwrap_or_else(|| UNKNOWN_AIRCRAFT.to_string()),
        departure: Location::from_optional(plan_str("departureId")),
        arrival: Location::from_optional(plan_str("arrivalId")),
    })
}

fn aircraft_type(pilot: &Value, plan: Option<&Value>) -> Option<String> {
    let candidates = [
        pilot.get("aircraft").and_then(Value::as_str),
        plan.and_then(|p| p.get("aircraftId")).and_then(Value::as_str),
        plan.and_then(|p| p.get("aircraft"))
            .and_then(|a| a.get("icaoCode"))
            .and_then(Value::as_str),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
