//! In-crate fakes for the ports.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    domain::FlightEvent,
    errors::Error,
    fetcher::{FetchError, RawSnapshot},
    ports::{Notifier, SnapshotSource},
    Result,
};

/// Source that replays queued outcomes, then answers with an empty snapshot.
#[derive(Default)]
pub struct ScriptedSource {
    calls: AtomicUsize,
    script: Mutex<VecDeque<std::result::Result<RawSnapshot, FetchError>>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push_ok(&self, snapshot: RawSnapshot) {
        self.script.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn push_err(&self, err: FetchError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(&self) -> std::result::Result<RawSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(json!({})))
    }
}

/// Notifier that records every event; optionally fails every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<FlightEvent>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn taken(&self) -> Vec<FlightEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &FlightEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(Error::External("channel unavailable".to_string()));
        }
        Ok(())
    }
}

/// Whazzup-shaped body with one pilot per `(callsign, departure, arrival)`.
pub fn whazzup(pilots: &[(&str, Option<&str>, Option<&str>)]) -> RawSnapshot {
    let pilots: Vec<_> = pilots
        .iter()
        .map(|(callsign, dep, arr)| {
            json!({
                "callsign": callsign,
                "flightPlan": {
                    "aircraftId": "B738",
                    "departureId": dep,
                    "arrivalId": arr,
                }
            })
        })
        .collect();
    json!({ "clients": { "pilots": pilots } })
}
