//! One detection cycle: fetch (cache-aware) → filter → detect → notify.
//!
//! `FlightMonitor` owns every piece of mutable state the bot has (snapshot
//! cache and observation window) and is shared between the periodic scheduler
//! and the chat command handlers behind an `Arc`.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    config::Config,
    detector::ObservationWindow,
    domain::{FlightObservation, WatchSet},
    fetcher::{FetchError, SnapshotFetcher},
    filter::filter_flights,
    ports::{Notifier, SnapshotSource},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was detected and the window was left untouched.
    FetchFailed(FetchError),
    Completed {
        matched: usize,
        events: usize,
        delivered: usize,
    },
}

#[derive(Clone, Debug)]
pub struct MonitorStatus {
    pub tracked: usize,
    pub cycles: u64,
    pub last_checked: Option<DateTime<Utc>>,
    pub cache_age: Option<Duration>,
}

pub struct FlightMonitor {
    fetcher: SnapshotFetcher,
    watch: WatchSet,
    window: Mutex<ObservationWindow>,
    notifier: Arc<dyn Notifier>,
}

impl FlightMonitor {
    pub fn new(
        fetcher: SnapshotFetcher,
        watch: WatchSet,
        window: ObservationWindow,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            fetcher,
            watch,
            window: Mutex::new(window),
            notifier,
        }
    }

    pub fn from_config(
        cfg: &Config,
        source: Arc<dyn SnapshotSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            SnapshotFetcher::new(source, cfg.cache_ttl),
            cfg.watch.clone(),
            ObservationWindow::new(cfg.window_grace_cycles).with_baseline(cfg.baseline_on_startup),
            notifier,
        )
    }

    pub fn watch(&self) -> &WatchSet {
        &self.watch
    }

    /// Run one detection cycle and deliver what it finds.
    ///
    /// Never fails: fetch errors are reported as `CycleOutcome::FetchFailed`,
    /// delivery errors are logged and counted.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let snapshot = match self.fetcher.get_snapshot().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "no flight data; skipping detection");
                return CycleOutcome::FetchFailed(e);
            }
        };

        let flights = filter_flights(&snapshot, &self.watch);
        let events = {
            let mut window = self.window.lock().await;
            window.detect(&flights, &self.watch, Utc::now())
        };

        let mut delivered = 0usize;
        for event in &events {
            match self.notifier.notify(event).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    callsign = %event.observation.id,
                    kind = event.kind.as_str(),
                    error = %e,
                    "notification not delivered"
                ),
            }
        }

        info!(
            matched = flights.len(),
            events = events.len(),
            delivered,
            "flight check complete"
        );
        CycleOutcome::Completed {
            matched: flights.len(),
            events: events.len(),
            delivered,
        }
    }

    /// Watched flights right now, without touching the observation window.
    pub async fn current_flights(&self) -> Result<Vec<FlightObservation>, FetchError> {
        let snapshot = self.fetcher.get_snapshot().await?;
        Ok(filter_flights(&snapshot, &self.watch))
    }

    pub async fn status(&self) -> MonitorStatus {
        let (tracked, cycles, last_checked) = {
            let w = self.window.lock().await;
            (w.len(), w.cycles(), w.last_checked())
        };
        MonitorStatus {
            tracked,
            cycles,
            last_checked,
            cache_age: self.fetcher.cache_age().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::EventKind,
        testing::{whazzup, RecordingNotifier, ScriptedSource},
    };

    fn monitor(
        source: Arc<ScriptedSource>,
        notifier: Arc<RecordingNotifier>,
        ttl: Duration,
    ) -> FlightMonitor {
        FlightMonitor::new(
            SnapshotFetcher::new(source, ttl),
            WatchSet::new(["OJAI"]).unwrap(),
            ObservationWindow::new(3),
            notifier,
        )
    }

    #[tokio::test]
    async fn scenario_single_departure_then_quiet() {
        let source = Arc::new(ScriptedSource::new().with_delay(Duration::from_millis(1)));
        let snap = whazzup(&[("UAL123", Some("OJAI"), Some("ORBI"))]);
        source.push_ok(snap.clone());
        source.push_ok(snap);
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(source.clone(), notifier.clone(), Duration::ZERO);

        assert_eq!(
            m.run_cycle().await,
            CycleOutcome::Completed {
                matched: 1,
                events: 1,
                delivered: 1
            }
        );
        let sent = notifier.taken();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, EventKind::Departure);
        assert_eq!(sent[0].observation.id.0, "UAL123");

        assert_eq!(
            m.run_cycle().await,
            CycleOutcome::Completed {
                matched: 1,
                events: 0,
                delivered: 0
            }
        );
        assert!(notifier.taken().is_empty());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_skips_detection_and_keeps_boundary() {
        let source = Arc::new(ScriptedSource::new().with_delay(Duration::from_millis(1)));
        let snap = whazzup(&[("RJA7", Some("OJAI"), None)]);
        source.push_ok(snap.clone());
        source.push_err(FetchError::Status(502));
        source.push_ok(snap);
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(source.clone(), notifier.clone(), Duration::ZERO);

        m.run_cycle().await;
        assert_eq!(notifier.taken().len(), 1);
        let before = m.status().await;

        let outcome = m.run_cycle().await;
        assert_eq!(outcome, CycleOutcome::FetchFailed(FetchError::Status(502)));
        let after = m.status().await;
        assert_eq!(after.cycles, before.cycles);
        assert_eq!(after.last_checked, before.last_checked);
        assert_eq!(after.tracked, before.tracked);

        // Same data as the last good cycle: still not new.
        m.run_cycle().await;
        assert!(notifier.taken().is_empty());
        assert_eq!(m.status().await.cycles, 2);
    }

    #[tokio::test]
    async fn delivery_failures_do_not_abort_or_retry() {
        let source = Arc::new(ScriptedSource::new());
        source.push_ok(whazzup(&[
            ("A1", Some("OJAI"), None),
            ("A2", None, Some("OJAI")),
        ]));
        let notifier = Arc::new(RecordingNotifier::failing());
        let m = monitor(source, notifier.clone(), Duration::from_secs(120));

        assert_eq!(
            m.run_cycle().await,
            CycleOutcome::Completed {
                matched: 2,
                events: 2,
                delivered: 0
            }
        );
        assert_eq!(notifier.taken().len(), 2);

        // Served from cache; nothing re-sent.
        m.run_cycle().await;
        assert!(notifier.taken().is_empty());
    }

    #[tokio::test]
    async fn malformed_snapshot_completes_with_no_events() {
        let source = Arc::new(ScriptedSource::new());
        source.push_ok(serde_json::json!({ "unexpected": true }));
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(source, notifier.clone(), Duration::from_secs(120));

        assert_eq!(
            m.run_cycle().await,
            CycleOutcome::Completed {
                matched: 0,
                events: 0,
                delivered: 0
            }
        );
        assert_eq!(m.status().await.cycles, 1);
    }

    #[tokio::test]
    async fn listing_does_not_consume_events() {
        let source = Arc::new(ScriptedSource::new());
        source.push_ok(whazzup(&[("L1", Some("OJAI"), None)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(source.clone(), notifier.clone(), Duration::from_secs(120));

        let flights = m.current_flights().await.unwrap();
        assert_eq!(flights.len(), 1);

        m.run_cycle().await;
        assert_eq!(notifier.taken().len(), 1);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn listing_and_cycle_share_one_request() {
        let source = Arc::new(ScriptedSource::new().with_delay(Duration::from_millis(50)));
        source.push_ok(whazzup(&[("C1", Some("OJAI"), None)]));
        let notifier = Arc::new(RecordingNotifier::default());
        let m = monitor(source.clone(), notifier.clone(), Duration::from_secs(120));

        let (listing, outcome) = tokio::join!(m.current_flights(), m.run_cycle());
        assert_eq!(listing.unwrap().len(), 1);
        assert!(matches!(outcome, CycleOutcome::Completed { events: 1, .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn status_answers_while_a_slow_fetch_is_pending() {
        let slow = Arc::new(ScriptedSource::new().with_delay(Duration::from_secs(2)));
        let m = Arc::new(monitor(
            slow.clone(),
            Arc::new(RecordingNotifier::default()),
            Duration::ZERO,
        ));
        let cycle = tokio::spawn({
            let m = m.clone();
            async move { m.run_cycle().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(slow.calls(), 1);

        let status = tokio::time::timeout(Duration::from_millis(500), m.status())
            .await
            .expect("status waited on the network");
        assert_eq!(status.cycles, 0);
        assert_eq!(status.cache_age, None);
        cycle.abort();
    }

    #[tokio::test]
    async fn listing_reports_fetch_failure() {
        let source = Arc::new(ScriptedSource::new());
        source.push_err(FetchError::Request("timeout".into()));
        let m = monitor(
            source,
            Arc::new(RecordingNotifier::default()),
            Duration::from_secs(120),
        );
        assert!(m.current_flights().await.is_err());
        assert_eq!(m.status().await.cycles, 0);
    }
}
