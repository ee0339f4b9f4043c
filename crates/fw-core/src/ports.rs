use async_trait::async_trait;

use crate::{
    domain::FlightEvent,
    fetcher::{FetchError, RawSnapshot},
    Result,
};

/// Hexagonal port for the flight-tracking provider.
///
/// One call is one outbound request; caching lives in `SnapshotFetcher`.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> std::result::Result<RawSnapshot, FetchError>;
}

/// Delivers detected events to their destination.
///
/// Called exactly once per emitted event. Implementations own any retry policy.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &FlightEvent) -> Result<()>;
}
