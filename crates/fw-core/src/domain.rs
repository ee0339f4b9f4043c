use std::{collections::BTreeSet, fmt};

use crate::{errors::Error, Result};

/// Chat id on the messaging platform (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message id on the messaging platform (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Flight identity (the pilot callsign).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlightId(pub String);

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Airport code from a flight plan, or the `Unknown` sentinel when the plan
/// does not name one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    Code(String),
    Unknown,
}

impl Location {
    /// Normalize an optional provider field. Blank strings count as missing.
    pub fn from_optional(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(code) if !code.is_empty() => Location::Code(code.to_string()),
            _ => Location::Unknown,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Location::Code(c) => Some(c),
            Location::Unknown => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Code(c) => f.write_str(c),
            Location::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Normalized view of one provider record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightObservation {
    pub id: FlightId,
    pub aircraft: String,
    pub departure: Location,
    pub arrival: Location,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Departure,
    Arrival,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Departure => "departure",
            EventKind::Arrival => "arrival",
        }
    }
}

/// A notification-worthy departure or arrival.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightEvent {
    pub kind: EventKind,
    pub observation: FlightObservation,
}

/// Fixed, non-empty set of airport codes to watch.
///
/// Membership is an exact string match; `Location::Unknown` is never a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchSet {
    codes: BTreeSet<String>,
}

impl WatchSet {
    pub fn new<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes: BTreeSet<String> = codes
            .into_iter()
            .map(Into::into)
            .filter(|c| !c.trim().is_empty())
            .collect();
        if codes.is_empty() {
            return Err(Error::Config(
                "watch-list must contain at least one location code".to_string(),
            ));
        }
        Ok(Self { codes })
    }

    pub fn contains(&self, location: &Location) -> bool {
        location
            .code()
            .map(|c| self.codes.contains(c))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}
