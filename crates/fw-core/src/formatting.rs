//! Message texts (Telegram HTML parse mode).

use chrono::{DateTime, Utc};

use crate::domain::{EventKind, FlightEvent, FlightObservation};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One notification line per event.
pub fn event_line(event: &FlightEvent) -> String {
    let obs = &event.observation;
    match event.kind {
        EventKind::Departure => format!("New departure: {} from {}", obs.aircraft, obs.departure),
        EventKind::Arrival => format!("New arrival: {} at {}", obs.aircraft, obs.arrival),
    }
}

pub fn flight_line(obs: &FlightObservation) -> String {
    format!("{} from {} to {}", obs.aircraft, obs.departure, obs.arrival)
}

pub const FETCH_ERROR_REPLY: &str = "Error fetching flight data.";

/// Plain-text listing for the `flights` command.
pub fn flights_reply(flights: &[FlightObservation]) -> String {
    let mut out = String::from("Current flights:\n");
    if flights.is_empty() {
        out.push_str("No matching flights.\n");
    }
    for f in flights {
        out.push_str(&flight_line(f));
        out.push('\n');
    }
    out
}

pub struct StatusView<'a> {
    pub watch: Vec<&'a str>,
    pub tracked: usize,
    pub cycles: u64,
    pub last_checked: Option<DateTime<Utc>>,
    pub cache_age_secs: Option<u64>,
    pub poll_interval_secs: u64,
}

pub fn status_reply(s: &StatusView<'_>) -> String {
    let last = s
        .last_checked
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let cache = s
        .cache_age_secs
        .map(|a| format!("{a}s old"))
        .unwrap_or_else(|| "empty".to_string());

    [
        format!("Watching: {}", s.watch.join(", ")),
        format!("Polling every {}s", s.poll_interval_secs),
        format!("Successful checks: {}", s.cycles),
        format!("Last successful check: {last}"),
        format!("Tracked departures/arrivals: {}", s.tracked),
        format!("Snapshot cache: {cache}"),
    ]
    .join("\n")
}

/// Split `text` on line boundaries into chunks of at most `limit` bytes.
///
/// A single line longer than `limit` is cut at a char boundary.
pub fn chunk_lines(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut out = Vec::new();
    let mut chunk = String::new();

    for line in text.lines() {
        let mut line = line;
        while line.len() > limit {
            let cut = floor_char_boundary(line, limit);
            if !chunk.is_empty() {
                out.push(std::mem::take(&mut chunk));
            }
            out.push(line[..cut].to_string());
            line = &line[cut..];
        }

        let needed = if chunk.is_empty() { line.len() } else { chunk.len() + 1 + line.len() };
        if needed > limit {
            out.push(std::mem::take(&mut chunk));
        }
        if !chunk.is_empty() {
            chunk.push('\n');
        }
        chunk.push_str(line);
    }

    if !chunk.is_empty() {
        out.push(chunk);
    }
    out
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut idx = max.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        // First char is wider than `max`; take it whole.
        return s.chars().next().map(char::len_utf8).unwrap_or(s.len());
    }
    idx
}
