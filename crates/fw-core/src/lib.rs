//! Core domain + application logic for flightwatch.
//!
//! This crate is framework-agnostic. The flight tracker and the chat platform
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod detector;
pub mod domain;
pub mod errors;
pub mod fetcher;
pub mod filter;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod monitor;
pub mod notifier;
pub mod ports;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
